use image::GrayImage;

use super::contours::{external_contours, largest_contour, Contour};
use crate::error::SkipReason;

/// Nucleus and kinetoplast masks found inside the cytoplasm.
#[derive(Debug, Clone)]
pub struct Organelles {
    pub nucleus: GrayImage,
    pub kinetoplast: GrayImage,
}

/// Pick the nucleus and kinetoplast out of the dark cluster.
///
/// Only dark contours whose centroid lies strictly inside the largest
/// cytoplasm contour count. The biggest of those is the nucleus and the second
/// biggest the kinetoplast; a candidate without both cannot be classified.
pub fn locate_organelles(
    nucleus_candidates: &GrayImage,
    cytoplasm: &GrayImage,
) -> Result<Organelles, SkipReason> {
    let cytoplasm_contours = external_contours(cytoplasm);
    let outline = largest_contour(&cytoplasm_contours).ok_or(SkipReason::NoCytoplasm)?;

    let mut inside: Vec<(f64, Contour)> = external_contours(nucleus_candidates)
        .into_iter()
        .filter(|c| c.centroid().is_some_and(|p| outline.strictly_contains(p)))
        .map(|c| (c.area(), c))
        .collect();
    inside.sort_by(|a, b| b.0.total_cmp(&a.0));

    let mut ranked = inside.into_iter().map(|(_, c)| c);
    let nucleus = ranked.next().ok_or(SkipReason::NoNucleus)?;
    let kinetoplast = ranked.next().ok_or(SkipReason::MissingKinetoplast)?;

    let (width, height) = nucleus_candidates.dimensions();
    let paint = |contour: &Contour| {
        let mut mask = GrayImage::new(width, height);
        contour.fill(&mut mask, 255);
        mask
    };

    Ok(Organelles {
        nucleus: paint(&nucleus),
        kinetoplast: paint(&kinetoplast),
    })
}
