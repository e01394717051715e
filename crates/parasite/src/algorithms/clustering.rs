use std::collections::HashMap;

use image::{GrayImage, Luma, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::traits::{Partition, SubStructureSegmenter};

/// Three-way k-means color segmenter.
///
/// Runs `restarts` independent k-means++ initialisations over the crop's RGB
/// values and keeps the lowest-inertia solution. Clusters are then ranked by
/// the mean blue value of their members: the lowest is the nucleus candidate,
/// the middle one cytoplasm, the highest background.
#[derive(Debug, Clone)]
pub struct KMeansSegmenter {
    pub restarts: usize,
    pub max_iterations: usize,
    /// Relative center shift below which a run is considered converged
    pub tolerance: f64,
}

impl Default for KMeansSegmenter {
    fn default() -> Self {
        Self {
            restarts: 20,
            max_iterations: 300,
            tolerance: 1e-4,
        }
    }
}

const CLUSTERS: usize = 3;
/// Channel the clusters are ranked on.
const BLUE: usize = 2;

type Color = [f64; 3];

#[derive(Debug, Clone)]
struct Clustering {
    centers: [Color; CLUSTERS],
    inertia: f64,
}

fn squared_distance(a: &Color, b: &Color) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn nearest(point: &Color, centers: &[Color; CLUSTERS]) -> (usize, f64) {
    centers
        .iter()
        .enumerate()
        .map(|(i, c)| (i, squared_distance(point, c)))
        .fold((0, f64::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

/// Distinct colors with their pixel counts. Crops have far fewer distinct
/// colors than pixels, so clustering runs on the weighted palette.
fn palette(crop: &RgbImage) -> (Vec<Color>, Vec<f64>) {
    let mut counts: HashMap<[u8; 3], u32> = HashMap::new();
    for pixel in crop.pixels() {
        *counts.entry(pixel.0).or_insert(0) += 1;
    }
    let mut entries: Vec<_> = counts.into_iter().collect();
    entries.sort_unstable_by_key(|(color, _)| *color);
    entries
        .into_iter()
        .map(|(c, n)| ([f64::from(c[0]), f64::from(c[1]), f64::from(c[2])], f64::from(n)))
        .unzip()
}

impl KMeansSegmenter {
    fn seed_centers(&self, points: &[Color], weights: &[f64], rng: &mut StdRng) -> [Color; CLUSTERS] {
        let total: f64 = weights.iter().sum();
        let first = pick_weighted(weights, total, rng);
        let mut centers = [points[first]; CLUSTERS];
        let mut distances: Vec<f64> = points.iter().map(|p| squared_distance(p, &centers[0])).collect();

        for k in 1..CLUSTERS {
            let scores: Vec<f64> = distances.iter().zip(weights).map(|(d, w)| d * w).collect();
            let sum: f64 = scores.iter().sum();
            let chosen = if sum > 0.0 {
                pick_weighted(&scores, sum, rng)
            } else {
                rng.random_range(0..points.len())
            };
            centers[k] = points[chosen];
            for (d, p) in distances.iter_mut().zip(points) {
                *d = d.min(squared_distance(p, &centers[k]));
            }
        }
        centers
    }

    fn run(&self, points: &[Color], weights: &[f64], rng: &mut StdRng) -> Clustering {
        let mut centers = self.seed_centers(points, weights, rng);
        let scale = weighted_variance(points, weights).max(f64::EPSILON);

        for _ in 0..self.max_iterations {
            let mut sums = [[0.0; 3]; CLUSTERS];
            let mut mass = [0.0; CLUSTERS];
            for (p, &w) in points.iter().zip(weights) {
                let (k, _) = nearest(p, &centers);
                mass[k] += w;
                for c in 0..3 {
                    sums[k][c] += p[c] * w;
                }
            }

            let mut shift = 0.0;
            for k in 0..CLUSTERS {
                // an emptied cluster keeps its previous center
                if mass[k] > 0.0 {
                    let updated = sums[k].map(|s| s / mass[k]);
                    shift += squared_distance(&updated, &centers[k]);
                    centers[k] = updated;
                }
            }
            if shift <= self.tolerance * scale {
                break;
            }
        }

        let inertia = points
            .iter()
            .zip(weights)
            .map(|(p, w)| nearest(p, &centers).1 * w)
            .sum();
        Clustering { centers, inertia }
    }

    /// Cluster index of every pixel, row-major.
    pub fn assign(&self, crop: &RgbImage, seed: u64) -> Vec<usize> {
        let (points, weights) = palette(crop);
        if points.is_empty() {
            return Vec::new();
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut best: Option<Clustering> = None;
        for _ in 0..self.restarts.max(1) {
            let candidate = self.run(&points, &weights, &mut rng);
            if best.as_ref().is_none_or(|b| candidate.inertia < b.inertia) {
                best = Some(candidate);
            }
        }
        let Some(best) = best else {
            return Vec::new();
        };

        crop.pixels()
            .map(|p| {
                let color = [f64::from(p[0]), f64::from(p[1]), f64::from(p[2])];
                nearest(&color, &best.centers).0
            })
            .collect()
    }
}

fn pick_weighted(weights: &[f64], total: f64, rng: &mut StdRng) -> usize {
    let mut target = rng.random::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        if target < *w {
            return i;
        }
        target -= w;
    }
    weights.len() - 1
}

fn weighted_variance(points: &[Color], weights: &[f64]) -> f64 {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mut mean = [0.0; 3];
    for (p, w) in points.iter().zip(weights) {
        for c in 0..3 {
            mean[c] += p[c] * w / total;
        }
    }
    points
        .iter()
        .zip(weights)
        .map(|(p, w)| squared_distance(p, &mean) * w)
        .sum::<f64>()
        / total
        / 3.0
}

impl SubStructureSegmenter for KMeansSegmenter {
    fn segment(&self, crop: &RgbImage, seed: u64) -> Partition {
        let (width, height) = crop.dimensions();
        let labels = self.assign(crop, seed);

        // empty clusters rank as 0
        let mut blue_sum = [0.0; CLUSTERS];
        let mut count = [0u64; CLUSTERS];
        for (pixel, &k) in crop.pixels().zip(&labels) {
            blue_sum[k] += f64::from(pixel[BLUE]);
            count[k] += 1;
        }
        let mean_blue: Vec<f64> = (0..CLUSTERS)
            .map(|k| if count[k] == 0 { 0.0 } else { blue_sum[k] / count[k] as f64 })
            .collect();

        let mut order: Vec<usize> = (0..CLUSTERS).collect();
        order.sort_by(|&a, &b| mean_blue[a].total_cmp(&mean_blue[b]));

        let mask_for = |cluster: usize| {
            let mut mask = GrayImage::new(width, height);
            for (pixel, &k) in mask.pixels_mut().zip(&labels) {
                if k == cluster {
                    *pixel = Luma([255]);
                }
            }
            mask
        };

        Partition {
            nucleus: mask_for(order[0]),
            cytoplasm: mask_for(order[1]),
            background: mask_for(order[2]),
        }
    }
}
