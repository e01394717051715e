pub mod clustering;
pub mod contours;
pub mod localization;
pub mod padding;
pub mod regions;
pub mod substructure;
pub mod threshold;

pub use clustering::KMeansSegmenter;
pub use contours::{external_contours, largest_contour, Contour, PolygonMoments};
pub use localization::{locate_candidates, Located, CROP_HALF_EXTENT};
pub use padding::pad_image;
pub use regions::{filter_regions, RegionWindow};
pub use substructure::{locate_organelles, Organelles};
pub use threshold::{binarize_inverted, channel, MeanSplitThreshold};
