//! Training-data generators.
//!
//! A generator exposes an indexed view over one dataset split: how many
//! images it holds, how many classes it knows, and how to load the pixels
//! and box annotations of each image. The trainer drives batching on top of
//! this interface.

mod coco;

pub use coco::{annotations_path, CocoGenerator, CocoGeneratorOptions};

use image::RgbImage;
use ndarray::Array2;

use crate::error::RetinaError;

/// Number of columns of an annotation array: `x1, y1, x2, y2, label`.
pub const ANNOTATION_COLUMNS: usize = 5;

/// The capability set every dataset generator provides.
pub trait Generator {
    /// Number of images in the split.
    fn size(&self) -> usize;

    /// Number of object classes.
    fn num_classes(&self) -> usize;

    /// Decodes the image at `image_index`.
    fn load_image(&self, image_index: usize) -> Result<RgbImage, RetinaError>;

    /// Returns an `N×5` array of `[x1, y1, x2, y2, label]` rows in absolute
    /// pixels.
    ///
    /// # Errors
    /// Fails with [`RetinaError::NoAnnotations`] when the image has no
    /// usable annotation: every index handed to the trainer must be
    /// trainable.
    fn load_annotations(&self, image_index: usize) -> Result<Array2<f64>, RetinaError>;

    /// Width over height of the image at `image_index`.
    fn image_aspect_ratio(&self, image_index: usize) -> Result<f64, RetinaError>;
}
