//! Records loaded from the external annotation store.
//!
//! These are read-only after load: the generator owns them and hands out
//! shared references.

use serde::{Deserialize, Serialize};

use super::bbox::BBoxXYXY;
use super::ids::{CocoCategoryId, ImageId};

/// An image entry of the annotation store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Identifier in the external store.
    pub id: ImageId,

    /// File name relative to the split's image directory.
    pub file_name: String,

    /// Width of the image in pixels.
    pub width: u32,

    /// Height of the image in pixels.
    pub height: u32,
}

impl ImageRecord {
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }

    /// Width over height. Zero height yields an infinite ratio.
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

/// A category entry of the annotation store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CocoCategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: impl Into<CocoCategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One object annotation of an image, still in the external ID space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectAnnotation {
    pub image_id: ImageId,
    pub category_id: CocoCategoryId,
    pub bbox: BBoxXYXY,
    /// Crowd regions are kept in the store but never used as training targets.
    pub iscrowd: bool,
}
