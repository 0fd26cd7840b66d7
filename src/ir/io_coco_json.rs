//! COCO JSON annotation store reader.
//!
//! This module parses a COCO `instances_*.json` file into an in-memory
//! index: the image list in store order, the category list, and the object
//! annotations grouped by image.
//!
//! # COCO Format Reference
//!
//! COCO bounding boxes use `[x, y, width, height]` format where:
//! - `(x, y)` is the top-left corner in absolute pixel coordinates
//! - `width` and `height` are the dimensions
//!
//! They are converted to XYXY on load, so downstream code never sees XYWH.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::model::{Category, ImageRecord, ObjectAnnotation};
use super::{BBoxXYXY, CocoCategoryId, ImageId};
use crate::error::RetinaError;

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

/// Top-level COCO dataset structure. Fields we do not use (info, licenses,
/// segmentation) are ignored by serde.
#[derive(Debug, Deserialize)]
struct CocoDataset {
    #[serde(default)]
    images: Vec<CocoImage>,

    #[serde(default)]
    annotations: Vec<CocoAnnotation>,

    #[serde(default)]
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    width: u32,
    height: u32,
    file_name: String,
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    image_id: u64,
    category_id: u64,

    /// COCO bbox format: [x, y, width, height] with (x,y) as top-left corner
    bbox: [f64; 4],

    #[serde(default)]
    iscrowd: Option<u8>,
}

// ============================================================================
// Public API
// ============================================================================

/// An indexed COCO annotation store.
#[derive(Clone, Debug, Default)]
pub struct CocoStore {
    /// Images in the order they appear in the file.
    pub images: Vec<ImageRecord>,

    /// Categories in the order they appear in the file (unsorted).
    pub categories: Vec<Category>,

    annotations_by_image: HashMap<ImageId, Vec<ObjectAnnotation>>,
}

impl CocoStore {
    /// All annotations of an image, including crowd regions, in store order.
    pub fn annotations_for(&self, image_id: ImageId) -> &[ObjectAnnotation] {
        self.annotations_by_image
            .get(&image_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Non-crowd annotations of an image, in store order.
    pub fn object_annotations_for(
        &self,
        image_id: ImageId,
    ) -> impl Iterator<Item = &ObjectAnnotation> + '_ {
        self.annotations_for(image_id)
            .iter()
            .filter(|annotation| !annotation.iscrowd)
    }

    /// Total number of annotations, crowd regions included.
    pub fn annotation_count(&self) -> usize {
        self.annotations_by_image.values().map(Vec::len).sum()
    }
}

/// Reads an annotation store from a COCO JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use retinakit::ir::io_coco_json::read_coco_json;
///
/// let store = read_coco_json(Path::new("annotations/instances_train2017.json"))?;
/// # Ok::<(), retinakit::RetinaError>(())
/// ```
pub fn read_coco_json(path: &Path) -> Result<CocoStore, RetinaError> {
    let file = File::open(path).map_err(RetinaError::Io)?;
    let reader = BufReader::new(file);

    let coco: CocoDataset =
        serde_json::from_reader(reader).map_err(|source| RetinaError::CocoJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(coco_to_store(coco))
}

/// Reads an annotation store from a COCO JSON string.
///
/// Useful for testing without file I/O.
pub fn from_coco_str(json: &str) -> Result<CocoStore, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_str(json)?;
    Ok(coco_to_store(coco))
}

/// Reads an annotation store from a COCO JSON byte slice.
///
/// Useful for fuzzing and processing raw bytes without UTF-8 validation overhead.
pub fn from_coco_slice(bytes: &[u8]) -> Result<CocoStore, serde_json::Error> {
    let coco: CocoDataset = serde_json::from_slice(bytes)?;
    Ok(coco_to_store(coco))
}

// ============================================================================
// Conversion: COCO -> store
// ============================================================================

fn coco_to_store(coco: CocoDataset) -> CocoStore {
    let images = coco
        .images
        .into_iter()
        .map(|img| ImageRecord::new(img.id, img.file_name, img.width, img.height))
        .collect();

    let categories = coco
        .categories
        .into_iter()
        .map(|cat| Category::new(cat.id, cat.name))
        .collect();

    let mut annotations_by_image: HashMap<ImageId, Vec<ObjectAnnotation>> = HashMap::new();
    for ann in coco.annotations {
        let [x, y, w, h] = ann.bbox;
        let annotation = ObjectAnnotation {
            image_id: ImageId::new(ann.image_id),
            category_id: CocoCategoryId::new(ann.category_id),
            bbox: BBoxXYXY::from_xywh(x, y, w, h),
            iscrowd: ann.iscrowd.unwrap_or(0) != 0,
        };
        annotations_by_image
            .entry(annotation.image_id)
            .or_default()
            .push(annotation);
    }

    CocoStore {
        images,
        categories,
        annotations_by_image,
    }
}

// ============================================================================
// Tests
// ============================================================================
