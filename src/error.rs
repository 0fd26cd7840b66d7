use std::path::PathBuf;
use thiserror::Error;

/// The main error type for retinakit operations.
#[derive(Debug, Error)]
pub enum RetinaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse COCO JSON from {path}: {source}")]
    CocoJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("image with index {index} (coco_id: {image_id}) has no annotations")]
    NoAnnotations { index: usize, image_id: u64 },

    #[error("image index {index} out of range (generator holds {size} images)")]
    ImageIndexOutOfRange { index: usize, size: usize },

    #[error("unknown class name '{0}'")]
    UnknownClassName(String),

    #[error("unknown label {0}")]
    UnknownLabel(usize),

    #[error("unknown COCO category id {0}")]
    UnknownCocoLabel(u64),

    #[error("duplicate COCO category id {0}")]
    DuplicateCategoryId(u64),

    #[error("duplicate class name '{name}' (COCO category ids {first} and {second})")]
    DuplicateClassName { name: String, first: u64, second: u64 },

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid image shape {shape:?}: {message}")]
    InvalidImageShape { shape: Vec<usize>, message: String },

    #[error("Batch shape mismatch: {images} image(s) but box batch of shape {boxes:?}")]
    BatchShapeMismatch { images: usize, boxes: Vec<usize> },

    #[error("Invalid transform parameters: {0}")]
    InvalidTransformParams(String),

    #[error("Loss input shape mismatch: y_true {y_true:?} vs y_pred {y_pred:?}")]
    LossShapeMismatch {
        y_true: Vec<usize>,
        y_pred: Vec<usize>,
    },

    #[error("Failed to parse RarePlanes XML {path}: {message}")]
    RarePlanesXmlParse { path: PathBuf, message: String },

    #[error("Failed to write CSV to {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to parse transform config {path}: {source}")]
    TransformConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to serialize report: {0}")]
    ReportSerialize(#[source] serde_json::Error),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
