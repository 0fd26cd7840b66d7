//! RarePlanes XML → CSV label conversion.
//!
//! Expected layout per split:
//!
//! ```text
//! {root}/{split}/labels/*.xml
//! {root}/{split}/images/{filename}
//! {root}/{split}/csv_label/{split}_label.csv   (written)
//! ```
//!
//! The CSV of a split is cleared before conversion and then appended to,
//! one file at a time, in natural filename order (`img2.xml` before
//! `img10.xml`).

mod rareplanes;

#[cfg(feature = "fuzzing")]
pub use rareplanes::from_rareplanes_xml_slice;
pub use rareplanes::{
    make_label_file, parse_rareplanes_xml_str, read_rareplanes_xml, RarePlanesLabel,
    RarePlanesObject,
};

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::Serialize;
use walkdir::WalkDir;

use crate::error::RetinaError;

/// Splits converted when none are named.
pub const DEFAULT_SPLITS: [&str; 3] = ["train", "val", "test"];

/// What was written for one split.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    pub split: String,
    pub csv_path: PathBuf,
    pub xml_files: usize,
    pub rows: usize,
}

impl fmt::Display for SplitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} rows from {} XML files -> {}",
            self.split,
            self.rows,
            self.xml_files,
            self.csv_path.display()
        )
    }
}

/// Output CSV path for the split stored at `split_dir`.
pub fn split_csv_path(split_dir: &Path) -> PathBuf {
    let split = split_name(split_dir);
    split_dir
        .join("csv_label")
        .join(format!("{split}_label.csv"))
}

/// Converts `{split_dir}/labels/*.xml` into the split's CSV.
pub fn convert_split(split_dir: &Path) -> Result<SplitReport, RetinaError> {
    let split = split_name(split_dir);
    let csv_path = split_csv_path(split_dir);
    if let Some(parent) = csv_path.parent() {
        fs::create_dir_all(parent).map_err(RetinaError::Io)?;
    }

    match fs::remove_file(&csv_path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(RetinaError::Io(e)),
    }

    let xml_files = collect_xml_files(&split_dir.join("labels"))?;
    let images_prefix = format!("{}/", split_dir.join("images").display());

    let rows = make_label_file(&images_prefix, &xml_files, &csv_path)?;
    let report = SplitReport {
        split,
        csv_path,
        xml_files: xml_files.len(),
        rows,
    };
    info!("{report}");
    Ok(report)
}

/// Converts each named split under `root`. Missing split directories are
/// skipped with a warning.
pub fn convert_dataset<S: AsRef<str>>(
    root: &Path,
    splits: &[S],
) -> Result<Vec<SplitReport>, RetinaError> {
    let mut reports = Vec::with_capacity(splits.len());
    for split in splits {
        let split_dir = root.join(split.as_ref());
        if !split_dir.is_dir() {
            warn!("split directory {} does not exist, skipping", split_dir.display());
            continue;
        }
        reports.push(convert_split(&split_dir)?);
    }
    Ok(reports)
}

/// `*.xml` files directly inside `labels_dir`, in natural filename order.
pub fn collect_xml_files(labels_dir: &Path) -> Result<Vec<PathBuf>, RetinaError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(labels_dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| RetinaError::Io(e.into()))?;
        if entry.file_type().is_file() && has_xml_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    alphanumeric_sort::sort_path_slice(&mut files);
    Ok(files)
}

fn has_xml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

fn split_name(split_dir: &Path) -> String {
    split_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
