//! Generator over a COCO-layout dataset directory.
//!
//! Expected layout:
//!
//! ```text
//! {data_dir}/annotations/instances_{split}.json
//! {data_dir}/images/{split}/{file_name}
//! ```

use std::path::{Path, PathBuf};

use image::RgbImage;
use log::{debug, info};
use ndarray::Array2;

use super::{Generator, ANNOTATION_COLUMNS};
use crate::error::RetinaError;
use crate::ir::io_coco_json::{read_coco_json, CocoStore};
use crate::ir::{CocoCategoryId, ImageId, ImageRecord, Label, LabelTable};

/// Options for building a [`CocoGenerator`].
#[derive(Clone, Debug)]
pub struct CocoGeneratorOptions {
    /// Drop images without any non-crowd annotation at load time.
    pub filter_empty_images: bool,
}

impl Default for CocoGeneratorOptions {
    fn default() -> Self {
        Self {
            filter_empty_images: true,
        }
    }
}

/// A [`Generator`] backed by a COCO annotation store.
#[derive(Clone, Debug)]
pub struct CocoGenerator {
    data_dir: PathBuf,
    set_name: String,
    store: CocoStore,
    /// Positions into `store.images`, one per generator index.
    image_indices: Vec<usize>,
    labels: LabelTable,
}

impl CocoGenerator {
    /// Opens `{data_dir}/annotations/instances_{set_name}.json`.
    pub fn new(
        data_dir: impl Into<PathBuf>,
        set_name: impl Into<String>,
        opts: &CocoGeneratorOptions,
    ) -> Result<Self, RetinaError> {
        let data_dir = data_dir.into();
        let set_name = set_name.into();
        let annotations_path = annotations_path(&data_dir, &set_name);

        debug!("loading COCO annotations from {}", annotations_path.display());
        let store = read_coco_json(&annotations_path)?;
        Self::from_store(data_dir, set_name, store, opts)
    }

    /// Builds a generator from an already parsed store.
    pub fn from_store(
        data_dir: impl Into<PathBuf>,
        set_name: impl Into<String>,
        store: CocoStore,
        opts: &CocoGeneratorOptions,
    ) -> Result<Self, RetinaError> {
        let labels = LabelTable::from_categories(&store.categories)?;

        let image_indices: Vec<usize> = store
            .images
            .iter()
            .enumerate()
            .filter(|(_, image)| {
                !opts.filter_empty_images || store.object_annotations_for(image.id).next().is_some()
            })
            .map(|(position, _)| position)
            .collect();

        let set_name = set_name.into();
        info!(
            "split '{}': {} images ({} filtered as empty), {} classes",
            set_name,
            image_indices.len(),
            store.images.len() - image_indices.len(),
            labels.len()
        );

        Ok(Self {
            data_dir: data_dir.into(),
            set_name,
            store,
            image_indices,
            labels,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    /// The label table built from this split's categories.
    pub fn label_table(&self) -> &LabelTable {
        &self.labels
    }

    pub fn store(&self) -> &CocoStore {
        &self.store
    }

    /// The store record for `image_index`.
    pub fn image_record(&self, image_index: usize) -> Result<&ImageRecord, RetinaError> {
        self.image_indices
            .get(image_index)
            .map(|&position| &self.store.images[position])
            .ok_or(RetinaError::ImageIndexOutOfRange {
                index: image_index,
                size: self.image_indices.len(),
            })
    }

    /// External image id for `image_index`.
    pub fn image_id(&self, image_index: usize) -> Result<ImageId, RetinaError> {
        Ok(self.image_record(image_index)?.id)
    }

    /// `{data_dir}/images/{split}/{file_name}` for `image_index`.
    pub fn image_path(&self, image_index: usize) -> Result<PathBuf, RetinaError> {
        let record = self.image_record(image_index)?;
        Ok(self
            .data_dir
            .join("images")
            .join(&self.set_name)
            .join(&record.file_name))
    }

    pub fn name_to_label(&self, name: &str) -> Result<Label, RetinaError> {
        self.labels.name_to_label(name)
    }

    pub fn label_to_name(&self, label: Label) -> Result<&str, RetinaError> {
        self.labels.label_to_name(label)
    }

    pub fn coco_label_to_label(&self, coco_label: CocoCategoryId) -> Result<Label, RetinaError> {
        self.labels.coco_label_to_label(coco_label)
    }

    pub fn coco_label_to_name(&self, coco_label: CocoCategoryId) -> Result<&str, RetinaError> {
        self.labels.coco_label_to_name(coco_label)
    }

    pub fn label_to_coco_label(&self, label: Label) -> Result<CocoCategoryId, RetinaError> {
        self.labels.label_to_coco_label(label)
    }
}

impl Generator for CocoGenerator {
    fn size(&self) -> usize {
        self.image_indices.len()
    }

    fn num_classes(&self) -> usize {
        self.labels.len()
    }

    fn load_image(&self, image_index: usize) -> Result<RgbImage, RetinaError> {
        let path = self.image_path(image_index)?;
        let image = image::open(&path).map_err(|source| RetinaError::ImageDecode {
            path: path.clone(),
            source,
        })?;
        Ok(image.to_rgb8())
    }

    fn load_annotations(&self, image_index: usize) -> Result<Array2<f64>, RetinaError> {
        let image_id = self.image_id(image_index)?;
        let objects: Vec<_> = self.store.object_annotations_for(image_id).collect();

        // some images appear to miss annotations (like image with id 257034)
        if objects.is_empty() {
            return Err(RetinaError::NoAnnotations {
                index: image_index,
                image_id: image_id.as_u64(),
            });
        }

        let mut annotations = Array2::zeros((objects.len(), ANNOTATION_COLUMNS));
        for (mut row, object) in annotations.rows_mut().into_iter().zip(&objects) {
            let label = self.labels.coco_label_to_label(object.category_id)?;
            let [x1, y1, x2, y2] = object.bbox.to_array();
            row[0] = x1;
            row[1] = y1;
            row[2] = x2;
            row[3] = y2;
            row[4] = label.index() as f64;
        }

        Ok(annotations)
    }

    fn image_aspect_ratio(&self, image_index: usize) -> Result<f64, RetinaError> {
        Ok(self.image_record(image_index)?.aspect_ratio())
    }
}

/// Path of the annotation file for a split.
pub fn annotations_path(data_dir: &Path, set_name: &str) -> PathBuf {
    data_dir
        .join("annotations")
        .join(format!("instances_{set_name}.json"))
}
