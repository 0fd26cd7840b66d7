//! Bijective mapping between external category ids and dense labels.

use std::collections::HashMap;

use serde::Serialize;

use super::ids::{CocoCategoryId, Label};
use super::model::Category;
use crate::error::RetinaError;

/// An immutable label table built once from the store's category list.
///
/// Categories are sorted by external id ascending and assigned labels
/// `0..N-1` in that order. The ordering is part of the checkpoint format:
/// a model trained against one table only decodes correctly with the same
/// table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelTable {
    /// `coco_labels[label] = external id`.
    coco_labels: Vec<CocoCategoryId>,
    coco_labels_inverse: HashMap<CocoCategoryId, Label>,
    /// `names[label] = class name`.
    names: Vec<String>,
    classes: HashMap<String, Label>,
}

/// One row of a label table, for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LabelEntry {
    pub label: Label,
    pub coco_id: CocoCategoryId,
    pub name: String,
}

impl LabelTable {
    /// Builds the table from an unsorted category list.
    ///
    /// # Errors
    /// Fails when two categories share an external id or a name.
    pub fn from_categories(categories: &[Category]) -> Result<Self, RetinaError> {
        let mut sorted: Vec<&Category> = categories.iter().collect();
        sorted.sort_by_key(|category| category.id);

        let mut table = Self::default();
        for category in sorted {
            let label = Label::new(table.coco_labels.len());

            if table.coco_labels_inverse.contains_key(&category.id) {
                return Err(RetinaError::DuplicateCategoryId(category.id.as_u64()));
            }
            if let Some(existing) = table.classes.get(&category.name) {
                return Err(RetinaError::DuplicateClassName {
                    name: category.name.clone(),
                    first: table.coco_labels[existing.index()].as_u64(),
                    second: category.id.as_u64(),
                });
            }

            table.coco_labels.push(category.id);
            table.coco_labels_inverse.insert(category.id, label);
            table.names.push(category.name.clone());
            table.classes.insert(category.name.clone(), label);
        }

        Ok(table)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.coco_labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coco_labels.is_empty()
    }

    pub fn name_to_label(&self, name: &str) -> Result<Label, RetinaError> {
        self.classes
            .get(name)
            .copied()
            .ok_or_else(|| RetinaError::UnknownClassName(name.to_string()))
    }

    pub fn label_to_name(&self, label: Label) -> Result<&str, RetinaError> {
        self.names
            .get(label.index())
            .map(String::as_str)
            .ok_or(RetinaError::UnknownLabel(label.index()))
    }

    pub fn coco_label_to_label(&self, coco_label: CocoCategoryId) -> Result<Label, RetinaError> {
        self.coco_labels_inverse
            .get(&coco_label)
            .copied()
            .ok_or(RetinaError::UnknownCocoLabel(coco_label.as_u64()))
    }

    pub fn label_to_coco_label(&self, label: Label) -> Result<CocoCategoryId, RetinaError> {
        self.coco_labels
            .get(label.index())
            .copied()
            .ok_or(RetinaError::UnknownLabel(label.index()))
    }

    pub fn coco_label_to_name(&self, coco_label: CocoCategoryId) -> Result<&str, RetinaError> {
        self.label_to_name(self.coco_label_to_label(coco_label)?)
    }

    /// Iterates rows in label order.
    pub fn entries(&self) -> impl Iterator<Item = LabelEntry> + '_ {
        self.coco_labels
            .iter()
            .zip(&self.names)
            .enumerate()
            .map(|(idx, (coco_id, name))| LabelEntry {
                label: Label::new(idx),
                coco_id: *coco_id,
                name: name.clone(),
            })
    }
}
