//! Split inspection.
//!
//! Summarizes what a [`CocoGenerator`] will hand to a trainer: how many
//! images survive empty-image filtering, the label table, per-class
//! annotation counts and basic box geometry.

mod report;

pub use report::{BBoxStats, ClassCount, InspectReport, SummarySection};

use std::collections::HashMap;

use crate::generator::{CocoGenerator, Generator};
use crate::ir::CocoCategoryId;

/// Options for split inspection.
#[derive(Clone, Debug)]
pub struct InspectOptions {
    /// Width of histogram bars (in characters).
    pub bar_width: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self { bar_width: 20 }
    }
}

/// Inspect a split and produce a report.
///
/// Counts cover every image of the store; crowd regions are reported
/// separately and excluded from class counts and box statistics.
pub fn inspect_split(generator: &CocoGenerator, opts: &InspectOptions) -> InspectReport {
    let store = generator.store();

    let mut per_category: HashMap<CocoCategoryId, usize> = HashMap::new();
    let mut crowd = 0;
    let mut bboxes = BBoxStats::default();

    for image in &store.images {
        for annotation in store.annotations_for(image.id) {
            if annotation.iscrowd {
                crowd += 1;
                continue;
            }
            *per_category.entry(annotation.category_id).or_insert(0) += 1;
            bboxes.record(annotation.bbox.width(), annotation.bbox.height());
        }
    }

    let classes = generator
        .label_table()
        .entries()
        .map(|entry| ClassCount {
            count: per_category.get(&entry.coco_id).copied().unwrap_or(0),
            label: entry.label.index(),
            coco_id: entry.coco_id.as_u64(),
            name: entry.name,
        })
        .collect();

    let summary = SummarySection {
        split: generator.set_name().to_string(),
        images: store.images.len(),
        trainable_images: generator.size(),
        classes: generator.num_classes(),
        annotations: store.annotation_count(),
        crowd_annotations: crowd,
    };

    InspectReport {
        summary,
        classes,
        bboxes,
        bar_width: opts.bar_width,
    }
}
