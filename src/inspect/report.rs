//! Inspect report types and terminal formatting.

use std::fmt;

use serde::Serialize;

/// The result of inspecting a split.
#[derive(Clone, Debug, Serialize)]
pub struct InspectReport {
    pub summary: SummarySection,
    /// One row per class, in label order.
    pub classes: Vec<ClassCount>,
    pub bboxes: BBoxStats,
    #[serde(skip)]
    pub(crate) bar_width: usize,
}

/// Summary counts for the split.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SummarySection {
    pub split: String,
    /// Images listed in the annotation file.
    pub images: usize,
    /// Images the generator exposes after filtering.
    pub trainable_images: usize,
    pub classes: usize,
    /// All annotations, crowd regions included.
    pub annotations: usize,
    pub crowd_annotations: usize,
}

/// A label table row with its non-crowd annotation count.
#[derive(Clone, Debug, Serialize)]
pub struct ClassCount {
    pub label: usize,
    pub coco_id: u64,
    pub name: String,
    pub count: usize,
}

/// Geometry of non-crowd boxes.
#[derive(Clone, Debug, Default, Serialize)]
pub struct BBoxStats {
    pub total: usize,
    /// Boxes with zero or negative width or height.
    pub degenerate: usize,
    pub min_width: Option<f64>,
    pub max_width: Option<f64>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
}

impl BBoxStats {
    pub(crate) fn record(&mut self, width: f64, height: f64) {
        self.total += 1;
        if width <= 0.0 || height <= 0.0 {
            self.degenerate += 1;
        }
        self.min_width = Some(self.min_width.map_or(width, |m| m.min(width)));
        self.max_width = Some(self.max_width.map_or(width, |m| m.max(width)));
        self.min_height = Some(self.min_height.map_or(height, |m| m.min(height)));
        self.max_height = Some(self.max_height.map_or(height, |m| m.max(height)));
    }
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "╭─────────────────────────────────────────────────────────────╮")?;
        writeln!(f, "│                   Split Inspection Report                   │")?;
        writeln!(f, "╰─────────────────────────────────────────────────────────────╯")?;
        writeln!(f)?;

        self.fmt_summary(f)?;
        writeln!(f)?;
        self.fmt_classes(f)?;
        writeln!(f)?;
        self.fmt_bboxes(f)
    }
}

impl InspectReport {
    fn fmt_summary(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;

        let header = format!("Summary ({})", s.split);
        writeln!(f, "┌─ {} {}┐", header, "─".repeat(57usize.saturating_sub(header.chars().count())))?;
        writeln!(f, "│   Images:        {:>10}                                │", format_number(s.images))?;
        writeln!(f, "│   Trainable:     {:>10}                                │", format_number(s.trainable_images))?;
        writeln!(f, "│   Classes:       {:>10}                                │", format_number(s.classes))?;
        writeln!(f, "│   Annotations:   {:>10}                                │", format_number(s.annotations))?;
        if s.crowd_annotations > 0 {
            writeln!(f, "│   Crowd regions: {:>10}                                │", format_number(s.crowd_annotations))?;
        }
        writeln!(f, "└───────────────────────────────────────────────────────────┘")
    }

    fn fmt_classes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "┌─ Classes ─────────────────────────────────────────────────┐")?;

        if self.classes.is_empty() {
            writeln!(f, "│   No categories found.                                    │")?;
        } else {
            let max_count = self.classes.iter().map(|c| c.count).max().unwrap_or(0);
            for class in &self.classes {
                writeln!(
                    f,
                    "│ {:>3} {:>5} {:<16} {:>7}  {}│",
                    class.label,
                    format!("#{}", class.coco_id),
                    truncate_label(&class.name, 16),
                    format_number(class.count),
                    pad_bar(&render_bar(class.count, max_count, self.bar_width), self.bar_width)
                )?;
            }
        }

        writeln!(f, "└───────────────────────────────────────────────────────────┘")
    }

    fn fmt_bboxes(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bboxes;

        writeln!(f, "┌─ Bounding Boxes ──────────────────────────────────────────┐")?;

        if let (Some(min_w), Some(max_w), Some(min_h), Some(max_h)) =
            (b.min_width, b.max_width, b.min_height, b.max_height)
        {
            writeln!(f, "│   Width  (px):    min {min_w:>8.1}    max {max_w:>8.1}            │")?;
            writeln!(f, "│   Height (px):    min {min_h:>8.1}    max {max_h:>8.1}            │")?;
            if b.degenerate > 0 {
                writeln!(
                    f,
                    "│   ⚠ Degenerate:  {:>7} / {:>7}                        │",
                    format_number(b.degenerate),
                    format_number(b.total)
                )?;
            }
        } else {
            writeln!(f, "│   No bounding boxes found.                                │")?;
        }

        writeln!(f, "└───────────────────────────────────────────────────────────┘")
    }
}

/// Format a number with thousands separators.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn render_bar(count: usize, max_count: usize, width: usize) -> String {
    if max_count == 0 || width == 0 {
        return " ".repeat(width);
    }

    let filled = ((count * width) / max_count).min(width);
    "█".repeat(filled) + &"░".repeat(width - filled)
}

fn pad_bar(bar: &str, width: usize) -> String {
    let padding = (width + 2).saturating_sub(bar.chars().count());
    format!("{}{}", bar, " ".repeat(padding))
}

/// Truncate a label to fit in the display column.
fn truncate_label(label: &str, max_len: usize) -> String {
    if label.chars().count() <= max_len {
        label.to_string()
    } else {
        let kept: String = label.chars().take(max_len - 1).collect();
        format!("{kept}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(1234), "1,234");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_render_bar() {
        assert_eq!(render_bar(5, 10, 10), "█████░░░░░");
        assert_eq!(render_bar(0, 0, 4), "    ");
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("short", 10), "short");
        assert_eq!(truncate_label("Small Civil Transport", 10), "Small Civ…");
    }

    #[test]
    fn test_record_tracks_extremes() {
        let mut stats = BBoxStats::default();
        stats.record(4.0, 2.0);
        stats.record(-1.0, 8.0);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.degenerate, 1);
        assert_eq!(stats.min_width, Some(-1.0));
        assert_eq!(stats.max_height, Some(8.0));
    }
}
