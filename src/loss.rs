//! Focal and smooth-L1 losses for anchor-based detection heads.
//!
//! Targets multiplex the anchor state into the target tensor:
//!
//! - classification targets hold one-hot labels, and the anchor state is
//!   the maximum over the class axis (`-1` ignore, `0` background, `1`
//!   object);
//! - regression targets carry the state in their last column.
//!
//! Ignored anchors are removed from the sum entirely. Each image's
//! contribution is divided by its number of positive anchors (at least 1),
//! and the per-image terms are averaged over the batch.

use ndarray::{ArrayBase, Axis, Data, Ix3};

use crate::error::RetinaError;

/// Clipping applied to probabilities before taking logarithms.
const BCE_EPSILON: f32 = 1e-7;

const STATE_IGNORE: f32 = -1.0;
const STATE_POSITIVE: f32 = 1.0;

/// Focal classification loss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FocalLoss {
    pub alpha: f32,
    pub gamma: f32,
}

impl Default for FocalLoss {
    fn default() -> Self {
        Self {
            alpha: 0.25,
            gamma: 2.0,
        }
    }
}

/// Builds a focal loss with the given weighting.
pub fn focal(alpha: f32, gamma: f32) -> FocalLoss {
    FocalLoss { alpha, gamma }
}

impl FocalLoss {
    /// Evaluates the loss.
    ///
    /// `y_true` and `y_pred` both have shape `(batch, anchors, classes)`;
    /// `y_pred` holds probabilities.
    pub fn compute<S1, S2>(
        &self,
        y_true: &ArrayBase<S1, Ix3>,
        y_pred: &ArrayBase<S2, Ix3>,
    ) -> Result<f32, RetinaError>
    where
        S1: Data<Elem = f32>,
        S2: Data<Elem = f32>,
    {
        if y_true.shape() != y_pred.shape() {
            return Err(shape_mismatch(y_true.shape(), y_pred.shape()));
        }

        let batch_size = y_true.len_of(Axis(0));
        if batch_size == 0 {
            return Ok(0.0);
        }

        let mut total = 0.0f64;
        for (labels, classification) in y_true.outer_iter().zip(y_pred.outer_iter()) {
            // -1 and 0 count the same here: only positives feed the divisor
            let positives: f32 = labels
                .outer_iter()
                .map(|anchor| anchor.iter().fold(0.0f32, |acc, &l| acc.max(l)))
                .sum();
            let divisor = f64::from(positives.max(1.0));

            let mut image_loss = 0.0f64;
            for (anchor_labels, anchor_pred) in labels.outer_iter().zip(classification.outer_iter()) {
                let state = anchor_labels
                    .iter()
                    .fold(f32::NEG_INFINITY, |acc, &l| acc.max(l));
                if state == STATE_IGNORE {
                    continue;
                }

                for (&label, &p) in anchor_labels.iter().zip(anchor_pred.iter()) {
                    image_loss += f64::from(self.element(label, p));
                }
            }

            total += image_loss / divisor;
        }

        Ok((total / batch_size as f64) as f32)
    }

    /// Loss of one (anchor, class) element.
    fn element(&self, label: f32, p: f32) -> f32 {
        let positive = label == STATE_POSITIVE;
        let alpha_factor = if positive { self.alpha } else { 1.0 - self.alpha };
        let focal_weight = if positive { 1.0 - p } else { p };
        alpha_factor * focal_weight.powf(self.gamma) * binary_crossentropy(label, p)
    }
}

fn binary_crossentropy(label: f32, p: f32) -> f32 {
    let p = p.clamp(BCE_EPSILON, 1.0 - BCE_EPSILON);
    -(label * p.ln() + (1.0 - label) * (1.0 - p).ln())
}

/// Smooth-L1 (Huber-style) regression loss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SmoothL1Loss {
    pub sigma: f32,
}

impl Default for SmoothL1Loss {
    fn default() -> Self {
        Self { sigma: 3.0 }
    }
}

/// Builds a smooth-L1 loss with transition point `1 / sigma²`.
pub fn smooth_l1(sigma: f32) -> SmoothL1Loss {
    SmoothL1Loss { sigma }
}

impl SmoothL1Loss {
    /// Loss of one absolute coordinate difference.
    ///
    /// Quadratic below `1 / sigma²`, linear above; value and slope are
    /// continuous at the switch point.
    pub fn value(&self, diff: f32) -> f32 {
        let sigma_squared = self.sigma * self.sigma;
        if diff < 1.0 / sigma_squared {
            0.5 * sigma_squared * diff * diff
        } else {
            diff - 0.5 / sigma_squared
        }
    }

    /// Evaluates the loss.
    ///
    /// `y_true` has shape `(batch, anchors, k + 1)` with the anchor state in
    /// the last column; `y_pred` has shape `(batch, anchors, k)`. Only
    /// anchors with state `1` contribute.
    pub fn compute<S1, S2>(
        &self,
        y_true: &ArrayBase<S1, Ix3>,
        y_pred: &ArrayBase<S2, Ix3>,
    ) -> Result<f32, RetinaError>
    where
        S1: Data<Elem = f32>,
        S2: Data<Elem = f32>,
    {
        let (t, p) = (y_true.shape(), y_pred.shape());
        if t[0] != p[0] || t[1] != p[1] || t[2] != p[2] + 1 {
            return Err(shape_mismatch(t, p));
        }

        let batch_size = t[0];
        if batch_size == 0 {
            return Ok(0.0);
        }
        let coords = p[2];

        let mut total = 0.0f64;
        for (targets, regression) in y_true.outer_iter().zip(y_pred.outer_iter()) {
            let mut positives = 0usize;
            let mut image_loss = 0.0f64;

            for (target, pred) in targets.outer_iter().zip(regression.outer_iter()) {
                if target[coords] != STATE_POSITIVE {
                    continue;
                }
                positives += 1;

                for (&goal, &guess) in target.iter().take(coords).zip(pred.iter()) {
                    image_loss += f64::from(self.value((guess - goal).abs()));
                }
            }

            total += image_loss / positives.max(1) as f64;
        }

        Ok((total / batch_size as f64) as f32)
    }
}

fn shape_mismatch(y_true: &[usize], y_pred: &[usize]) -> RetinaError {
    RetinaError::LossShapeMismatch {
        y_true: y_true.to_vec(),
        y_pred: y_pred.to_vec(),
    }
}
