//! Synchronized image and box augmentation.
//!
//! Boxes are not transformed analytically. Each box is rasterized as a
//! filled mask, the mask goes through the same transform as the image, and
//! the box is recovered as the bounding rectangle of the mask's external
//! contour.

use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::contours::find_contours;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::geometric_transformations::{warp, warp_with, Interpolation, Projection};
use imageproc::rect::Rect;
use log::debug;
use ndarray::{Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use crate::error::RetinaError;

/// How pixels sampled from outside the source image are filled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillMode {
    /// Fill with a constant intensity on every channel.
    Constant(u8),
    /// Repeat the nearest edge pixel.
    #[default]
    Nearest,
}

/// Ranges for [`RandomTransformGenerator`].
///
/// Angles are in degrees, shifts are fractions of the image size and zoom
/// factors scale the output (values above 1 enlarge). Every field defaults to
/// "no transform", so a YAML file only names what it enables.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransformParams {
    pub rotation_range: f64,
    pub width_shift_range: f64,
    pub height_shift_range: f64,
    pub shear_range: f64,
    pub zoom_range: (f64, f64),
    pub horizontal_flip: bool,
    pub vertical_flip: bool,
    pub fill_mode: FillMode,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            rotation_range: 0.0,
            width_shift_range: 0.0,
            height_shift_range: 0.0,
            shear_range: 0.0,
            zoom_range: (1.0, 1.0),
            horizontal_flip: false,
            vertical_flip: false,
            fill_mode: FillMode::default(),
        }
    }
}

impl TransformParams {
    /// Rejects ranges that would make sampling panic or produce a singular
    /// transform.
    pub fn validate(&self) -> Result<(), RetinaError> {
        let ranges = [
            ("rotation_range", self.rotation_range),
            ("width_shift_range", self.width_shift_range),
            ("height_shift_range", self.height_shift_range),
            ("shear_range", self.shear_range),
        ];
        for (name, value) in ranges {
            if !(value.is_finite() && value >= 0.0) {
                return Err(RetinaError::InvalidTransformParams(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        if self.shear_range >= 90.0 {
            return Err(RetinaError::InvalidTransformParams(format!(
                "shear_range must be below 90 degrees, got {}",
                self.shear_range
            )));
        }

        let (low, high) = self.zoom_range;
        if !(low.is_finite() && high.is_finite() && 0.0 < low && low <= high) {
            return Err(RetinaError::InvalidTransformParams(format!(
                "zoom_range must satisfy 0 < low <= high, got ({low}, {high})"
            )));
        }

        Ok(())
    }
}

/// Loads and validates [`TransformParams`] from a YAML file.
pub fn load_transform_params(path: &Path) -> Result<TransformParams, RetinaError> {
    let text = fs::read_to_string(path).map_err(RetinaError::Io)?;
    let params: TransformParams =
        serde_yaml::from_str(&text).map_err(|source| RetinaError::TransformConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
    params.validate()?;
    Ok(params)
}

/// Shear along x by `angle` radians. `None` when the shear is degenerate.
pub fn shear(angle: f32) -> Option<Projection> {
    let (sin, cos) = angle.sin_cos();
    Projection::from_matrix([1.0, -sin, 0.0, 0.0, cos, 0.0, 0.0, 0.0, 1.0])
}

/// Horizontal mirror of an image `width` pixels wide.
pub fn flip_horizontal(width: u32) -> Projection {
    Projection::scale(-1.0, 1.0).and_then(Projection::translate(width as f32 - 1.0, 0.0))
}

/// Vertical mirror of an image `height` pixels tall.
pub fn flip_vertical(height: u32) -> Projection {
    Projection::scale(1.0, -1.0).and_then(Projection::translate(0.0, height as f32 - 1.0))
}

/// Warps an RGB image onto a canvas of the same size.
///
/// A `None` projection gives a blank canvas in the fill colour.
pub fn warp_rgb(
    image: &RgbImage,
    projection: Option<&Projection>,
    fill: FillMode,
    interpolation: Interpolation,
) -> RgbImage {
    let (width, height) = image.dimensions();
    match (projection, fill) {
        (None, FillMode::Constant(value)) => RgbImage::from_pixel(width, height, Rgb([value; 3])),
        (None, FillMode::Nearest) => RgbImage::new(width, height),
        (Some(projection), FillMode::Constant(value)) => {
            warp(image, projection, interpolation, Rgb([value; 3]))
        }
        (Some(projection), FillMode::Nearest) => {
            let inverse = projection.invert();
            let max_x = width.saturating_sub(1) as f32;
            let max_y = height.saturating_sub(1) as f32;
            warp_with(
                image,
                move |x, y| {
                    let (sx, sy) = inverse * (x, y);
                    (sx.clamp(0.0, max_x), sy.clamp(0.0, max_y))
                },
                interpolation,
                Rgb([0; 3]),
            )
        }
    }
}

/// Warps a binary mask with zero fill and nearest-neighbour sampling, so
/// masks never grow from interpolation or edge repetition.
pub fn warp_mask(mask: &GrayImage, projection: Option<&Projection>) -> GrayImage {
    match projection {
        Some(projection) => warp(mask, projection, Interpolation::Nearest, Luma([0])),
        None => GrayImage::new(mask.width(), mask.height()),
    }
}

/// Samples a geometric transform from a seed.
///
/// Implementations must be deterministic: the same seed and image size
/// always give the same transform, which is what lets image and box masks
/// be warped identically.
pub trait TransformGenerator {
    /// The transform for `seed`, mapping source pixels to output pixels.
    /// `None` when the sampled transform is singular.
    fn random_transform(&self, seed: u64, width: u32, height: u32) -> Option<Projection>;

    fn fill_mode(&self) -> FillMode;

    fn interpolation(&self) -> Interpolation {
        Interpolation::Bilinear
    }

    /// Applies the transform for `seed` to an image.
    fn transform_image(&self, image: &RgbImage, seed: u64) -> RgbImage {
        let (width, height) = image.dimensions();
        let projection = self.random_transform(seed, width, height);
        warp_rgb(image, projection.as_ref(), self.fill_mode(), self.interpolation())
    }

    /// Applies the transform for `seed` to a box mask. The fill mode is
    /// always constant zero here, independent of [`Self::fill_mode`].
    fn transform_mask(&self, mask: &GrayImage, seed: u64) -> GrayImage {
        let (width, height) = mask.dimensions();
        warp_mask(mask, self.random_transform(seed, width, height).as_ref())
    }
}

/// Random rotation, shift, shear, zoom and flips, sampled from
/// [`TransformParams`] around the image centre.
#[derive(Clone, Debug, Default)]
pub struct RandomTransformGenerator {
    params: TransformParams,
}

impl RandomTransformGenerator {
    pub fn new(params: TransformParams) -> Result<Self, RetinaError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &TransformParams {
        &self.params
    }
}

impl TransformGenerator for RandomTransformGenerator {
    fn random_transform(&self, seed: u64, width: u32, height: u32) -> Option<Projection> {
        let mut rng = StdRng::seed_from_u64(seed);
        let params = &self.params;

        let theta = symmetric(&mut rng, params.rotation_range).to_radians();
        let tx = symmetric(&mut rng, params.width_shift_range) * f64::from(width);
        let ty = symmetric(&mut rng, params.height_shift_range) * f64::from(height);
        let shear_angle = symmetric(&mut rng, params.shear_range).to_radians();
        let (zoom_low, zoom_high) = params.zoom_range;
        let zx = rng.random_range(zoom_low..=zoom_high);
        let zy = rng.random_range(zoom_low..=zoom_high);
        let flip_h = rng.random_bool(0.5) && params.horizontal_flip;
        let flip_v = rng.random_bool(0.5) && params.vertical_flip;

        let cx = (width as f32 - 1.0) / 2.0;
        let cy = (height as f32 - 1.0) / 2.0;

        // counter-clockwise in image coordinates
        let mut projection = Projection::translate(-cx, -cy)
            .and_then(Projection::scale(zx as f32, zy as f32))
            .and_then(shear(shear_angle as f32)?)
            .and_then(Projection::rotate(-theta as f32))
            .and_then(Projection::translate(cx + tx as f32, cy + ty as f32));
        if flip_h {
            projection = projection.and_then(flip_horizontal(width));
        }
        if flip_v {
            projection = projection.and_then(flip_vertical(height));
        }
        Some(projection)
    }

    fn fill_mode(&self) -> FillMode {
        self.params.fill_mode
    }
}

fn symmetric(rng: &mut StdRng, range: f64) -> f64 {
    if range > 0.0 {
        rng.random_range(-range..=range)
    } else {
        0.0
    }
}

/// A seed derived from the wall clock in milliseconds, truncated to 32 bits.
pub fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::from(elapsed.as_millis() as u32))
        .unwrap_or(0)
}

/// Applies one sampled transform to every image of a batch and recovers
/// the transformed boxes.
///
/// `boxes` has shape `(batch, max_boxes, >=4)`; only the first four columns
/// are rewritten. A single seed drives the whole call, so every image in the
/// batch receives the same transform. Boxes pushed entirely off-frame come
/// back as `[0, 0, 0, 0]`; nothing is filtered here (see
/// [`filter_degenerate_boxes`]).
///
/// Returns the seed that was used.
pub fn augment_batch<G>(
    images: &mut [RgbImage],
    boxes: &mut Array3<f64>,
    generator: &G,
    seed: Option<u64>,
) -> Result<u64, RetinaError>
where
    G: TransformGenerator + ?Sized,
{
    if boxes.len_of(Axis(0)) != images.len() || boxes.len_of(Axis(2)) < 4 {
        return Err(RetinaError::BatchShapeMismatch {
            images: images.len(),
            boxes: boxes.shape().to_vec(),
        });
    }

    let seed = seed.unwrap_or_else(seed_from_clock);
    debug!("augmenting batch of {} image(s) with seed {seed}", images.len());

    for (image, mut image_boxes) in images.iter_mut().zip(boxes.outer_iter_mut()) {
        let (width, height) = image.dimensions();

        for mut row in image_boxes.outer_iter_mut() {
            // truncation matches integer casting of float coordinates
            let corners = [row[0] as i64, row[1] as i64, row[2] as i64, row[3] as i64];

            let mut mask = GrayImage::new(width, height);
            draw_box_mask(&mut mask, corners);
            let mask = generator.transform_mask(&mask, seed);

            let [x1, y1, x2, y2] = external_bounding_rect(&mask);
            row[0] = x1;
            row[1] = y1;
            row[2] = x2;
            row[3] = y2;
        }

        *image = generator.transform_image(image, seed);
    }

    Ok(seed)
}

/// Fills the inclusive rectangle spanned by two corners, clipped to the
/// mask.
fn draw_box_mask(mask: &mut GrayImage, [x1, y1, x2, y2]: [i64; 4]) {
    if mask.width() == 0 || mask.height() == 0 {
        return;
    }

    let max_x = i64::from(mask.width()) - 1;
    let max_y = i64::from(mask.height()) - 1;
    let (left, right) = (x1.min(x2).max(0), x1.max(x2).min(max_x));
    let (top, bottom) = (y1.min(y2).max(0), y1.max(y2).min(max_y));
    if left > right || top > bottom {
        return;
    }

    let rect = Rect::at(left as i32, top as i32)
        .of_size((right - left + 1) as u32, (bottom - top + 1) as u32);
    draw_filled_rect_mut(mask, rect, Luma([255]));
}

/// `[x, y, x + w, y + h]` of the points on the mask's outermost contours,
/// or zeros when the mask is empty.
fn external_bounding_rect(mask: &GrayImage) -> [f64; 4] {
    let contours = find_contours::<i32>(mask);
    let mut points = contours
        .iter()
        .filter(|contour| contour.parent.is_none())
        .flat_map(|contour| contour.points.iter())
        .peekable();

    if points.peek().is_none() {
        return [0.0; 4];
    }

    let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
    let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }

    [
        f64::from(min_x),
        f64::from(min_y),
        f64::from(max_x + 1),
        f64::from(max_y + 1),
    ]
}

/// Keeps only rows of an annotation array with positive width and height.
pub fn filter_degenerate_boxes(annotations: &Array2<f64>) -> Array2<f64> {
    let keep: Vec<usize> = annotations
        .outer_iter()
        .enumerate()
        .filter(|(_, row)| row.len() >= 4 && row[2] > row[0] && row[3] > row[1])
        .map(|(index, _)| index)
        .collect();
    annotations.select(Axis(0), &keep)
}
