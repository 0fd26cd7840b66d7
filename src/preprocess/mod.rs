//! Image and box preprocessing.
//!
//! The pipeline for one training image is:
//!
//! 1. [`augment_batch`] on decoded RGB images and their boxes,
//! 2. [`resize_image`], then [`scale_boxes`] with the returned scale,
//! 3. [`to_bgr_array`] and [`normalize`] to produce the network input.

mod augment;

pub use augment::{
    augment_batch, filter_degenerate_boxes, flip_horizontal, flip_vertical, load_transform_params,
    seed_from_clock, shear, warp_mask, warp_rgb, FillMode, RandomTransformGenerator,
    TransformGenerator, TransformParams,
};

use image::imageops::{self, FilterType};
use image::RgbImage;
use ndarray::{Array3, ArrayBase, Axis, DataMut, RemoveAxis};

use crate::error::RetinaError;

/// Per-channel means subtracted by [`normalize`], in B, G, R order.
///
/// These match the ImageNet-pretrained backbone convention and must not be
/// changed independently of the weights.
pub const BGR_MEANS: [f32; 3] = [103.939, 116.779, 123.68];

/// Where the channel axis lives in an image tensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DataFormat {
    /// `(C, H, W)` or `(N, C, H, W)`.
    ChannelsFirst,
    /// `(..., C)`.
    #[default]
    ChannelsLast,
}

impl DataFormat {
    fn channel_axis(self, ndim: usize) -> Option<usize> {
        match self {
            DataFormat::ChannelsFirst => match ndim {
                3 => Some(0),
                4 => Some(1),
                _ => None,
            },
            DataFormat::ChannelsLast => ndim.checked_sub(1),
        }
    }
}

/// Subtracts [`BGR_MEANS`] from channels 0, 1 and 2 in place.
///
/// The input is expected to already be in BGR channel order (see
/// [`to_bgr_array`]).
///
/// # Errors
/// Fails when the array has no channel axis for `format` or fewer than three
/// channels on it.
pub fn normalize<S, D>(image: &mut ArrayBase<S, D>, format: DataFormat) -> Result<(), RetinaError>
where
    S: DataMut<Elem = f32>,
    D: RemoveAxis,
{
    let shape = image.shape().to_vec();
    let axis = format
        .channel_axis(image.ndim())
        .filter(|&axis| shape[axis] >= BGR_MEANS.len())
        .ok_or_else(|| RetinaError::InvalidImageShape {
            shape: shape.clone(),
            message: format!("expected at least 3 channels in {format:?} layout"),
        })?;

    for (channel, mean) in BGR_MEANS.iter().enumerate() {
        image
            .index_axis_mut(Axis(axis), channel)
            .mapv_inplace(|v| v - mean);
    }
    Ok(())
}

/// Converts an RGB image into an `(H, W, 3)` float array in BGR order.
pub fn to_bgr_array(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    Array3::from_shape_fn((height as usize, width as usize, 3), |(y, x, c)| {
        f32::from(image.get_pixel(x as u32, y as u32)[2 - c])
    })
}

/// Bounds for [`resize_image`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeConfig {
    pub min_side: u32,
    pub max_side: u32,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            min_side: 600,
            max_side: 1024,
        }
    }
}

/// Computes the uniform scale that brings the smaller side to `min_side`,
/// clamped so the larger side does not exceed `max_side`.
///
/// # Errors
/// Fails with [`RetinaError::InvalidImageShape`] when either side is zero.
pub fn compute_resize_scale(
    rows: u32,
    cols: u32,
    min_side: u32,
    max_side: u32,
) -> Result<f64, RetinaError> {
    if rows == 0 || cols == 0 {
        return Err(RetinaError::InvalidImageShape {
            shape: vec![rows as usize, cols as usize],
            message: "cannot resize an image with a zero-sized side".to_string(),
        });
    }

    let smallest_side = f64::from(rows.min(cols));
    let largest_side = f64::from(rows.max(cols));

    let scale = f64::from(min_side) / smallest_side;
    if largest_side * scale > f64::from(max_side) {
        Ok(f64::from(max_side) / largest_side)
    } else {
        Ok(scale)
    }
}

/// Resizes `image` with one scale for both axes and returns it with the
/// scale used.
///
/// Box coordinates are not touched; callers must apply the same scale
/// (e.g. with [`scale_boxes`]).
pub fn resize_image(
    image: &RgbImage,
    config: &ResizeConfig,
) -> Result<(RgbImage, f64), RetinaError> {
    let (cols, rows) = image.dimensions();
    let scale = compute_resize_scale(rows, cols, config.min_side, config.max_side)?;

    let (width, height) = scaled_dimensions(cols, rows, scale);
    let resized = imageops::resize(image, width, height, FilterType::Triangle);
    Ok((resized, scale))
}

/// Output size of an image of `width × height` resized by `scale`.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let scale_side = |side: u32| (f64::from(side) * scale).round().max(1.0) as u32;
    (scale_side(width), scale_side(height))
}

/// Multiplies the first four columns of an annotation array by `scale`.
pub fn scale_boxes<S>(annotations: &mut ArrayBase<S, ndarray::Ix2>, scale: f64)
where
    S: DataMut<Elem = f64>,
{
    let columns = annotations.ncols().min(4);
    annotations
        .slice_mut(ndarray::s![.., ..columns])
        .mapv_inplace(|v| v * scale);
}
