//! Depth-axis rescaling of 3-D volumes
//!
//! Volumes are indexed `[x, y, z]`. Rescaling exchanges axes 1 and 2, resamples
//! the exchanged axis with order-1 (linear) interpolation, and exchanges them back,
//! leaving `x` and `y` untouched.

use crate::errors::{BrainIoError, Result};
use ndarray::{
    Array, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, ArrayViewMut1, Axis, Dimension, Zip,
};
use tracing::debug;

/// Rescale a volume along its depth (z) axis.
///
/// The new depth is `round(z * factor)`. Sample positions are spread so the first
/// and last output planes coincide with the first and last input planes.
///
/// # Errors
///
/// Returns [`BrainIoError::InvalidScaleFactor`] for a non-finite or non-positive
/// factor and [`BrainIoError::EmptyVolume`] for an empty input, or a factor that
/// would leave no planes.
pub fn scale_z(volume: &Array3<f32>, factor: f64) -> Result<Array3<f32>> {
    debug!(shape = ?volume.shape(), factor, "Scaling z dimension");

    let mut swapped = volume.view();
    swapped.swap_axes(1, 2);

    let mut scaled = zoom_axis(swapped, Axis(1), factor)?;
    scaled.swap_axes(1, 2);

    Ok(scaled.as_standard_layout().into_owned())
}

/// Rescale a single plane along its rows (`x`) and columns (`y`), rounding back
/// to 16-bit samples. A factor of exactly one leaves that axis untouched.
///
/// # Errors
///
/// See [`scale_z`].
#[allow(clippy::float_cmp)]
pub fn scale_plane(plane: ArrayView2<u16>, x_factor: f64, y_factor: f64) -> Result<Array2<u16>> {
    let mut volume = plane.insert_axis(Axis(2)).mapv(f32::from);
    for (axis, factor) in [(Axis(0), x_factor), (Axis(1), y_factor)] {
        if factor != 1.0 {
            volume = zoom_axis(volume.view(), axis, factor)?;
        }
    }
    Ok(to_u16(&volume).index_axis_move(Axis(2), 0))
}

/// Round and clamp resampled values back into the 16-bit voxel range
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_u16<D: Dimension>(volume: &Array<f32, D>) -> Array<u16, D> {
    volume.mapv(|v| v.round().clamp(0.0, f32::from(u16::MAX)) as u16)
}

/// Length of an axis of `in_len` samples after scaling by `factor`.
///
/// # Errors
///
/// Returns [`BrainIoError::InvalidScaleFactor`] for a non-finite or non-positive
/// factor, or one whose result does not fit in memory addressing.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn scaled_len(in_len: usize, factor: f64) -> Result<usize> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(BrainIoError::InvalidScaleFactor { factor });
    }
    let scaled = (in_len as f64 * factor).round();
    if scaled >= isize::MAX as f64 {
        return Err(BrainIoError::InvalidScaleFactor { factor });
    }
    Ok(scaled as usize)
}

/// Linearly resample `volume` along `axis` by `factor`; other axes pass through.
///
/// # Errors
///
/// See [`scale_z`]. A factor whose output would exceed the addressable size is
/// rejected as [`BrainIoError::InvalidScaleFactor`] before anything is allocated.
pub fn zoom_axis(volume: ArrayView3<f32>, axis: Axis, factor: f64) -> Result<Array3<f32>> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(BrainIoError::InvalidScaleFactor { factor });
    }
    if volume.is_empty() {
        return Err(BrainIoError::EmptyVolume {
            shape: volume.shape().to_vec(),
        });
    }

    let out_len = scaled_len(volume.len_of(axis), factor)?;

    let mut shape = volume.raw_dim();
    shape[axis.index()] = out_len;
    if out_len == 0 {
        return Err(BrainIoError::EmptyVolume {
            shape: shape.slice().to_vec(),
        });
    }

    let byte_len = shape
        .slice()
        .iter()
        .try_fold(std::mem::size_of::<f32>(), |acc, &n| acc.checked_mul(n))
        .filter(|&bytes| isize::try_from(bytes).is_ok());
    if byte_len.is_none() {
        return Err(BrainIoError::InvalidScaleFactor { factor });
    }

    let mut output = Array3::<f32>::zeros(shape);
    Zip::from(output.lanes_mut(axis))
        .and(volume.lanes(axis))
        .par_for_each(resample_lane);

    Ok(output)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn resample_lane(mut out: ArrayViewMut1<f32>, input: ArrayView1<f32>) {
    let in_len = input.len();
    let out_len = out.len();
    let step = if out_len > 1 {
        (in_len - 1) as f64 / (out_len - 1) as f64
    } else {
        0.0
    };

    for (o, value) in out.iter_mut().enumerate() {
        let coord = o as f64 * step;
        let lo = (coord.floor() as usize).min(in_len - 1);
        let hi = (lo + 1).min(in_len - 1);
        let frac = coord - lo as f64;

        let a = f64::from(input[lo]);
        let b = f64::from(input[hi]);
        *value = (a + (b - a) * frac) as f32;
    }
}
