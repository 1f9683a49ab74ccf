//! Elementary statistics over image volumes.
//!
//! Nothing here goes beyond the arithmetic the pipelines need: temporal
//! mean and standard deviation, tSNR, and the Pearson coefficient between
//! two activation patterns.

use ndarray::{Array3, Array4, ArrayViewD, Axis};

use crate::error::{CoreError, Result};

/// Pearson correlation between two arrays of the same size.
///
/// Both arrays are flattened before the coefficient is computed. Fails on
/// a size mismatch or when either input has zero variance.
pub fn pattern_corr(a: &ArrayViewD<f32>, b: &ArrayViewD<f32>) -> Result<f64> {
    if a.len() != b.len() {
        return Err(CoreError::ShapeMismatch {
            expected: a.shape().to_vec(),
            actual: b.shape().to_vec(),
        });
    }
    if a.is_empty() {
        return Err(CoreError::invalid_argument(
            "cannot correlate empty arrays",
        ));
    }

    let n = a.len() as f64;
    let mean_a = a.iter().map(|&v| v as f64).sum::<f64>() / n;
    let mean_b = b.iter().map(|&v| v as f64).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x as f64 - mean_a;
        let dy = y as f64 - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return Err(CoreError::invalid_argument(
            "correlation is undefined for a constant input",
        ));
    }
    Ok(cov / (var_a.sqrt() * var_b.sqrt()))
}

/// Temporal mean of a 4D time series (time along the last axis).
pub fn mean_over_time(data: &Array4<f32>) -> Array3<f32> {
    data.mean_axis(Axis(3)).expect("time axis is non-empty")
}

/// Temporal standard deviation of a 4D time series (population formula).
pub fn std_over_time(data: &Array4<f32>) -> Array3<f32> {
    data.std_axis(Axis(3), 0.0)
}

/// Temporal signal-to-noise ratio: mean over standard deviation per voxel.
///
/// Voxels with zero standard deviation get a tSNR of zero.
pub fn tsnr(data: &Array4<f32>) -> Array3<f32> {
    let mean = mean_over_time(data);
    let std = std_over_time(data);
    let mut out = mean;
    out.zip_mut_with(&std, |m, &s| {
        *m = if s > 0.0 { *m / s } else { 0.0 };
    });
    out
}

/// Voxelwise mean over a set of equally shaped 4D time series.
pub fn mean4d(volumes: &[Array4<f32>]) -> Result<Array4<f32>> {
    let first = volumes
        .first()
        .ok_or_else(|| CoreError::invalid_argument("no volumes to average"))?;
    for v in volumes {
        if v.dim() != first.dim() {
            return Err(CoreError::ShapeMismatch {
                expected: first.shape().to_vec(),
                actual: v.shape().to_vec(),
            });
        }
    }
    let mut out = Array4::<f32>::zeros(first.dim());
    for v in volumes {
        out += v;
    }
    out /= volumes.len() as f32;
    Ok(out)
}
