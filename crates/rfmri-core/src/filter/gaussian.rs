use ndarray::{Array1, Array3, Axis};

/// Gaussian smoothing filter.
///
/// Applies a Gaussian smoothing filter to a volume using separable 1D
/// convolutions. Sigma is given in voxel units; the kernel reaches out to
/// three sigma and is normalized to unit sum. Borders are zero-padded.
pub struct GaussianFilter {
    sigma: f64,
    max_kernel_width: usize,
}

impl GaussianFilter {
    /// Create a new Gaussian filter with the given standard deviation (in voxels).
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            max_kernel_width: 33,
        }
    }

    /// Set the maximum kernel width (radius * 2 + 1).
    pub fn with_max_kernel_width(mut self, width: usize) -> Self {
        self.max_kernel_width = width;
        self
    }

    /// Apply the filter to a volume.
    pub fn apply(&self, input: &Array3<f32>) -> Array3<f32> {
        if self.sigma <= 1e-6 {
            return input.clone();
        }
        let kernel = self.kernel();
        let mut data = input.clone();
        for axis in 0..3 {
            data = Self::convolve_axis(&data, &kernel, axis);
        }
        data
    }

    fn kernel(&self) -> Array1<f32> {
        let radius = ((3.0 * self.sigma).ceil() as usize).max(1);
        let width = (2 * radius + 1).min(self.max_kernel_width);
        let radius = (width - 1) / 2;
        let two_sigma2 = 2.0 * self.sigma * self.sigma;

        let mut kernel = Array1::<f32>::zeros(2 * radius + 1);
        let mut sum = 0.0;
        for i in 0..kernel.len() {
            let x = i as f64 - radius as f64;
            let val = (-x * x / two_sigma2).exp();
            kernel[i] = val as f32;
            sum += val;
        }
        kernel.mapv_inplace(|v| v / sum as f32);
        kernel
    }

    fn convolve_axis(data: &Array3<f32>, kernel: &Array1<f32>, axis: usize) -> Array3<f32> {
        let mut out = Array3::<f32>::zeros(data.dim());
        let radius = (kernel.len() - 1) as i64 / 2;

        for (lane_in, mut lane_out) in data
            .lanes(Axis(axis))
            .into_iter()
            .zip(out.lanes_mut(Axis(axis)))
        {
            let n = lane_in.len() as i64;
            for i in 0..n {
                let mut acc = 0.0f32;
                for (t, &w) in kernel.iter().enumerate() {
                    let j = i + t as i64 - radius;
                    if j >= 0 && j < n {
                        acc += w * lane_in[j as usize];
                    }
                }
                lane_out[i as usize] = acc;
            }
        }
        out
    }
}
