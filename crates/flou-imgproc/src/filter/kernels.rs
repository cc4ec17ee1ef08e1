use super::FilterError;

/// A square matrix of convolution weights.
///
/// The weights are stored row-major: cell `(i, j)` is row `i`, column `j`.
/// Kernels built by [`gaussian_kernel_2d`] sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel2d {
    size: usize,
    data: Vec<f64>,
}

impl Kernel2d {
    /// The `1 x 1` kernel that leaves an image unchanged.
    pub fn identity() -> Self {
        Self {
            size: 1,
            data: vec![1.0],
        }
    }

    /// Side length of the kernel.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// All the weights, row-major.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// The weights of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= self.size()`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.size..(i + 1) * self.size]
    }

    /// The weight at row `i`, column `j`, or `None` if out of bounds.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i >= self.size || j >= self.size {
            return None;
        }
        Some(self.data[i * self.size + j])
    }

    /// Sum of all the weights.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

/// Create a normalized 2D gaussian kernel.
///
/// Every cell `(i, j)` samples the isotropic gaussian density at the offset
/// `(mid - i, mid - j)` with `mid = kernel_size / 2`, then the whole matrix is
/// divided by its sum.
///
/// # Arguments
///
/// * `kernel_size` - The side length of the kernel.
/// * `sigma` - The standard deviation of the gaussian.
///
/// # Errors
///
/// Returns [`FilterError::InvalidKernelSize`] for a zero size or one whose
/// cell count overflows `usize`, and
/// [`FilterError::InvalidSigma`] when sigma is not a finite positive number.
///
/// # Example
///
/// ```
/// use flou_imgproc::filter::kernels::gaussian_kernel_2d;
///
/// let kernel = gaussian_kernel_2d(3, 1.0).unwrap();
///
/// assert_eq!(kernel.size(), 3);
/// assert!((kernel.sum() - 1.0).abs() < 1e-9);
/// ```
pub fn gaussian_kernel_2d(kernel_size: usize, sigma: f64) -> Result<Kernel2d, FilterError> {
    let num_cells = kernel_size
        .checked_mul(kernel_size)
        .filter(|&n| n > 0)
        .ok_or(FilterError::InvalidKernelSize(kernel_size))?;

    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(FilterError::InvalidSigma(sigma));
    }

    let mid = (kernel_size / 2) as f64;
    let sigma_sq = sigma * sigma;
    let scale = 1.0 / (2.0 * std::f64::consts::PI * sigma_sq);

    let mut data = Vec::with_capacity(num_cells);
    for i in 0..kernel_size {
        let dx = mid - i as f64;
        for j in 0..kernel_size {
            let dy = mid - j as f64;
            data.push(scale * (-(dx * dx + dy * dy) / (2.0 * sigma_sq)).exp());
        }
    }

    // the center cell is always `scale`, so only an overflowing scale gets here
    let norm = data.iter().sum::<f64>();
    if !norm.is_finite() || norm <= 0.0 {
        return Err(FilterError::InvalidSigma(sigma));
    }

    data.iter_mut().for_each(|k| *k /= norm);

    Ok(Kernel2d {
        size: kernel_size,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gaussian_kernel_2d_values() -> Result<(), FilterError> {
        let kernel = gaussian_kernel_2d(3, 1.0)?;

        // exp(0), exp(-1/2) and exp(-1) over their sum
        let center = 0.204_179_955_571_658;
        let edge = 0.123_841_403_152_974;
        let corner = 0.075_113_607_954_112;

        #[rustfmt::skip]
        let expected = [
            corner, edge, corner,
            edge, center, edge,
            corner, edge, corner,
        ];

        for (&k, &e) in kernel.as_slice().iter().zip(expected.iter()) {
            assert_relative_eq!(k, e, epsilon = 1e-9);
        }

        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_2d_normalized() -> Result<(), FilterError> {
        for kernel_size in 1..=15 {
            for sigma in [0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 100.0] {
                let kernel = gaussian_kernel_2d(kernel_size, sigma)?;
                assert_eq!(kernel.as_slice().len(), kernel_size * kernel_size);
                assert_relative_eq!(kernel.sum(), 1.0, epsilon = 1e-9);
                assert!(kernel.as_slice().iter().all(|&k| k >= 0.0));
            }
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_2d_symmetric() -> Result<(), FilterError> {
        for kernel_size in [1, 3, 5, 9, 15] {
            let kernel = gaussian_kernel_2d(kernel_size, 1.7)?;
            let n = kernel.size();
            for i in 0..n {
                for j in 0..n {
                    assert_eq!(kernel.get(i, j), kernel.get(n - 1 - i, n - 1 - j));
                    assert_eq!(kernel.get(i, j), kernel.get(j, i));
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_2d_even_size() -> Result<(), FilterError> {
        // the center sits at size / 2, so even kernels lean towards the origin
        let kernel = gaussian_kernel_2d(2, 1.0)?;
        assert_relative_eq!(kernel.sum(), 1.0, epsilon = 1e-9);
        assert_eq!(kernel.get(0, 1), kernel.get(1, 0));
        assert!(kernel.get(1, 1) > kernel.get(0, 0));
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_2d_identity() -> Result<(), FilterError> {
        for sigma in [0.01, 1.0, 1000.0] {
            let kernel = gaussian_kernel_2d(1, sigma)?;
            assert_eq!(kernel, Kernel2d::identity());
        }
        Ok(())
    }

    #[test]
    fn test_gaussian_kernel_2d_invalid() {
        assert_eq!(
            gaussian_kernel_2d(0, 1.0),
            Err(FilterError::InvalidKernelSize(0))
        );
        assert_eq!(
            gaussian_kernel_2d(3, 0.0),
            Err(FilterError::InvalidSigma(0.0))
        );
        assert_eq!(
            gaussian_kernel_2d(3, -1.0),
            Err(FilterError::InvalidSigma(-1.0))
        );
        assert!(matches!(
            gaussian_kernel_2d(3, f64::NAN),
            Err(FilterError::InvalidSigma(_))
        ));
        assert!(matches!(
            gaussian_kernel_2d(3, 1e-200),
            Err(FilterError::InvalidSigma(_))
        ));
    }

    #[test]
    fn test_gaussian_kernel_2d_size_overflow() {
        let kernel_size = usize::MAX / 2 + 1;
        assert_eq!(
            gaussian_kernel_2d(kernel_size, 1.0),
            Err(FilterError::InvalidKernelSize(kernel_size))
        );

        // smallest side whose square no longer fits in usize
        let kernel_size = (1usize << (usize::BITS / 2)) + 1;
        assert_eq!(
            gaussian_kernel_2d(kernel_size, 1.0),
            Err(FilterError::InvalidKernelSize(kernel_size))
        );
    }

    #[test]
    fn test_kernel_accessors() -> Result<(), FilterError> {
        let kernel = gaussian_kernel_2d(3, 1.0)?;
        assert_eq!(kernel.row(1)[1], kernel.as_slice()[4]);
        assert_eq!(kernel.get(3, 0), None);
        assert_eq!(kernel.get(0, 3), None);
        Ok(())
    }
}
