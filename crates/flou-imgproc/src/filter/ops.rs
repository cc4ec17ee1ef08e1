use flou_image::Image;

use super::{filter2d_with, kernels, BorderMode, FilterError};
use crate::parallel::ExecutionStrategy;

/// Blur an image using a gaussian blur filter
///
/// The kernel parameters are validated before any row task is launched.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C), C being 3 or 4.
/// * `kernel_size` - The side length of the square kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A new image with the size of `src`, border pixels dimmed as described in
/// [`BorderMode::Skip`].
///
/// # Example
///
/// ```
/// use flou_image::Image;
/// use flou_imgproc::filter::gaussian_blur;
///
/// let src = Image::<u8, 3>::from_size_val([8, 6].into(), 100).unwrap();
/// let dst = gaussian_blur(&src, 3, 1.0).unwrap();
///
/// assert_eq!(dst.size(), src.size());
/// assert_eq!(dst.get_pixel(4, 3, 0).unwrap(), &100);
/// ```
pub fn gaussian_blur<const C: usize>(
    src: &Image<u8, C>,
    kernel_size: usize,
    sigma: f64,
) -> Result<Image<u8, C>, FilterError> {
    gaussian_blur_with(
        src,
        kernel_size,
        sigma,
        BorderMode::default(),
        ExecutionStrategy::default(),
    )
}

/// Blur an image using a gaussian blur filter with an explicit border mode and strategy.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C), C being 3 or 4.
/// * `kernel_size` - The side length of the square kernel.
/// * `sigma` - The sigma of the gaussian kernel.
/// * `border` - How taps outside the image are handled.
/// * `strategy` - How row tasks are scheduled.
pub fn gaussian_blur_with<const C: usize>(
    src: &Image<u8, C>,
    kernel_size: usize,
    sigma: f64,
    border: BorderMode,
    strategy: ExecutionStrategy,
) -> Result<Image<u8, C>, FilterError> {
    let kernel = kernels::gaussian_kernel_2d(kernel_size, sigma)?;
    filter2d_with(src, &kernel, border, strategy)
}
