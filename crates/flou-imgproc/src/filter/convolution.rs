use std::sync::atomic::{AtomicBool, Ordering};

use flou_image::Image;

use super::{kernels::Kernel2d, FilterError};
use crate::parallel::{for_each_row_mut, ExecutionStrategy};

/// Factor that widens an 8-bit sample to the 16-bit accumulation scale (`0xff` to `0xffff`).
pub const CHANNEL_SCALE: f64 = 257.0;

/// Divisor that brings a 16-bit scale sum back into the 8-bit output range.
pub const OUTPUT_DIVISOR: f64 = 256.0;

/// Number of color channels that are convolved; a fourth channel is alpha.
const COLOR_CHANNELS: usize = 3;

/// How kernel taps that fall outside the image are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderMode {
    /// Drop out-of-bounds taps without compensating for their weight.
    ///
    /// Pixels within `kernel_size / 2` of an edge receive less than the full
    /// kernel mass and come out darker than the interior.
    #[default]
    Skip,

    /// Drop out-of-bounds taps and divide by the sum of the weights that were used.
    ///
    /// A uniform image stays uniform up to the edges.
    Renormalize,
}

/// Convolve a raster with a 2D kernel, one row task per output row.
///
/// The output has the size and channel count of the source. Color channels are
/// accumulated on the 16-bit scale and truncated back to 8 bits; the alpha
/// channel of RGBA rasters is set to 255.
///
/// Uses [`BorderMode::Skip`] and [`ExecutionStrategy::ParallelRows`].
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C), C being 3 or 4.
/// * `kernel` - The convolution kernel.
///
/// # Example
///
/// ```
/// use flou_image::Image;
/// use flou_imgproc::filter::{filter2d, kernels::Kernel2d};
///
/// let src = Image::<u8, 4>::new([2, 1].into(), vec![10, 20, 30, 40, 50, 60, 70, 80]).unwrap();
/// let dst = filter2d(&src, &Kernel2d::identity()).unwrap();
///
/// assert_eq!(dst.as_slice(), &[10, 20, 30, 255, 50, 60, 70, 255]);
/// ```
pub fn filter2d<const C: usize>(
    src: &Image<u8, C>,
    kernel: &Kernel2d,
) -> Result<Image<u8, C>, FilterError> {
    filter2d_with(src, kernel, BorderMode::default(), ExecutionStrategy::default())
}

/// Convolve a raster with a 2D kernel using the given border mode and strategy.
///
/// See [`filter2d`].
pub fn filter2d_with<const C: usize>(
    src: &Image<u8, C>,
    kernel: &Kernel2d,
    border: BorderMode,
    strategy: ExecutionStrategy,
) -> Result<Image<u8, C>, FilterError> {
    let mut dst = Image::from_size_val(src.size(), 0u8)?;
    filter2d_impl(src, &mut dst, kernel, border, strategy, None)?;
    Ok(dst)
}

/// Convolve a raster with a 2D kernel into a preallocated destination.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C), C being 3 or 4.
/// * `dst` - The destination image with the same shape as `src`.
/// * `kernel` - The convolution kernel.
/// * `border` - How taps outside the image are handled.
/// * `strategy` - How row tasks are scheduled.
///
/// # Errors
///
/// Returns [`FilterError::DimensionMismatch`] before any row is processed if
/// `dst` and `src` differ in size.
pub fn filter2d_into<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    kernel: &Kernel2d,
    border: BorderMode,
    strategy: ExecutionStrategy,
) -> Result<(), FilterError> {
    filter2d_impl(src, dst, kernel, border, strategy, None)
}

/// Same as [`filter2d_into`], abandoning the work when `cancel` is raised.
///
/// The flag is checked before each row starts. Rows already started always
/// complete, so on [`FilterError::Cancelled`] every row of `dst` is either
/// fully filtered or left untouched.
pub fn filter2d_cancellable<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    kernel: &Kernel2d,
    border: BorderMode,
    strategy: ExecutionStrategy,
    cancel: &AtomicBool,
) -> Result<(), FilterError> {
    filter2d_impl(src, dst, kernel, border, strategy, Some(cancel))
}

fn filter2d_impl<const C: usize>(
    src: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    kernel: &Kernel2d,
    border: BorderMode,
    strategy: ExecutionStrategy,
    cancel: Option<&AtomicBool>,
) -> Result<(), FilterError> {
    if C != 3 && C != 4 {
        return Err(FilterError::UnsupportedChannels(C));
    }

    if src.size() != dst.size() {
        return Err(FilterError::DimensionMismatch {
            src: src.size(),
            dst: dst.size(),
        });
    }

    if src.size().is_empty() {
        return Ok(());
    }

    log::debug!(
        "filter2d: {}x{}x{} kernel {} border {:?} strategy {}",
        src.width(),
        src.height(),
        C,
        kernel.size(),
        border,
        strategy
    );

    let skipped = AtomicBool::new(false);

    for_each_row_mut(dst.as_slice_mut(), src.row_stride(), strategy, |y, dst_row| {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            skipped.store(true, Ordering::Relaxed);
            return;
        }
        convolve_row(src, kernel, border, y, dst_row);
    })?;

    if skipped.load(Ordering::Relaxed) {
        return Err(FilterError::Cancelled);
    }

    Ok(())
}

/// Compute output row `y` into `dst_row`.
///
/// Taps are visited row-major, `ky` outer and `kx` inner, so the summation
/// order of every pixel is fixed whatever the schedule.
fn convolve_row<const C: usize>(
    src: &Image<u8, C>,
    kernel: &Kernel2d,
    border: BorderMode,
    y: usize,
    dst_row: &mut [u8],
) {
    let width = src.width();
    let height = src.height();
    let stride = src.row_stride();
    let src_data = src.as_slice();
    let kernel_size = kernel.size();
    let half_kernel = kernel_size / 2;

    for (x, dst_pixel) in dst_row.chunks_exact_mut(C).enumerate() {
        let mut sum = [0.0f64; COLOR_CHANNELS];
        let mut weight_sum = 0.0f64;

        for ky in 0..kernel_size {
            let Some(sy) = (y + ky).checked_sub(half_kernel).filter(|&sy| sy < height) else {
                continue;
            };
            let src_row = &src_data[sy * stride..(sy + 1) * stride];

            for (kx, &weight) in kernel.row(ky).iter().enumerate() {
                let Some(sx) = (x + kx).checked_sub(half_kernel).filter(|&sx| sx < width) else {
                    continue;
                };
                let src_pixel = &src_row[sx * C..sx * C + COLOR_CHANNELS];

                for (acc, &v) in sum.iter_mut().zip(src_pixel) {
                    *acc += weight * (v as f64 * CHANNEL_SCALE);
                }
                weight_sum += weight;
            }
        }

        let norm = match border {
            BorderMode::Renormalize if weight_sum > 0.0 => weight_sum,
            _ => 1.0,
        };

        for (out, acc) in dst_pixel.iter_mut().zip(sum) {
            *out = (acc / norm / OUTPUT_DIVISOR) as u8;
        }

        if C == 4 {
            dst_pixel[COLOR_CHANNELS] = u8::MAX;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::kernels::gaussian_kernel_2d;
    use flou_image::ImageSize;

    fn solid_rgba(size: ImageSize, color: [u8; 4]) -> Result<Image<u8, 4>, FilterError> {
        let data = color.repeat(size.width * size.height);
        Ok(Image::new(size, data)?)
    }

    #[test]
    fn test_filter2d_identity_rgb() -> Result<(), FilterError> {
        let data = (0..5 * 4 * 3).map(|v| (v * 7 % 256) as u8).collect();
        let src = Image::<u8, 3>::new([5, 4].into(), data)?;
        let dst = filter2d(&src, &Kernel2d::identity())?;
        assert_eq!(dst, src);
        Ok(())
    }

    #[test]
    fn test_filter2d_identity_forces_alpha() -> Result<(), FilterError> {
        let src = Image::<u8, 4>::new([2, 1].into(), vec![0, 128, 255, 0, 1, 2, 3, 17])?;
        let dst = filter2d(&src, &Kernel2d::identity())?;
        assert_eq!(dst.as_slice(), &[0, 128, 255, 255, 1, 2, 3, 255]);
        Ok(())
    }

    #[test]
    fn test_filter2d_red_square() -> Result<(), FilterError> {
        let src = solid_rgba([4, 4].into(), [255, 0, 0, 255])?;
        let kernel = gaussian_kernel_2d(3, 1.0)?;
        let dst = filter2d(&src, &kernel)?;

        assert_eq!(dst.size(), src.size());

        // interior pixels see the whole kernel
        for (x, y) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            for ch in 0..4 {
                assert_eq!(dst.get_pixel(x, y, ch)?, src.get_pixel(x, y, ch)?);
            }
        }

        // corners only see four of the nine taps
        for (x, y) in [(0, 0), (3, 0), (0, 3), (3, 3)] {
            assert!(*dst.get_pixel(x, y, 0)? < 255);
            assert_eq!(*dst.get_pixel(x, y, 1)?, 0);
            assert_eq!(*dst.get_pixel(x, y, 3)?, 255);
        }

        Ok(())
    }

    #[test]
    fn test_filter2d_corner_value() -> Result<(), FilterError> {
        let src = solid_rgba([4, 4].into(), [255, 255, 255, 255])?;
        let kernel = gaussian_kernel_2d(3, 1.0)?;
        let dst = filter2d(&src, &kernel)?;

        // center + 2 edges + 1 corner of the normalized 3x3 kernel
        let mass = kernel.get(1, 1).unwrap_or_default()
            + kernel.get(1, 2).unwrap_or_default()
            + kernel.get(2, 1).unwrap_or_default()
            + kernel.get(2, 2).unwrap_or_default();
        let expected = (mass * 255.0 * CHANNEL_SCALE / OUTPUT_DIVISOR) as u8;

        assert_eq!(*dst.get_pixel(0, 0, 0)?, expected);
        assert_eq!(expected, 134);
        Ok(())
    }

    #[test]
    fn test_filter2d_renormalize_keeps_uniform() -> Result<(), FilterError> {
        let color = [200, 100, 50, 255];
        let src = solid_rgba([6, 5].into(), color)?;
        let kernel = gaussian_kernel_2d(5, 2.0)?;
        let dst = filter2d_with(
            &src,
            &kernel,
            BorderMode::Renormalize,
            ExecutionStrategy::Serial,
        )?;
        assert_eq!(dst, src);
        Ok(())
    }

    #[test]
    fn test_filter2d_kernel_larger_than_image() -> Result<(), FilterError> {
        let src = solid_rgba([2, 2].into(), [90, 90, 90, 255])?;
        let kernel = gaussian_kernel_2d(9, 3.0)?;
        let dst = filter2d(&src, &kernel)?;
        assert_eq!(dst.size(), src.size());
        assert!(dst.as_slice().chunks_exact(4).all(|p| p[0] < 90));

        let dst = filter2d_with(
            &src,
            &kernel,
            BorderMode::Renormalize,
            ExecutionStrategy::default(),
        )?;
        assert_eq!(dst, src);
        Ok(())
    }

    #[test]
    fn test_filter2d_empty() -> Result<(), FilterError> {
        let kernel = gaussian_kernel_2d(3, 1.0)?;
        for size in [[0, 0], [0, 3], [3, 0]] {
            let src = Image::<u8, 4>::new(size.into(), vec![])?;
            let dst = filter2d(&src, &kernel)?;
            assert_eq!(dst.size(), src.size());
            assert!(dst.as_slice().is_empty());
        }
        Ok(())
    }

    #[test]
    fn test_filter2d_into_mismatch() -> Result<(), FilterError> {
        let src = Image::<u8, 3>::from_size_val([4, 4].into(), 0)?;
        let mut dst = Image::<u8, 3>::from_size_val([4, 3].into(), 7)?;
        let res = filter2d_into(
            &src,
            &mut dst,
            &Kernel2d::identity(),
            BorderMode::Skip,
            ExecutionStrategy::Serial,
        );
        assert_eq!(
            res,
            Err(FilterError::DimensionMismatch {
                src: [4, 4].into(),
                dst: [4, 3].into(),
            })
        );
        // nothing was written
        assert!(dst.as_slice().iter().all(|&v| v == 7));
        Ok(())
    }

    #[test]
    fn test_filter2d_unsupported_channels() -> Result<(), FilterError> {
        let src = Image::<u8, 1>::from_size_val([4, 4].into(), 0)?;
        let res = filter2d(&src, &Kernel2d::identity());
        assert_eq!(res, Err(FilterError::UnsupportedChannels(1)));
        Ok(())
    }

    #[test]
    fn test_filter2d_cancelled_before_start() -> Result<(), FilterError> {
        let src = solid_rgba([8, 8].into(), [10, 20, 30, 255])?;
        let mut dst = Image::<u8, 4>::from_size_val(src.size(), 0)?;
        let cancel = AtomicBool::new(true);
        let res = filter2d_cancellable(
            &src,
            &mut dst,
            &Kernel2d::identity(),
            BorderMode::Skip,
            ExecutionStrategy::ParallelRows,
            &cancel,
        );
        assert_eq!(res, Err(FilterError::Cancelled));
        assert!(dst.as_slice().iter().all(|&v| v == 0));
        Ok(())
    }

    #[test]
    fn test_filter2d_not_cancelled() -> Result<(), FilterError> {
        let src = solid_rgba([8, 8].into(), [10, 20, 30, 255])?;
        let mut dst = Image::<u8, 4>::from_size_val(src.size(), 0)?;
        let cancel = AtomicBool::new(false);
        filter2d_cancellable(
            &src,
            &mut dst,
            &Kernel2d::identity(),
            BorderMode::Skip,
            ExecutionStrategy::Fixed(2),
            &cancel,
        )?;
        assert_eq!(dst, src);
        Ok(())
    }
}
