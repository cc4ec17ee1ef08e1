use std::path::PathBuf;

use argh::FromArgs;

use flou::{
    image::{Image, ImageSize},
    imgproc::{
        filter::{filter2d_with, kernels, BorderMode},
        parallel::ExecutionStrategy,
    },
    io::{functional, perf},
};

#[derive(FromArgs)]
/// Time the gaussian blur under every execution strategy
struct Args {
    /// blur this image instead of a synthetic one
    #[argh(option, short = 'i')]
    input: Option<PathBuf>,

    /// width of the synthetic image
    #[argh(option, default = "1920")]
    width: usize,

    /// height of the synthetic image
    #[argh(option, default = "1080")]
    height: usize,

    /// the side length of the gaussian kernel
    #[argh(option, default = "10")]
    kernel_size: usize,

    /// the sigma of the gaussian kernel
    #[argh(option, default = "5.0")]
    sigma: f64,

    /// how many times each strategy runs
    #[argh(option, default = "3")]
    repeats: usize,
}

fn synthetic_image(size: ImageSize) -> Result<Image<u8, 4>, flou::image::ImageError> {
    let mut data = Vec::with_capacity(size.area() * 4);
    for y in 0..size.height {
        for x in 0..size.width {
            data.extend_from_slice(&[
                (x % 256) as u8,
                (y % 256) as u8,
                ((x ^ y) % 256) as u8,
                255,
            ]);
        }
    }
    Image::new(size, data)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let image = match &args.input {
        Some(path) => functional::read_image_any_rgba8(path)?,
        None => synthetic_image(ImageSize {
            width: args.width,
            height: args.height,
        })?,
    };
    let kernel = kernels::gaussian_kernel_2d(args.kernel_size, args.sigma)?;

    let num_cpus = std::thread::available_parallelism().map_or(1, |n| n.get());
    let mut strategies = vec![ExecutionStrategy::Serial, ExecutionStrategy::ParallelRows];
    strategies.extend(
        [2, 4, num_cpus]
            .into_iter()
            .filter(|&n| n <= num_cpus)
            .map(ExecutionStrategy::Fixed),
    );
    strategies.dedup();

    println!(
        "image {} kernel {} sigma {}",
        image.size(),
        args.kernel_size,
        args.sigma
    );

    let mut reference = None;
    for strategy in strategies {
        for run in 0..args.repeats {
            let (blurred, report) =
                perf::measure(|| filter2d_with(&image, &kernel, BorderMode::Skip, strategy));
            let blurred = blurred?;

            // every strategy must produce the same raster
            if let Some(expected) = &reference {
                if *expected != blurred {
                    log::error!("strategy {strategy} produced a different raster");
                    return Err(format!("strategy {strategy} diverged").into());
                }
            } else {
                reference = Some(blurred);
            }

            println!("{strategy} run {run}: {report}");
        }
    }

    Ok(())
}
