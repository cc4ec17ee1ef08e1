use std::path::PathBuf;

use argh::FromArgs;

use flou::{
    imgproc::{
        filter::{gaussian_blur_with, BorderMode},
        parallel::ExecutionStrategy,
    },
    io::{functional, jpeg, perf, png},
};

#[derive(FromArgs)]
/// Blur an image with a gaussian kernel
struct Args {
    /// path to the input image
    #[argh(option, short = 'i')]
    input: PathBuf,

    /// path to the output image, JPEG unless it ends with .png
    #[argh(option, short = 'o', default = "PathBuf::from(\"blurred.jpg\")")]
    output: PathBuf,

    /// the side length of the gaussian kernel
    #[argh(option, default = "10")]
    kernel_size: usize,

    /// the sigma of the gaussian kernel
    #[argh(option, default = "5.0")]
    sigma: f64,

    /// how rows are scheduled: serial, rows or fixed:<n>
    #[argh(option, default = "String::from(\"rows\")")]
    strategy: String,

    /// run on a dedicated pool with this many threads
    #[argh(option)]
    num_threads: Option<usize>,

    /// divide border pixels by the in-bounds kernel weight
    #[argh(switch)]
    renormalize: bool,

    /// the quality of the JPEG output
    #[argh(option, default = "jpeg::DEFAULT_JPEG_QUALITY")]
    quality: u8,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let strategy = match args.num_threads {
        Some(n) => ExecutionStrategy::Fixed(n),
        None => args.strategy.parse::<ExecutionStrategy>()?,
    };
    let border = if args.renormalize {
        BorderMode::Renormalize
    } else {
        BorderMode::Skip
    };

    let image = functional::read_image_any_rgba8(&args.input)?;
    log::info!("read {} with {}", args.input.display(), image.size());

    let (blurred, report) = perf::measure(|| {
        gaussian_blur_with(&image, args.kernel_size, args.sigma, border, strategy)
    });
    let blurred = blurred?;
    log::info!("blurred with strategy {strategy}: {report}");

    let is_png = args
        .output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if is_png {
        png::write_image_png_rgba8(&args.output, &blurred)?;
    } else {
        jpeg::write_image_jpeg_rgba8(&args.output, &blurred, args.quality)?;
    }

    log::info!("saved blurred image to {}", args.output.display());

    Ok(())
}
