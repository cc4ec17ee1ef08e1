mod config;
mod upload;

use std::path::PathBuf;

use argh::FromArgs;

use config::ServeConfig;

#[derive(FromArgs)]
/// Serve an upload endpoint that blurs the received images.
struct Args {
    /// path to a JSON configuration file
    #[argh(option)]
    config: Option<PathBuf>,

    /// address to bind, e.g. 0.0.0.0
    #[argh(option)]
    host: Option<String>,

    /// port to listen on
    #[argh(option, short = 'p')]
    port: Option<u16>,

    /// directory where uploads and blurred images are written
    #[argh(option)]
    upload_dir: Option<PathBuf>,

    /// maximum accepted request body, in bytes
    #[argh(option)]
    max_upload_bytes: Option<usize>,

    /// default side length of the gaussian kernel
    #[argh(option)]
    kernel_size: Option<usize>,

    /// largest kernel side accepted from a request
    #[argh(option)]
    max_kernel_size: Option<usize>,

    /// default sigma of the gaussian kernel
    #[argh(option)]
    sigma: Option<f64>,

    /// quality of the written JPEG files
    #[argh(option)]
    jpeg_quality: Option<u8>,
}

impl Args {
    fn into_config(self) -> Result<ServeConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServeConfig::from_json_file(path)?,
            None => ServeConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(upload_dir) = self.upload_dir {
            config.upload_dir = upload_dir;
        }
        if let Some(max_upload_bytes) = self.max_upload_bytes {
            config.max_upload_bytes = max_upload_bytes;
        }
        if let Some(kernel_size) = self.kernel_size {
            config.kernel_size = kernel_size;
        }
        if let Some(max_kernel_size) = self.max_kernel_size {
            config.max_kernel_size = max_kernel_size;
        }
        if let Some(sigma) = self.sigma {
            config.sigma = sigma;
        }
        if let Some(jpeg_quality) = self.jpeg_quality {
            config.jpeg_quality = jpeg_quality;
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = argh::from_env::<Args>().into_config()?;
    let address = config.address();

    log::info!("🚀 Starting the server");
    log::info!("🔥 Listening on: http://{address}");
    log::info!(
        "📁 Writing uploads to {} (kernel {}, sigma {})",
        config.upload_dir.display(),
        config.kernel_size,
        config.sigma
    );
    log::info!("🔧 Press Ctrl+C to stop the server");

    let app = upload::router(config);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
