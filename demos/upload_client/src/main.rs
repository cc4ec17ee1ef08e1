use std::path::PathBuf;

use argh::FromArgs;
use reqwest::{
    blocking::{multipart::Form, Client},
    Url,
};

#[derive(FromArgs)]
/// Upload an image to a running flou-serve instance
struct Args {
    /// path to the image to upload
    #[argh(option, short = 'i', default = "PathBuf::from(\"test.jpg\")")]
    input: PathBuf,

    /// the upload endpoint
    #[argh(option, default = "String::from(\"http://localhost:8080/upload\")")]
    url: String,

    /// override the server's kernel size
    #[argh(option)]
    kernel_size: Option<usize>,

    /// override the server's sigma
    #[argh(option)]
    sigma: Option<f64>,
}

fn upload_url(
    base: &str,
    kernel_size: Option<usize>,
    sigma: Option<f64>,
) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base)?;
    if let Some(kernel_size) = kernel_size {
        url.query_pairs_mut()
            .append_pair("kernel_size", &kernel_size.to_string());
    }
    if let Some(sigma) = sigma {
        url.query_pairs_mut().append_pair("sigma", &sigma.to_string());
    }
    Ok(url)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let url = upload_url(&args.url, args.kernel_size, args.sigma)?;
    let form = Form::new().file("image", &args.input)?;

    log::info!("uploading {} to {url}", args.input.display());
    let response = Client::new().post(url).multipart(form).send()?;

    let status = response.status();
    let body = response.text()?;
    log::info!("status: {status}");
    log::info!("server response: {body}");

    if !status.is_success() {
        return Err(format!("upload failed with {status}: {body}").into());
    }

    Ok(())
}
