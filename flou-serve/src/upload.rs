use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use flou::{
    imgproc::filter::{filter2d, kernels::gaussian_kernel_2d, FilterError},
    io::{functional::decode_image_any_rgba8, jpeg::write_image_jpeg_rgba8, IoError},
};

use crate::config::{BlurQuery, ServeConfig};

const IMAGE_FIELD: &str = "image";

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("missing form field `image`")]
    MissingField,

    #[error("kernel size {size} exceeds the limit of {max}")]
    KernelTooLarge { size: usize, max: usize },

    #[error("invalid blur parameters: {0}")]
    InvalidParameters(FilterError),

    #[error("blur failed: {0}")]
    Filter(FilterError),

    #[error(transparent)]
    Codec(#[from] IoError),

    #[error("file system error: {0}")]
    File(#[from] std::io::Error),

    #[error("blur task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl UploadError {
    fn status(&self) -> StatusCode {
        match self {
            UploadError::Multipart(e) => e.status(),
            UploadError::MissingField
            | UploadError::KernelTooLarge { .. }
            | UploadError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
            UploadError::Filter(_)
            | UploadError::Codec(_)
            | UploadError::File(_)
            | UploadError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status();
        log::error!("upload failed ({status}): {self}");
        (status, self.to_string()).into_response()
    }
}

/// Builds the service routes around a shared configuration.
pub fn router(config: ServeConfig) -> Router {
    let body_limit = config.max_upload_bytes;
    Router::new()
        .route("/", get(|| async { "flou: POST an image to /upload" }))
        .route("/upload", post(upload_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(Arc::new(config))
}

/// Saves the uploaded `image` field, blurs it and writes `blurred_<stem>.jpg`
/// next to it. Answers only once the blurred file is on disk.
pub async fn upload_image(
    State(config): State<Arc<ServeConfig>>,
    Query(query): Query<BlurQuery>,
    mut multipart: Multipart,
) -> Result<String, UploadError> {
    let (kernel_size, sigma) = query.resolve(&config);
    if kernel_size > config.max_kernel_size {
        return Err(UploadError::KernelTooLarge {
            size: kernel_size,
            max: config.max_kernel_size,
        });
    }
    let kernel = gaussian_kernel_2d(kernel_size, sigma).map_err(UploadError::InvalidParameters)?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let file_name = sanitize_file_name(field.file_name().unwrap_or_default());
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }
    let (file_name, bytes) = upload.ok_or(UploadError::MissingField)?;
    log::info!("received {file_name} ({} bytes)", bytes.len());

    tokio::fs::create_dir_all(&config.upload_dir).await?;
    let saved_path = config.upload_dir.join(&file_name);
    tokio::fs::write(&saved_path, &bytes).await?;
    log::info!("saved upload to {}", saved_path.display());

    let output_path = config.upload_dir.join(blurred_file_name(&file_name));
    let quality = config.jpeg_quality;
    let target = output_path.clone();
    tokio::task::spawn_blocking(move || -> Result<(), UploadError> {
        let src = decode_image_any_rgba8(&bytes)?;
        let dst = filter2d(&src, &kernel).map_err(UploadError::Filter)?;
        write_image_jpeg_rgba8(&target, &dst, quality)?;
        Ok(())
    })
    .await??;

    log::info!(
        "blurred {file_name} with kernel {kernel_size} sigma {sigma} into {}",
        output_path.display()
    );
    Ok(format!("blurred image saved to {}", output_path.display()))
}

/// Keeps only the last path component of a client supplied file name.
fn sanitize_file_name(raw: &str) -> String {
    match raw.rsplit(['/', '\\']).next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => name.to_string(),
        _ => "upload".to_string(),
    }
}

fn blurred_file_name(file_name: &str) -> PathBuf {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    PathBuf::from(format!("blurred_{stem}.jpg"))
}
