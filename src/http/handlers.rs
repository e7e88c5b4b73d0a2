//! Axum HTTP handlers for the web server
//!
//! Upload, retrieval and conversion of mesh files, plus a liveness probe.

use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

use crate::{errors::AppError, mesh::MeshFormat, storage::is_safe_filename, AppState};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub filename: String,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub message: &'static str,
    pub filename: String,
    pub original_format: String,
    pub new_format: String,
    pub download_url: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    // A body that is not multipart at all carries no file part.
    let Ok(mut multipart) = multipart else {
        return Err(AppError::validation("No file part"));
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        // A part without a filename parameter is a plain form value, not a file.
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if filename.is_empty() {
            return Err(AppError::validation("No selected file"));
        }
        if !is_safe_filename(&filename) {
            warn!(filename = %filename, "rejected upload with unsafe filename");
            return Err(AppError::validation("Invalid filename"));
        }

        let bytes = write_upload(&state, &filename, field).await?;
        info!(filename = %filename, bytes, "file uploaded");

        return Ok(Json(UploadResponse {
            message: "File uploaded",
            filename,
        }));
    }

    Err(AppError::validation("No file part"))
}

async fn write_upload(
    state: &AppState,
    filename: &str,
    mut field: Field<'_>,
) -> Result<u64, AppError> {
    let (path, mut file) = state
        .store
        .create_upload(filename)
        .await
        .map_err(|err| AppError::internal(format!("failed to create {filename}: {err}")))?;

    let mut total = 0u64;
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        total += chunk.len() as u64;
        file.write_all(&chunk)
            .await
            .map_err(|err| AppError::internal(format!("failed to write {filename}: {err}")))?;
    }
    file.flush()
        .await
        .map_err(|err| AppError::internal(format!("failed to write {filename}: {err}")))?;

    debug!(path = %path.display(), bytes = total, "upload stored");
    Ok(total)
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::validation(err.body_text())
    }
}

pub async fn get_model(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    let Some(path) = state.store.locate(&filename).await else {
        debug!(filename = %filename, "model not found");
        return Err(AppError::NotFound("File not found"));
    };

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|err| AppError::internal(format!("failed to open {filename}: {err}")))?;
    let length = file.metadata().await.ok().map(|metadata| metadata.len());
    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    let mut builder = axum::http::Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref());
    if let Some(length) = length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|err| AppError::internal(err.to_string()))
}

pub async fn convert(
    State(state): State<AppState>,
    Path((filename, target_format)): Path<(String, String)>,
) -> Result<Json<ConvertResponse>, AppError> {
    let new_format = target_format.to_ascii_lowercase();
    let Some(target) = MeshFormat::from_token(&new_format) else {
        return Err(AppError::validation("Target format not supported"));
    };

    let Some(source) = state.store.source(&filename).await else {
        return Err(AppError::NotFound("Source file not found"));
    };

    let mesh = state.converter.load(&source).await?;

    let stem = filename
        .rsplit_once('.')
        .map_or(filename.as_str(), |(stem, _)| stem);
    let new_filename = format!("{stem}.{target}");
    let target_path = state
        .store
        .converted_path(&new_filename)
        .ok_or_else(|| AppError::Conversion(format!("invalid output filename: {new_filename}")))?;

    state.converter.export(mesh, &target_path, target).await?;

    let original_format = filename
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_lowercase())
        .ok_or_else(|| {
            AppError::Conversion(format!("source filename has no extension: {filename}"))
        })?;

    info!(
        source = %filename,
        output = %new_filename,
        original_format = %original_format,
        new_format = %new_format,
        "file converted"
    );

    Ok(Json(ConvertResponse {
        message: "File converted successfully",
        download_url: state.config.download_url(&new_filename),
        filename: new_filename,
        original_format,
        new_format,
    }))
}
