use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use rag_engine::{ContractTerms, ErrorResponse, ExtractionEngine};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// `POST /upload-pdf`: accept one multipart field named `file`, spool it to
/// a temporary file, and run the contract-terms extraction pipeline on it.
///
/// The spool file is removed when it goes out of scope, on success and on
/// every error path alike.
pub async fn upload_pdf(
    State(engine): State<Arc<ExtractionEngine>>,
    mut multipart: Multipart,
) -> Result<Json<ContractTerms>, ApiError> {
    let mut upload = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("").to_string();
        if filename.is_empty() {
            return Err(bad_request("No selected file"));
        }
        if !allowed_file(&filename) {
            return Err(bad_request("Invalid file type"));
        }

        let data = field.bytes().await.map_err(bad_multipart)?;
        upload = Some((filename, data));
        break;
    }

    let Some((filename, data)) = upload else {
        return Err(bad_request("No file part"));
    };

    let mut spool = NamedTempFile::new().map_err(internal_error)?;
    spool.write_all(&data).map_err(internal_error)?;

    log::info!("Extracting contract terms from {} ({} bytes)", filename, data.len());

    let terms = engine.extract(spool.path()).await.map_err(internal_error)?;
    Ok(Json(terms))
}

/// Only the `.pdf` extension is accepted, case-insensitively. No content
/// sniffing happens beyond this.
fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| extension.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn internal_error<E: std::fmt::Display>(err: E) -> ApiError {
    log::error!("extraction pipeline failed: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "internal server error".to_string(),
        }),
    )
}
