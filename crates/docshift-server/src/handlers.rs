//! HTTP request handlers

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use docshift_core::{policy, suggested_file_name, Format, HealthStatus};
use tracing::{debug, error, info, warn};

use crate::office::{run_conversion, OfficeInput};
use crate::types::{ApiError, HealthDetails, HealthResponse};
use crate::AppState;

/// Document converted by the health probe
pub const HEALTH_CHECK_INPUT: &[u8] = b"health check";

/// Fields of a `POST /convert` form
#[derive(Debug, Default)]
struct ConvertForm {
    file: Option<(String, Vec<u8>)>,
    source_ext: Option<String>,
    target_ext: Option<String>,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::new(StatusCode::PAYLOAD_TOO_LARGE, "Upload exceeds the server size limit")
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", err.body_text()))
    }
}

async fn read_form(multipart: &mut Multipart) -> Result<ConvertForm, ApiError> {
    let mut form = ConvertForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.file = Some((file_name, bytes.to_vec()));
            }
            "sourceExt" => form.source_ext = Some(field.text().await.map_err(multipart_error)?),
            "targetExt" => form.target_ext = Some(field.text().await.map_err(multipart_error)?),
            other => debug!("Ignoring multipart field {other:?}"),
        }
    }
    Ok(form)
}

fn unsupported(raw: &str) -> ApiError {
    ApiError::bad_request(format!("Unsupported format: {raw:?}"))
        .with_hint("Supported formats: pdf, docx, txt, rtf, odt")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Convert an uploaded document with the office suite
///
/// Multipart fields: `file`, `targetExt` and optionally `sourceExt` (defaults
/// to the uploaded file's extension).
pub async fn convert(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_form(&mut multipart).await?;

    let Some((file_name, bytes)) = form.file else {
        return Err(ApiError::bad_request("No file uploaded")
            .with_hint("Send the document in a multipart field named \"file\""));
    };

    let Some(raw_target) = non_blank(form.target_ext.as_deref()) else {
        return Err(ApiError::bad_request("Missing target format").with_hint("Send targetExt"));
    };
    let target = Format::from_extension(raw_target).ok_or_else(|| unsupported(raw_target))?;

    let source = match non_blank(form.source_ext.as_deref()) {
        Some(raw) => Format::from_extension(raw).ok_or_else(|| unsupported(raw))?,
        None => Format::from_file_name(&file_name).ok_or_else(|| {
            ApiError::bad_request(format!("Cannot determine the format of {file_name:?}"))
                .with_hint("Send sourceExt or a file name with a supported extension")
        })?,
    };

    if source == target {
        return Err(ApiError::bad_request(format!(
            "Source and target formats are both {source}"
        )));
    }
    if policy::is_server_blocked(source, target) {
        warn!("Rejected blocked server conversion {source} -> {target}");
        return Err(ApiError::bad_request(format!(
            "{source} to {target} is not available on the server"
        ))
        .with_hint("Convert in client mode instead"));
    }

    info!(
        "Converting {file_name:?} ({} bytes) from {source} to {target}",
        bytes.len()
    );
    let input = OfficeInput {
        file_name: &file_name,
        source_ext: source.extension(),
        bytes: &bytes,
    };
    let output = run_conversion(state.office.as_ref(), input, target.extension(), &state.options)
        .await
        .map_err(|err| {
            error!("Conversion of {file_name:?} to {target} failed: {err}");
            ApiError::from(err)
        })?;

    let download = suggested_file_name(&file_name, target).replace('"', "_");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, target.mime_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{download}\""),
            ),
        ],
        output.bytes,
    )
        .into_response())
}

/// Liveness probe: convert a tiny text document to PDF
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let input = OfficeInput {
        file_name: "health-check.txt",
        source_ext: Format::Txt.extension(),
        bytes: HEALTH_CHECK_INPUT,
    };
    match run_conversion(
        state.office.as_ref(),
        input,
        Format::Pdf.extension(),
        &state.options,
    )
    .await
    {
        Ok(output) => (
            StatusCode::OK,
            Json(HealthResponse {
                ok: true,
                server: HealthStatus::available(),
                details: HealthDetails {
                    bin: Some(output.bin),
                },
            }),
        ),
        Err(err) => {
            warn!("Health check failed: {err}");
            let bin = err.bin().map(str::to_string);
            let message = std::iter::once(err.to_string())
                .chain(err.hints())
                .collect::<Vec<_>>()
                .join("; ");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    ok: false,
                    server: HealthStatus::unavailable(message),
                    details: HealthDetails { bin },
                }),
            )
        }
    }
}
