use std::collections::HashMap;

use axum::extract::Multipart;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use tracing::debug;

use crate::error::ApiError;

/// MIME types accepted for images.
pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png", "image/gif", "image/webp"];

const MB: usize = 1024 * 1024;

/// Avatars: 5 MB, images only.
pub const AVATAR_LIMITS: UploadLimits = UploadLimits { max_mb: 5 };
/// Post images and caption requests: 10 MB, images only.
pub const IMAGE_LIMITS: UploadLimits = UploadLimits { max_mb: 10 };

#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_mb: usize,
}

impl UploadLimits {
    fn max_bytes(&self) -> usize {
        self.max_mb * MB
    }
}

pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A parsed multipart form: at most one file plus its text fields.
#[derive(Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub fields: HashMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File size too large. Maximum size is {0}MB.")]
    TooLarge(usize),

    #[error("Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed.")]
    InvalidType,

    #[error("Upload error: {0}")]
    Malformed(String),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// Read a form carrying one image in `file_field`.
///
/// A request that is not multipart at all yields an empty form, so the
/// handler can answer with its own "no file" message.
pub async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
    file_field: &str,
    limits: UploadLimits,
) -> Result<UploadForm, UploadError> {
    let mut multipart = match multipart {
        Ok(m) => m,
        Err(rejection) => {
            debug!("Not a multipart request: {}", rejection);
            return Ok(UploadForm::default());
        }
    };

    let mut form = UploadForm::default();
    let malformed = |e: MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge(limits.max_mb)
        } else {
            UploadError::Malformed(e.body_text())
        }
    };

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();

        if field.file_name().is_none() {
            let value = field.text().await.map_err(malformed)?;
            form.fields.insert(name, value);
            continue;
        }

        if name != file_field || form.file.is_some() {
            return Err(UploadError::Malformed("Unexpected field".into()));
        }

        let content_type = field.content_type().unwrap_or_default().to_ascii_lowercase();
        if !IMAGE_TYPES.contains(&content_type.as_str()) {
            return Err(UploadError::InvalidType);
        }

        let file_name = field.file_name().map(str::to_string);
        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(malformed)? {
            if bytes.len() + chunk.len() > limits.max_bytes() {
                return Err(UploadError::TooLarge(limits.max_mb));
            }
            bytes.extend_from_slice(&chunk);
        }

        form.file = Some(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }

    Ok(form)
}
