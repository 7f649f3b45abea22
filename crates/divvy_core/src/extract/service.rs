//! Vision extraction service boundary.
//!
//! # Responsibility
//! - Define the request contract handed to extraction adapters.
//! - Define the error envelope adapters report back to core.
//!
//! # Invariants
//! - Requests carry a validated `data:image/` payload within size limits.
//! - Adapter failures always carry a stable `code` and a retryable flag.
//!
//! # See also
//! - docs/architecture/split-flow.md

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound for one encoded image payload.
pub const MAX_IMAGE_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Request construction failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionRequestError {
    /// No image payload was provided.
    MissingImage,
    /// Payload is not a `data:image/` URL.
    UnsupportedPayload,
    /// Payload exceeds `MAX_IMAGE_PAYLOAD_BYTES`.
    PayloadTooLarge { size: usize },
}

impl Display for ExtractionRequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingImage => write!(f, "no image provided"),
            Self::UnsupportedPayload => {
                write!(f, "image payload must be a data:image/ URL")
            }
            Self::PayloadTooLarge { size } => write!(
                f,
                "image payload of {size} bytes exceeds limit of {MAX_IMAGE_PAYLOAD_BYTES} bytes"
            ),
        }
    }
}

impl Error for ExtractionRequestError {}

/// One validated extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    image_data_url: String,
}

impl ExtractionRequest {
    /// Validates and wraps one base64 image data URL.
    ///
    /// # Errors
    /// - `MissingImage` for empty input.
    /// - `UnsupportedPayload` for non-image data URLs.
    /// - `PayloadTooLarge` beyond the encoded size limit.
    pub fn new(image_data_url: impl Into<String>) -> Result<Self, ExtractionRequestError> {
        let image_data_url = image_data_url.into();
        if image_data_url.trim().is_empty() {
            return Err(ExtractionRequestError::MissingImage);
        }
        if !image_data_url.starts_with("data:image/") {
            return Err(ExtractionRequestError::UnsupportedPayload);
        }
        if image_data_url.len() > MAX_IMAGE_PAYLOAD_BYTES {
            return Err(ExtractionRequestError::PayloadTooLarge {
                size: image_data_url.len(),
            });
        }
        Ok(Self { image_data_url })
    }

    pub fn image_data_url(&self) -> &str {
        &self.image_data_url
    }
}

pub type ExtractionResult<T> = Result<T, ExtractionErrorEnvelope>;

/// Adapter failure report.
///
/// Established codes: `invalid_api_key` (not retryable), `quota_exceeded`
/// (retryable) and `extraction_failed` (not retryable). Adapters may add
/// codes; callers must treat unknown codes as not retryable unless the
/// flag says otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionErrorEnvelope {
    /// Adapter that produced the failure.
    pub service: String,
    /// Stable machine-readable failure code.
    pub code: String,
    /// Human-readable failure summary.
    pub message: String,
    /// Whether retrying the same request may succeed.
    pub retryable: bool,
}

impl ExtractionErrorEnvelope {
    pub fn new(
        service: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        retryable: bool,
    ) -> Self {
        Self {
            service: service.into(),
            code: code.into(),
            message: message.into(),
            retryable,
        }
    }
}

impl Display for ExtractionErrorEnvelope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "extraction via `{}` failed [{}]: {}",
            self.service, self.code, self.message
        )
    }
}

impl Error for ExtractionErrorEnvelope {}

/// Synchronous extraction adapter interface.
///
/// Adapters own transport, credentials and upstream error mapping; core
/// receives either the raw JSON body or an error envelope.
pub trait ExtractionService {
    /// Stable adapter identifier used in logs.
    fn service_id(&self) -> &str;

    /// Sends one image and returns the raw JSON response body.
    fn extract(&self, request: &ExtractionRequest) -> ExtractionResult<String>;
}
