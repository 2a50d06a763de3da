//! Error types for classification and the HTTP layer

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Most likely reason a sampling region produced too few usable pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShortfallCause {
    /// Mostly blown-out highlights
    Glare,
    /// Mostly deep shadow
    Shadow,
    /// Mostly bright, colorless pixels (white cup, paper, tiles)
    NeutralHighlight,
    /// The region itself holds too few pixels
    RegionTooSmall,
}

impl std::fmt::Display for ShortfallCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShortfallCause::Glare => write!(f, "glare"),
            ShortfallCause::Shadow => write!(f, "shadow"),
            ShortfallCause::NeutralHighlight => write!(f, "neutral highlight"),
            ShortfallCause::RegionTooSmall => write!(f, "region too small"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Not enough usable pixels ({usable} of {sampled}, need {required}): likely {cause}")]
    InsufficientSamples {
        usable: usize,
        sampled: usize,
        required: usize,
        cause: ShortfallCause,
    },
}

impl ClassifyError {
    /// Short hint suitable for showing to the person who took the photo
    pub fn user_message(&self) -> &'static str {
        match self {
            ClassifyError::Decode(_) => "Could not read the photo. Please try a JPEG or PNG image.",
            ClassifyError::InsufficientSamples { cause, .. } => match cause {
                ShortfallCause::Glare => {
                    "Too much glare in the target area. Avoid direct light or flash."
                }
                ShortfallCause::Shadow => "The target area is too dark. Try better light.",
                ShortfallCause::NeutralHighlight => {
                    "The target area looks colorless. Center the sample in the frame."
                }
                ShortfallCause::RegionTooSmall => {
                    "The target area is too small. Use a larger region size."
                }
            },
        }
    }
}

/// Machine-readable failure kind in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    BadRequest,
    Decode,
    InsufficientSamples,
    Internal,
}

/// JSON body returned for every failed request
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Always `false`
    pub ok: bool,
    pub reason: FailureReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<ShortfallCause>,
    pub message: String,
    pub hint: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Classification task failed: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, reason, cause, hint) = match &self {
            AppError::Classify(e) => match e {
                ClassifyError::Decode(_) => (
                    StatusCode::BAD_REQUEST,
                    FailureReason::Decode,
                    None,
                    e.user_message(),
                ),
                ClassifyError::InsufficientSamples { cause, .. } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    FailureReason::InsufficientSamples,
                    Some(*cause),
                    e.user_message(),
                ),
            },
            AppError::BadRequest(_) => (
                StatusCode::BAD_REQUEST,
                FailureReason::BadRequest,
                None,
                "Check the request parameters. region_size must be a non-negative integer.",
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                FailureReason::Internal,
                None,
                "Analysis failed. Please try again.",
            ),
        };

        let body = ErrorBody {
            ok: false,
            reason,
            cause,
            message: self.to_string(),
            hint: hint.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
