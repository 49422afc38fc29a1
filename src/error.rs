use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("not found")]
    NotFound,
    #[error("invalid invite code")]
    InvalidInviteCode,
    #[error("not a member of the team")]
    NotTeamMember,
    #[error("invalid status transition")]
    InvalidTransition,
    #[error("request already reviewed")]
    AlreadyReviewed,
    #[error("approval requires an assignee")]
    MissingAssignee,
    #[error("could not allocate a unique invite code")]
    CodeSpaceExhausted,
    #[error("username already taken")]
    DuplicateUsername,
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),

    // infra
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl CoreError {
    fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidInviteCode => "INVALID_INVITE_CODE",
            Self::NotTeamMember => "NOT_TEAM_MEMBER",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::AlreadyReviewed => "ALREADY_REVIEWED",
            Self::MissingAssignee => "MISSING_ASSIGNEE",
            Self::CodeSpaceExhausted => "CODE_SPACE_EXHAUSTED",
            Self::DuplicateUsername => "DUPLICATE_USERNAME",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Store(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for CoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::InvalidInviteCode => StatusCode::NOT_FOUND,
            Self::NotTeamMember | Self::MissingAssignee | Self::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidTransition | Self::AlreadyReviewed | Self::DuplicateUsername => {
                StatusCode::CONFLICT
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::CodeSpaceExhausted | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        })
    }
}
