use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::error;
use serde::Serialize;

use crate::{auth::{LoginError, SignupError}, db::{ProfileError, StoreError}, github::GithubError, validation::ValidationErrors};

pub const NO_PROFILE: &str = "There is no profile for this user";

#[derive(Debug, Serialize)]
pub struct Message<'a> {
    pub msg: &'a str,
}

/// Everything a handler can fail with, mapped onto the response the
/// client sees. Server-side failures are logged and answered without detail.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("No Github profile found")]
    GithubNotFound,
    #[error("{0}")]
    Internal(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("cannot sign token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Github(#[from] GithubError),
    #[error("cannot encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::NotFound(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::GithubNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut response = HttpResponse::build(self.status_code());
        match self {
            ApiError::Validation(errors) => response.json(errors),
            ApiError::NotFound(msg) | ApiError::Unauthorized(msg) => response.json(Message { msg }),
            ApiError::GithubNotFound => response.json(Message { msg: "No Github profile found" }),
            _ => {
                error!("{}", self);
                response.body("Server Error")
            }
        }
    }
}

impl From<ProfileError> for ApiError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::NotFound => ApiError::NotFound(NO_PROFILE),
            ProfileError::Store(e) => ApiError::Store(e),
        }
    }
}

impl From<SignupError> for ApiError {
    fn from(e: SignupError) -> Self {
        match e {
            SignupError::AlreadyExists => ApiError::Validation(ValidationErrors::single("User already exists")),
            SignupError::Store(e) => ApiError::Store(e),
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::WrongCredentials => ApiError::Validation(ValidationErrors::single("Invalid credentials")),
            LoginError::Store(e) => ApiError::Store(e),
        }
    }
}
