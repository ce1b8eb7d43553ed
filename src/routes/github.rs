use actix_web::{get, web::{Data, Path}, HttpResponse};

use crate::{error::ApiError, github::GithubClient};

#[get("/api/profile/github/{username}")]
pub async fn github_repos(github: Data<GithubClient>, username: Path<String>) -> Result<HttpResponse, ApiError> {
    match github.recent_repos(&username).await? {
        Some(repos) => Ok(HttpResponse::Ok().json(repos)),
        None => Err(ApiError::GithubNotFound),
    }
}
