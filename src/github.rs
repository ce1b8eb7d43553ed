use std::time::Duration;

use actix_web::http::{StatusCode, header::USER_AGENT};
use log::debug;

use crate::config::GithubConfig;

/// Upper bound for the repository listing we pass through.
const REPOS_BODY_LIMIT: usize = 1024 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum GithubError {
    #[error("github request failed: {0}")]
    Request(String),
    #[error("github sent an unreadable body: {0}")]
    Body(String),
}

/// Read-only client for a user's public repositories.
pub struct GithubClient {
    api_url: String,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Self {
        let credentials = match (&config.client_id, &config.client_secret) {
            (Some(id), Some(secret)) if !id.is_empty() => Some((id.clone(), secret.clone())),
            _ => None,
        };
        Self {
            api_url: config.api_url.trim_end_matches('/').to_string(),
            credentials,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn repos_url(&self, username: &str) -> String {
        format!("{}/users/{}/repos?per_page=5&sort=created:asc", self.api_url, username)
    }

    /// The five oldest-created repositories of `username`, as GitHub sent
    /// them, or `None` when GitHub does not answer 200 or the name cannot
    /// be a GitHub login.
    pub async fn recent_repos(&self, username: &str) -> Result<Option<serde_json::Value>, GithubError> {
        if !is_valid_username(username) {
            return Ok(None);
        }
        let client = awc::Client::builder().timeout(self.timeout).finish();
        let mut request = client.get(self.repos_url(username))
            .insert_header((USER_AGENT, concat!("devconnector/", env!("CARGO_PKG_VERSION"))));
        if let Some((id, secret)) = &self.credentials {
            request = request.basic_auth(id, secret);
        }
        let mut response = request.send().await
            .map_err(|e| GithubError::Request(e.to_string()))?;
        if response.status() != StatusCode::OK {
            debug!("github answered {} for {}", response.status(), username);
            return Ok(None);
        }
        let repos = response.json::<serde_json::Value>()
            .limit(REPOS_BODY_LIMIT)
            .await
            .map_err(|e| GithubError::Body(e.to_string()))?;
        Ok(Some(repos))
    }
}

/// GitHub logins: 1 to 39 alphanumerics or single hyphens, no hyphen at
/// either end.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= 39
        && !username.starts_with('-')
        && !username.ends_with('-')
        && !username.contains("--")
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}
