use std::future::{ready, Ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header::AUTHORIZATION, web::Data};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Digest};

use crate::{config::AuthConfig, data::UserID, db::{DB, StoreError}, error::ApiError};

pub const TOKEN_HEADER: &str = "x-auth-token";

/// Signs and checks access tokens. Holds no per-user state.
pub struct Auth {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_lifetime: Duration,
}

#[derive(Debug, Clone)]
pub struct PasswordStore {
    pub salt: String,
    pub hashed: String,
}

#[derive(thiserror::Error, Debug)]
pub enum LoginError {
    #[error("Invalid credentials")]
    WrongCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(thiserror::Error, Debug)]
pub enum SignupError {
    #[error("User already exists")]
    AlreadyExists,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenUser {
    id: UserID,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user: TokenUser,
    iat: i64,
    exp: i64,
}

impl Auth {
    pub fn init(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            token_lifetime: Duration::seconds(config.token_lifetime_secs as i64),
        }
    }

    fn hash(password: &str, salt: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(password.to_string() + salt);
        hex::encode(hasher.finalize())
    }

    fn secure_password(password: &str) -> PasswordStore {
        let salt = Alphanumeric.sample_string(&mut rand::thread_rng(), 16);
        let hashed = Self::hash(password, &salt);
        PasswordStore { salt, hashed }
    }

    fn match_password(store: &PasswordStore, password: &str) -> bool {
        Self::hash(password, &store.salt) == store.hashed
    }

    pub fn signup(&self, name: &str, email: &str, password: &str, db: &mut DB) -> Result<UserID, SignupError> {
        if db.find_user_by_email(email).is_some() {
            return Err(SignupError::AlreadyExists);
        }
        let password_store = Self::secure_password(password);
        Ok(db.create_new_user(name, email, gravatar_url(email), &password_store)?)
    }

    pub fn login(&self, email: &str, password: &str, db: &DB) -> Result<UserID, LoginError> {
        let Some((id, _)) = db.find_user_by_email(email) else {
            return Err(LoginError::WrongCredentials);
        };
        match db.password_store(id)? {
            Some(store) if Self::match_password(&store, password) => Ok(id.clone()),
            _ => Err(LoginError::WrongCredentials),
        }
    }

    pub fn issue_token(&self, user: &UserID) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            user: TokenUser { id: user.clone() },
            iat: now.timestamp(),
            exp: (now + self.token_lifetime).timestamp(),
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
    }

    pub fn verify_token(&self, token: &str) -> Option<UserID> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .ok()
            .map(|data| data.claims.user.id)
    }
}

/// Gravatar image for an address: 200px, PG rated, "mystery person" fallback.
pub fn gravatar_url(email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.trim().to_lowercase());
    format!("https://www.gravatar.com/avatar/{}?s=200&r=pg&d=mm", hex::encode(hasher.finalize()))
}

/// The user a request's access token was issued to.
pub struct AuthUser {
    pub user: UserID,
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    if let Some(token) = req.headers().get(TOKEN_HEADER) {
        return token.to_str().ok().map(str::to_string);
    }
    req.headers().get(AUTHORIZATION)
        .and_then(|x| x.to_str().ok())
        .and_then(|x| x.strip_prefix("Bearer "))
        .map(|x| x.trim().to_string())
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let Some(token) = bearer_token(req).filter(|x| !x.is_empty()) else {
            return ready(Err(ApiError::Unauthorized("No token, authorization denied")));
        };
        let Some(auth) = req.app_data::<Data<Auth>>() else {
            return ready(Err(ApiError::Internal("auth is not configured")));
        };
        ready(
            auth.verify_token(&token)
                .map(|user| AuthUser { user })
                .ok_or(ApiError::Unauthorized("Token is not valid"))
        )
    }
}
