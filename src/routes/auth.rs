use std::sync::Mutex;

use actix_web::{get, post, web::{Data, Json}, HttpResponse};
use serde::Deserialize;

use crate::{auth::{Auth, AuthUser}, data::{present, Account}, db::DB, error::ApiError, validation::Check};

use super::{lock, Token};

#[derive(Deserialize)]
pub struct Login {
    #[serde(default, deserialize_with = "present")]
    email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    password: Option<String>,
}

#[get("/api/auth")]
pub async fn current_user(db: Data<Mutex<DB>>, session: AuthUser) -> Result<HttpResponse, ApiError> {
    let db = lock(&db)?;
    let Some(user) = db.get_user(&session.user) else {
        return Err(ApiError::Unauthorized("Token is not valid"));
    };
    Ok(HttpResponse::Ok().json(Account { id: &session.user, user }))
}

#[post("/api/auth")]
pub async fn login(auth: Data<Auth>, db: Data<Mutex<DB>>, Json(form): Json<Login>) -> Result<HttpResponse, ApiError> {
    let mut check = Check::new();
    let email = check.email("email", &form.email, "Please include a valid email");
    let password = check.required("password", &form.password, "Password is required");
    check.finish()?;

    let db = lock(&db)?;
    let user = auth.login(email, password, &db)?;
    let token = auth.issue_token(&user)?;
    Ok(HttpResponse::Ok().json(Token { token }))
}
