use std::sync::Mutex;

use actix_web::{post, web::{Data, Json}, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::{auth::Auth, data::present, db::DB, error::ApiError, validation::{Check, PASSWORD_MIN_LEN}};

use super::lock;

#[derive(Deserialize)]
pub struct Register {
    #[serde(default, deserialize_with = "present")]
    name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    password: Option<String>,
}

#[derive(Serialize)]
pub struct Token {
    pub token: String,
}

#[post("/api/users")]
pub async fn register_user(auth: Data<Auth>, db: Data<Mutex<DB>>, Json(form): Json<Register>) -> Result<HttpResponse, ApiError> {
    let mut check = Check::new();
    let name = check.required("name", &form.name, "Name is required");
    let email = check.email("email", &form.email, "Please include a valid email");
    let password = check.min_len("password", &form.password, PASSWORD_MIN_LEN, "Please enter a password with 6 or more characters");
    check.finish()?;

    let mut db = lock(&db)?;
    let user = auth.signup(name, email, password, &mut db)?;
    let token = auth.issue_token(&user)?;
    Ok(HttpResponse::Ok().json(Token { token }))
}
