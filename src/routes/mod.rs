use std::sync::{Mutex, MutexGuard};

use actix_web::{error::JsonPayloadError, get, web::{self, Data, JsonConfig, ServiceConfig}, http::Method, HttpRequest, HttpResponse};
use log::debug;

use crate::{db::DB, error::{ApiError, Message}, validation::ValidationErrors};

mod auth;
mod github;
mod profile;
mod users;

pub use auth::*;
pub use github::*;
pub use profile::*;
pub use users::*;

pub(crate) fn lock(db: &Data<Mutex<DB>>) -> Result<MutexGuard<'_, DB>, ApiError> {
    db.lock().map_err(|_| ApiError::Internal("store lock poisoned"))
}

#[get("/")]
pub async fn index() -> &'static str {
    "API Running"
}

async fn default_handler(method: Method) -> HttpResponse {
    match method {
        Method::GET => HttpResponse::NotFound().json(Message { msg: "Not found" }),
        _ => HttpResponse::MethodNotAllowed().finish(),
    }
}

pub const INVALID_BODY: &str = "Request body must be a JSON object of string fields";

/// Bodies that fail to deserialize get the same `{"errors": [...]}` answer
/// as any other rejected input. Parser detail only goes to the log.
fn invalid_body(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("rejected body for {} {}: {}", req.method(), req.path(), err);
    ApiError::Validation(ValidationErrors::single(INVALID_BODY)).into()
}

/// Registers every route of the API.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg
        .app_data(JsonConfig::default().error_handler(invalid_body))

        .service(index)

        .service(register_user)
        .service(current_user)
        .service(login)

        .service(my_profile)
        .service(all_profiles)
        .service(profile_by_user)
        .service(upsert_profile)
        .service(delete_account)

        .service(add_experience)
        .service(remove_experience)
        .service(add_education)
        .service(remove_education)

        .service(github_repos)
        .default_service(web::to(default_handler));
}
