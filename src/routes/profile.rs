use std::sync::Mutex;

use actix_web::{delete, get, post, put, web::{Data, Json, Path}, HttpResponse};
use log::debug;

use crate::{
    auth::AuthUser,
    data::{build_update_document, Collection, EducationFields, EntryID, ExperienceFields, NewEntry, Owner, Profile, ProfileFields, UserID},
    db::DB,
    error::{ApiError, Message, NO_PROFILE},
    validation,
};

use super::lock;

/// The profile with its owner's name and avatar filled in.
fn populate(db: &DB, profile: &Profile) -> Result<serde_json::Value, ApiError> {
    match db.get_user(&profile.user) {
        Some(user) => Ok(profile.populated(Owner::new(&profile.user, user))?),
        None => Ok(serde_json::to_value(profile)?),
    }
}

#[get("/api/profile/me")]
pub async fn my_profile(db: Data<Mutex<DB>>, session: AuthUser) -> Result<HttpResponse, ApiError> {
    let db = lock(&db)?;
    let Some(profile) = db.get_profile(&session.user) else {
        return Err(ApiError::NotFound(NO_PROFILE));
    };
    Ok(HttpResponse::Ok().json(populate(&db, profile)?))
}

#[post("/api/profile")]
pub async fn upsert_profile(db: Data<Mutex<DB>>, session: AuthUser, Json(fields): Json<ProfileFields>) -> Result<HttpResponse, ApiError> {
    validation::profile(&fields)?;
    let update = build_update_document(fields);
    let profile = lock(&db)?.upsert_profile(&session.user, update)?;
    Ok(HttpResponse::Ok().json(profile))
}

#[get("/api/profile")]
pub async fn all_profiles(db: Data<Mutex<DB>>) -> Result<HttpResponse, ApiError> {
    let db = lock(&db)?;
    let profiles = db.profiles().into_iter()
        .map(|profile| populate(&db, profile))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(HttpResponse::Ok().json(profiles))
}

#[get("/api/profile/user/{user_id}")]
pub async fn profile_by_user(db: Data<Mutex<DB>>, user_id: Path<String>) -> Result<HttpResponse, ApiError> {
    let db = lock(&db)?;
    let Some(profile) = db.get_profile(&UserID(user_id.into_inner())) else {
        return Err(ApiError::NotFound("Profile not found"));
    };
    Ok(HttpResponse::Ok().json(populate(&db, profile)?))
}

#[delete("/api/profile")]
pub async fn delete_account(db: Data<Mutex<DB>>, session: AuthUser) -> Result<HttpResponse, ApiError> {
    lock(&db)?.delete_account(&session.user)?;
    Ok(HttpResponse::Ok().json(Message { msg: "User deleted" }))
}

#[put("/api/profile/experience")]
pub async fn add_experience(db: Data<Mutex<DB>>, session: AuthUser, Json(fields): Json<ExperienceFields>) -> Result<HttpResponse, ApiError> {
    let entry = validation::experience(fields)?;
    let profile = lock(&db)?.add_entry(&session.user, NewEntry::Experience(entry))?;
    Ok(HttpResponse::Ok().json(profile))
}

#[delete("/api/profile/experience/{exp_id}")]
pub async fn remove_experience(db: Data<Mutex<DB>>, session: AuthUser, exp_id: Path<String>) -> Result<HttpResponse, ApiError> {
    let id = EntryID(exp_id.into_inner());
    let removal = lock(&db)?.remove_entry(&session.user, Collection::Experience, &id)?;
    if removal.removed {
        debug!("experience {} removed from {}", id.0, session.user.0);
    }
    Ok(HttpResponse::Ok().json(removal.profile))
}

#[put("/api/profile/education")]
pub async fn add_education(db: Data<Mutex<DB>>, session: AuthUser, Json(fields): Json<EducationFields>) -> Result<HttpResponse, ApiError> {
    let entry = validation::education(fields)?;
    let profile = lock(&db)?.add_entry(&session.user, NewEntry::Education(entry))?;
    Ok(HttpResponse::Ok().json(profile))
}

#[delete("/api/profile/education/{edu_id}")]
pub async fn remove_education(db: Data<Mutex<DB>>, session: AuthUser, edu_id: Path<String>) -> Result<HttpResponse, ApiError> {
    let id = EntryID(edu_id.into_inner());
    let removal = lock(&db)?.remove_entry(&session.user, Collection::Education, &id)?;
    if removal.removed {
        debug!("education {} removed from {}", id.0, session.user.0);
    }
    Ok(HttpResponse::Ok().json(removal.profile))
}
