use chrono::{DateTime, Utc};
use serde::Serialize;

use super::UserID;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub date: DateTime<Utc>,
}

/// The account as returned to its owner.
#[derive(Debug, Serialize)]
pub struct Account<'a> {
    #[serde(rename = "_id")]
    pub id: &'a UserID,
    #[serde(flatten)]
    pub user: &'a User,
}

/// The public part of a user, embedded into profiles on read.
#[derive(Debug, Serialize)]
pub struct Owner<'a> {
    #[serde(rename = "_id")]
    pub id: &'a UserID,
    pub name: &'a str,
    pub avatar: &'a str,
}

impl<'a> Owner<'a> {
    pub fn new(id: &'a UserID, user: &'a User) -> Self {
        Self { id, name: user.name.as_str(), avatar: user.avatar.as_str() }
    }
}
