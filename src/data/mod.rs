use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};

mod post;
mod profile;
mod user;

pub use post::*;
pub use profile::*;
pub use user::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserID(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileID(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryID(pub String);

/// Length of every generated identifier.
pub const ID_LEN: usize = 24;

pub(crate) fn random_id() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), ID_LEN)
}

impl EntryID {
    /// Entries live inside their profile document, so a fresh random id
    /// only has to be unique within that document.
    pub fn generate() -> Self {
        Self(random_id())
    }
}
