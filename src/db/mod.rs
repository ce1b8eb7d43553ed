use std::{collections::HashMap, io, path::{Path, PathBuf}};

use chrono::Utc;
use log::{info, warn};

use crate::{data::{Profile, User, UserID}, auth::PasswordStore};

pub mod profile;
pub mod store;

pub use profile::{EntryRemoval, ProfileError};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store i/o failed on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: io::Error,
    },
    #[error("malformed document {}", .0.display())]
    Malformed(PathBuf),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StoreError::Io { path: path.to_path_buf(), source }
    }
}

/// Handle to the document store. Every write goes to disk first and only
/// then into the in-memory index, so a failed write leaves both unchanged.
pub struct DB {
    root: PathBuf,
    users: HashMap<UserID, User>,
    profiles: HashMap<UserID, Profile>,
}

impl DB {
    pub fn connect(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        store::create_layout(&root)?;
        let mut db = Self {
            root,
            users: HashMap::new(),
            profiles: HashMap::new(),
        };
        db.reload()?;
        info!(
            "connected to store at {} ({} users, {} profiles)",
            db.root.display(),
            db.users.len(),
            db.profiles.len()
        );
        Ok(db)
    }

    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.users = store::load_users(&self.root)?;
        self.profiles = store::load_profiles(&self.root)?;
        Ok(())
    }

    /// Drops the in-memory index. Documents are already on disk.
    pub fn close(&mut self) {
        info!("closing store at {}", self.root.display());
        self.users.clear();
        self.profiles.clear();
    }

    pub fn get_user(&self, id: &UserID) -> Option<&User> {
        self.users.get(id)
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<(&UserID, &User)> {
        let email = email.trim();
        self.users.iter().find(|(_, user)| user.email.eq_ignore_ascii_case(email))
    }

    pub fn get_profile(&self, user: &UserID) -> Option<&Profile> {
        self.profiles.get(user)
    }

    /// All profiles, ordered by owner.
    pub fn profiles(&self) -> Vec<&Profile> {
        let mut profiles = self.profiles.values().collect::<Vec<_>>();
        profiles.sort_unstable_by(|a, b| a.user.cmp(&b.user));
        profiles
    }

    pub fn password_store(&self, user: &UserID) -> Result<Option<PasswordStore>, StoreError> {
        store::load_user_auth(&self.root, user)
    }
}

impl DB {
    pub fn create_new_user(&mut self, name: &str, email: &str, avatar: String, password_store: &PasswordStore) -> Result<UserID, StoreError> {
        let id = store::gen_user_id(&self.root);
        let user = User {
            name: name.to_string(),
            email: email.trim().to_string(),
            avatar,
            date: Utc::now(),
        };
        store::store_user_auth(&self.root, &id, password_store)?;
        if let Err(e) = store::store_user(&self.root, &id, &user) {
            if let Err(cleanup) = store::delete_user_auth(&self.root, &id) {
                warn!("credentials of unsaved user {} left behind: {}", id.0, cleanup);
            }
            return Err(e);
        }
        self.users.insert(id.clone(), user);
        Ok(id)
    }

    /// Removes the user's posts, profile, user record and credentials.
    pub fn delete_account(&mut self, user: &UserID) -> Result<(), StoreError> {
        let posts = store::delete_posts_for_user(&self.root, user)?;
        store::delete_profile(&self.root, user)?;
        self.profiles.remove(user);
        store::delete_user(&self.root, user)?;
        self.users.remove(user);
        store::delete_user_auth(&self.root, user)?;
        info!("deleted account {} and {} posts", user.0, posts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::data::{build_update_document, ProfileFields};

    fn password() -> PasswordStore {
        PasswordStore { salt: "salt".to_string(), hashed: "hashed".to_string() }
    }

    #[test]
    fn users_survive_a_reconnect() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let mut db = DB::connect(dir.path()).unwrap();
            db.create_new_user("Ada", "ada@example.com", "avatar".to_string(), &password()).unwrap()
        };
        let db = DB::connect(dir.path()).unwrap();
        let user = db.get_user(&id).unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(db.find_user_by_email("ADA@example.com").map(|(id, _)| id.clone()), Some(id.clone()));
        assert_eq!(db.password_store(&id).unwrap().map(|x| x.hashed), Some("hashed".to_string()));
    }

    #[test]
    fn delete_account_cascades() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = DB::connect(dir.path()).unwrap();
        let ada = db.create_new_user("Ada", "ada@example.com", String::new(), &password()).unwrap();
        let bob = db.create_new_user("Bob", "bob@example.com", String::new(), &password()).unwrap();
        let fields = ProfileFields { status: Some("dev".to_string()), ..Default::default() };
        db.upsert_profile(&ada, build_update_document(fields)).unwrap();

        let posts = dir.path().join(store::POSTS_DIR);
        fs::write(posts.join("p1.json"), format!("{{\"user\":\"{}\",\"text\":\"hi\"}}", ada.0)).unwrap();
        fs::write(posts.join("p2.json"), format!("{{\"user\":\"{}\",\"text\":\"yo\"}}", bob.0)).unwrap();

        db.delete_account(&ada).unwrap();

        assert!(db.get_user(&ada).is_none());
        assert!(db.get_profile(&ada).is_none());
        assert!(db.password_store(&ada).unwrap().is_none());
        assert!(!posts.join("p1.json").exists());
        assert!(posts.join("p2.json").exists());
        assert!(db.get_user(&bob).is_some());

        let db = DB::connect(dir.path()).unwrap();
        assert!(db.get_user(&ada).is_none());
        assert!(db.get_profile(&ada).is_none());
    }

    #[test]
    fn failed_signup_leaves_no_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let mut db = DB::connect(dir.path()).unwrap();
        let users = dir.path().join(store::USERS_DIR);
        fs::remove_dir(&users).unwrap();
        fs::write(&users, "not a directory").unwrap();

        assert!(db.create_new_user("Ada", "ada@example.com", String::new(), &password()).is_err());
        assert!(db.find_user_by_email("ada@example.com").is_none());
        let auth = fs::read_dir(dir.path().join(store::AUTH_DIR)).unwrap();
        assert_eq!(auth.count(), 0);
    }

    #[test]
    fn malformed_documents_fail_the_connect() {
        let dir = tempfile::tempdir().unwrap();
        let users = dir.path().join(store::USERS_DIR);
        fs::create_dir_all(&users).unwrap();
        fs::write(users.join("broken.json"), "{ not json").unwrap();
        assert!(matches!(DB::connect(dir.path()), Err(StoreError::Malformed(_))));
    }
}
