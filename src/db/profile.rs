use log::{error, warn};

use crate::data::{Collection, EntryID, NewEntry, Profile, ProfileUpdate, UserID};

use super::{store, StoreError, DB};

#[derive(thiserror::Error, Debug)]
pub enum ProfileError {
    #[error("There is no profile for this user")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a remove-by-id. `removed` is `false` when no entry carried
/// the id; the profile is then returned as it was and nothing is written.
#[derive(Debug)]
pub struct EntryRemoval {
    pub profile: Profile,
    pub removed: bool,
}

impl DB {
    /// Creates the user's profile from `update`, or merges `update` into
    /// the existing one field by field. Fails for a user that no longer exists.
    pub fn upsert_profile(&mut self, user: &UserID, update: ProfileUpdate) -> Result<Profile, ProfileError> {
        if !self.users.contains_key(user) {
            error!("cannot save profile: user {} does not exist", user.0);
            return Err(ProfileError::NotFound);
        }
        let profile = match self.profiles.get(user) {
            Some(existing) => {
                let mut profile = existing.clone();
                profile.apply(update);
                profile
            }
            None => Profile::new(store::gen_profile_id(), user.clone(), update),
        };
        Ok(self.save_profile(profile)?)
    }

    pub fn add_entry(&mut self, user: &UserID, entry: NewEntry) -> Result<Profile, ProfileError> {
        let Some(existing) = self.profiles.get(user) else {
            error!("cannot add {} entry: user {} has no profile", entry.collection(), user.0);
            return Err(ProfileError::NotFound);
        };
        let mut profile = existing.clone();
        profile.insert_entry(entry);
        Ok(self.save_profile(profile)?)
    }

    pub fn remove_entry(&mut self, user: &UserID, collection: Collection, id: &EntryID) -> Result<EntryRemoval, ProfileError> {
        let Some(existing) = self.profiles.get(user) else {
            return Err(ProfileError::NotFound);
        };
        let mut profile = existing.clone();
        if !profile.remove_entry(collection, id) {
            warn!("no {} entry {} on the profile of user {}", collection, id.0, user.0);
            return Ok(EntryRemoval { profile, removed: false });
        }
        let profile = self.save_profile(profile)?;
        Ok(EntryRemoval { profile, removed: true })
    }

    fn save_profile(&mut self, profile: Profile) -> Result<Profile, StoreError> {
        store::store_profile(&self.root, &profile)?;
        self.profiles.insert(profile.user.clone(), profile.clone());
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tempfile::TempDir;

    use super::*;
    use crate::{auth::PasswordStore, data::{build_update_document, Education, Experience, ProfileFields}};

    fn setup() -> (TempDir, DB, UserID) {
        let dir = tempfile::tempdir().unwrap();
        let mut db = DB::connect(dir.path()).unwrap();
        let password = PasswordStore { salt: String::new(), hashed: String::new() };
        let user = db.create_new_user("Ada", "ada@example.com", String::new(), &password).unwrap();
        (dir, db, user)
    }

    fn update(json: serde_json::Value) -> ProfileUpdate {
        build_update_document(serde_json::from_value::<ProfileFields>(json).unwrap())
    }

    fn experience(title: &str) -> NewEntry {
        NewEntry::Experience(Experience {
            id: EntryID::generate(),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: Some("Berlin".to_string()),
            from: NaiveDate::from_ymd_opt(2019, 3, 1).unwrap(),
            to: Some(NaiveDate::from_ymd_opt(2021, 6, 30).unwrap()),
            current: false,
            description: None,
        })
    }

    fn education(school: &str) -> NewEntry {
        NewEntry::Education(Education {
            id: EntryID::generate(),
            school: school.to_string(),
            degree: "BSc".to_string(),
            fieldofstudy: "CS".to_string(),
            from: NaiveDate::from_ymd_opt(2010, 9, 1).unwrap(),
            to: None,
            current: true,
            description: Some("evening classes".to_string()),
        })
    }

    #[test]
    fn first_upsert_creates_the_profile() {
        let (_dir, mut db, user) = setup();
        let profile = db.upsert_profile(&user, update(serde_json::json!({ "status": "dev", "skills": "js,go" }))).unwrap();
        assert_eq!(profile.status.as_deref(), Some("dev"));
        assert_eq!(profile.skills, Some(vec!["js".to_string(), "go".to_string()]));
        assert_eq!(profile.user, user);
        let value = serde_json::to_value(&profile).unwrap();
        assert!(value.get("company").is_none());
        assert_eq!(db.get_profile(&user), Some(&profile));
    }

    #[test]
    fn upserts_merge_fields() {
        let (_dir, mut db, user) = setup();
        let first = db.upsert_profile(&user, update(serde_json::json!({ "status": "dev", "company": "Acme" }))).unwrap();
        let second = db.upsert_profile(&user, update(serde_json::json!({ "status": "lead", "bio": "hello" }))).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.status.as_deref(), Some("lead"));
        assert_eq!(second.company.as_deref(), Some("Acme"));
        assert_eq!(second.bio.as_deref(), Some("hello"));
    }

    #[test]
    fn social_links_left_out_are_dropped() {
        let (dir, mut db, user) = setup();
        db.upsert_profile(&user, update(serde_json::json!({ "status": "dev", "skills": "rust", "twitter": "t" }))).unwrap();
        let profile = db.upsert_profile(&user, update(serde_json::json!({ "status": "dev", "skills": "rust", "youtube": "y" }))).unwrap();
        assert_eq!(profile.social.twitter, None);
        assert_eq!(profile.social.youtube.as_deref(), Some("y"));

        let reloaded = DB::connect(dir.path()).unwrap();
        let social = serde_json::to_value(&reloaded.get_profile(&user).unwrap().social).unwrap();
        assert_eq!(social, serde_json::json!({ "youtube": "y" }));
    }

    #[test]
    fn upsert_for_a_deleted_user_fails() {
        let (dir, mut db, user) = setup();
        db.delete_account(&user).unwrap();
        let result = db.upsert_profile(&user, update(serde_json::json!({ "status": "dev" })));
        assert!(matches!(result, Err(ProfileError::NotFound)));
        assert!(db.get_profile(&user).is_none());
        assert!(DB::connect(dir.path()).unwrap().get_profile(&user).is_none());
    }

    #[test]
    fn repeated_upserts_store_the_same_state() {
        let (dir, mut db, user) = setup();
        let input = serde_json::json!({ "status": "dev", "skills": "rust", "github": "x", "twitter": "t" });
        let first = db.upsert_profile(&user, update(input.clone())).unwrap();
        let second = db.upsert_profile(&user, update(input)).unwrap();
        assert_eq!(first, second);
        let reloaded = DB::connect(dir.path()).unwrap();
        assert_eq!(reloaded.get_profile(&user), Some(&second));
    }

    #[test]
    fn entries_are_inserted_at_the_front() {
        let (_dir, mut db, user) = setup();
        db.upsert_profile(&user, update(serde_json::json!({ "status": "dev" }))).unwrap();
        db.add_entry(&user, experience("first")).unwrap();
        let profile = db.add_entry(&user, experience("second")).unwrap();
        let titles: Vec<_> = profile.experience.iter().map(|x| x.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);

        db.add_entry(&user, education("Old School")).unwrap();
        let profile = db.add_entry(&user, education("New School")).unwrap();
        let schools: Vec<_> = profile.education.iter().map(|x| x.school.as_str()).collect();
        assert_eq!(schools, vec!["New School", "Old School"]);
        assert_eq!(profile.experience.len(), 2);
    }

    #[test]
    fn adding_without_a_profile_fails() {
        let (_dir, mut db, user) = setup();
        assert!(matches!(db.add_entry(&user, experience("x")), Err(ProfileError::NotFound)));
        assert!(db.get_profile(&user).is_none());
    }

    #[test]
    fn removing_an_entry_keeps_the_rest_in_order() {
        let (dir, mut db, user) = setup();
        db.upsert_profile(&user, update(serde_json::json!({ "status": "dev" }))).unwrap();
        for title in ["a", "b", "c"] {
            db.add_entry(&user, experience(title)).unwrap();
        }
        let target = db.get_profile(&user).unwrap().experience[1].id.clone();
        let removal = db.remove_entry(&user, Collection::Experience, &target).unwrap();
        assert!(removal.removed);
        let titles: Vec<_> = removal.profile.experience.iter().map(|x| x.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a"]);

        let reloaded = DB::connect(dir.path()).unwrap();
        assert_eq!(reloaded.get_profile(&user).unwrap().experience.len(), 2);
    }

    #[test]
    fn removing_an_unknown_entry_changes_nothing() {
        let (_dir, mut db, user) = setup();
        db.upsert_profile(&user, update(serde_json::json!({ "status": "dev" }))).unwrap();
        db.add_entry(&user, experience("a")).unwrap();
        let before = db.get_profile(&user).unwrap().clone();
        let removal = db.remove_entry(&user, Collection::Experience, &EntryID("missing".to_string())).unwrap();
        assert!(!removal.removed);
        assert_eq!(removal.profile, before);
        assert_eq!(db.get_profile(&user), Some(&before));
    }

    #[test]
    fn removing_from_a_missing_profile_fails() {
        let (_dir, mut db, user) = setup();
        let result = db.remove_entry(&user, Collection::Education, &EntryID("x".to_string()));
        assert!(matches!(result, Err(ProfileError::NotFound)));
    }
}
