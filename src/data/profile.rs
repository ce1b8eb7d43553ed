use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{EntryID, Owner, ProfileID, UserID};

/// Deserializes an optional text field, treating `""` like a missing key.
pub fn present<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|x| !x.is_empty()))
}

/// Body of a create-or-update profile request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ProfileFields {
    #[serde(default, deserialize_with = "present")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub website: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub githubusername: Option<String>,
    /// Comma separated.
    #[serde(default, deserialize_with = "present")]
    pub skills: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub youtube: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub facebook: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub twitter: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub instagram: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub linkedin: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Social {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
}

impl Social {
    pub fn is_empty(&self) -> bool {
        self.youtube.is_none()
            && self.facebook.is_none()
            && self.twitter.is_none()
            && self.instagram.is_none()
            && self.linkedin.is_none()
    }
}

/// Sparse set of profile fields in storage form. A `None` field is not
/// part of the update and is never written.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Social::is_empty")]
    pub social: Social,
}

pub fn split_skills(skills: &str) -> Vec<String> {
    skills.split(',').map(|skill| skill.trim().to_string()).collect()
}

/// Reshapes request fields into an update document. Does not validate.
pub fn build_update_document(fields: ProfileFields) -> ProfileUpdate {
    ProfileUpdate {
        company: fields.company,
        website: fields.website,
        location: fields.location,
        bio: fields.bio,
        status: fields.status,
        githubusername: fields.githubusername,
        skills: fields.skills.as_deref().map(split_skills),
        social: Social {
            youtube: fields.youtube,
            facebook: fields.facebook,
            twitter: fields.twitter,
            instagram: fields.instagram,
            linkedin: fields.linkedin,
        },
    }
}

fn merge_field<T>(current: &mut Option<T>, update: Option<T>) {
    if update.is_some() {
        *current = update;
    }
}

pub trait Entry {
    fn id(&self) -> &EntryID;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experience {
    #[serde(rename = "_id")]
    pub id: EntryID,
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entry for Experience {
    fn id(&self) -> &EntryID {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Education {
    #[serde(rename = "_id")]
    pub id: EntryID,
    pub school: String,
    pub degree: String,
    pub fieldofstudy: String,
    pub from: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entry for Education {
    fn id(&self) -> &EntryID {
        &self.id
    }
}

/// Body of an add-experience request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ExperienceFields {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<String>,
}

/// Body of an add-education request.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct EducationFields {
    #[serde(default, deserialize_with = "present")]
    pub school: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub fieldofstudy: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub to: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NewEntry {
    Experience(Experience),
    Education(Education),
}

impl NewEntry {
    pub fn collection(&self) -> Collection {
        match self {
            NewEntry::Experience(_) => Collection::Experience,
            NewEntry::Education(_) => Collection::Education,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Experience,
    Education,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Experience => f.write_str("experience"),
            Collection::Education => f.write_str("education"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: ProfileID,
    pub user: UserID,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub githubusername: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Social::is_empty")]
    pub social: Social,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub date: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: ProfileID, user: UserID, update: ProfileUpdate) -> Self {
        let mut profile = Self {
            id,
            user,
            company: None,
            website: None,
            location: None,
            bio: None,
            status: None,
            githubusername: None,
            skills: None,
            social: Social::default(),
            experience: vec![],
            education: vec![],
            date: Utc::now(),
        };
        profile.apply(update);
        profile
    }

    /// Field-level merge: fields missing from `update` keep their value.
    /// `social` is replaced whole, so links left out are dropped.
    pub fn apply(&mut self, update: ProfileUpdate) {
        merge_field(&mut self.company, update.company);
        merge_field(&mut self.website, update.website);
        merge_field(&mut self.location, update.location);
        merge_field(&mut self.bio, update.bio);
        merge_field(&mut self.status, update.status);
        merge_field(&mut self.githubusername, update.githubusername);
        merge_field(&mut self.skills, update.skills);
        self.social = update.social;
    }

    /// Newest entries go first, whatever their dates say.
    pub fn insert_entry(&mut self, entry: NewEntry) {
        match entry {
            NewEntry::Experience(experience) => self.experience.insert(0, experience),
            NewEntry::Education(education) => self.education.insert(0, education),
        }
    }

    /// Returns `false`, leaving the collection untouched, when no entry has `id`.
    pub fn remove_entry(&mut self, collection: Collection, id: &EntryID) -> bool {
        match collection {
            Collection::Experience => remove_by_id(&mut self.experience, id),
            Collection::Education => remove_by_id(&mut self.education, id),
        }
    }
}

fn remove_by_id<E: Entry>(entries: &mut Vec<E>, id: &EntryID) -> bool {
    let Some(pos) = entries.iter().position(|x| x.id() == id) else {
        return false;
    };
    entries.remove(pos);
    true
}

impl Profile {
    /// Serializes the profile with its owner's public data in place of the
    /// bare user id.
    pub fn populated(&self, owner: Owner<'_>) -> serde_json::Result<serde_json::Value> {
        let mut value = serde_json::to_value(self)?;
        value["user"] = serde_json::to_value(owner)?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(json: serde_json::Value) -> ProfileFields {
        serde_json::from_value(json).unwrap()
    }

    fn experience(id: &str) -> Experience {
        Experience {
            id: EntryID(id.to_string()),
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            location: None,
            from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            to: None,
            current: true,
            description: None,
        }
    }

    fn empty_profile() -> Profile {
        Profile::new(ProfileID("p".to_string()), UserID("u".to_string()), ProfileUpdate::default())
    }

    #[test]
    fn update_contains_only_present_fields() {
        let update = build_update_document(fields(serde_json::json!({
            "company": "",
            "status": "Developer",
            "bio": null,
            "website": "https://example.com",
        })));
        let value = serde_json::to_value(&update).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["status".to_string(), "website".to_string()]);
    }

    #[test]
    fn skills_are_split_and_trimmed() {
        let update = build_update_document(fields(serde_json::json!({ "skills": "a, b ,c" })));
        assert_eq!(update.skills, Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]));
    }

    #[test]
    fn empty_skills_are_absent() {
        let update = build_update_document(fields(serde_json::json!({ "skills": "" })));
        assert_eq!(update.skills, None);
        let value = serde_json::to_value(&update).unwrap();
        assert!(value.get("skills").is_none());
    }

    #[test]
    fn social_only_holds_supplied_keys() {
        let update = build_update_document(fields(serde_json::json!({
            "twitter": "https://twitter.com/someone",
            "youtube": "",
        })));
        let value = serde_json::to_value(&update).unwrap();
        let social = value["social"].as_object().unwrap();
        assert_eq!(social.len(), 1);
        assert_eq!(social["twitter"], "https://twitter.com/someone");
    }

    #[test]
    fn no_social_input_means_no_social_key() {
        let update = build_update_document(fields(serde_json::json!({ "status": "dev" })));
        let value = serde_json::to_value(&update).unwrap();
        assert!(value.get("social").is_none());
    }

    #[test]
    fn building_is_deterministic() {
        let input = serde_json::json!({ "status": "dev", "skills": "rust,go", "linkedin": "x" });
        assert_eq!(build_update_document(fields(input.clone())), build_update_document(fields(input)));
    }

    #[test]
    fn apply_merges_fields_and_replaces_social() {
        let mut profile = empty_profile();
        profile.apply(build_update_document(fields(serde_json::json!({
            "status": "dev", "company": "Acme", "twitter": "t",
        }))));
        profile.apply(build_update_document(fields(serde_json::json!({
            "status": "lead", "bio": "hi", "youtube": "y",
        }))));
        assert_eq!(profile.status.as_deref(), Some("lead"));
        assert_eq!(profile.company.as_deref(), Some("Acme"));
        assert_eq!(profile.bio.as_deref(), Some("hi"));
        assert_eq!(profile.social.twitter, None);
        assert_eq!(profile.social.youtube.as_deref(), Some("y"));
        profile.apply(build_update_document(fields(serde_json::json!({ "status": "lead" }))));
        assert!(profile.social.is_empty());
    }

    #[test]
    fn remove_by_id_keeps_order_of_the_rest() {
        let mut profile = empty_profile();
        for id in ["a", "b", "c"] {
            profile.insert_entry(NewEntry::Experience(experience(id)));
        }
        assert!(profile.remove_entry(Collection::Experience, &EntryID("b".to_string())));
        let ids: Vec<_> = profile.experience.iter().map(|x| x.id.0.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);
    }

    #[test]
    fn remove_unknown_id_is_a_no_op() {
        let mut profile = empty_profile();
        profile.insert_entry(NewEntry::Experience(experience("a")));
        let before = profile.clone();
        assert!(!profile.remove_entry(Collection::Experience, &EntryID("zzz".to_string())));
        assert!(!profile.remove_entry(Collection::Education, &EntryID("a".to_string())));
        assert_eq!(profile, before);
    }
}
