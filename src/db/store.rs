use std::{collections::HashMap, fs::{self, read_dir, read_to_string, create_dir_all}, io::ErrorKind, path::{Path, PathBuf}};

use chrono::{DateTime, NaiveDate, Utc};
use json::{JsonValue, object};

use crate::{data::{random_id, Education, EntryID, Experience, Post, Profile, ProfileID, Social, User, UserID}, auth::PasswordStore};

use super::StoreError;

pub(super) const USERS_DIR: &str = "users";
pub(super) const AUTH_DIR: &str = "auth";
pub(super) const PROFILES_DIR: &str = "profiles";
pub(super) const POSTS_DIR: &str = "posts";

pub(super) fn create_layout(root: &Path) -> Result<(), StoreError> {
    for dir in [USERS_DIR, AUTH_DIR, PROFILES_DIR, POSTS_DIR] {
        let path = root.join(dir);
        create_dir_all(&path).map_err(|e| StoreError::io(&path, e))?;
    }
    Ok(())
}

fn document_path(root: &Path, dir: &str, id: &str) -> PathBuf {
    root.join(dir).join(id.to_string() + ".json")
}

/// Every `<id>.json` document of a directory, parsed.
fn read_documents(root: &Path, dir: &str) -> Result<Vec<(String, JsonValue, PathBuf)>, StoreError> {
    let dir = root.join(dir);
    let entries = match read_dir(&dir) {
        Ok(x) => x,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(StoreError::io(&dir, e)),
    };
    let mut documents = vec![];
    for entry in entries {
        let path = entry.map_err(|e| StoreError::io(&dir, e))?.path();
        if path.extension().and_then(|x| x.to_str()) != Some("json") {
            continue;
        }
        let Some(id) = path.file_stem().and_then(|x| x.to_str()).map(str::to_string) else {
            continue;
        };
        let text = read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let json = json::parse(&text).map_err(|_| StoreError::Malformed(path.clone()))?;
        documents.push((id, json, path));
    }
    Ok(documents)
}

fn write_document(path: &Path, json: &JsonValue) -> Result<(), StoreError> {
    fs::write(path, json.to_string()).map_err(|e| StoreError::io(path, e))
}

fn remove_document(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

fn opt_str(json: &JsonValue, key: &str) -> Option<String> {
    json[key].as_str().map(str::to_string)
}

fn req_str(json: &JsonValue, key: &str, path: &Path) -> Result<String, StoreError> {
    opt_str(json, key).ok_or_else(|| StoreError::Malformed(path.to_path_buf()))
}

fn opt_date(json: &JsonValue, key: &str, path: &Path) -> Result<Option<NaiveDate>, StoreError> {
    match json[key].as_str() {
        Some(x) => x.parse::<NaiveDate>().map(Some).map_err(|_| StoreError::Malformed(path.to_path_buf())),
        None => Ok(None),
    }
}

fn req_date(json: &JsonValue, key: &str, path: &Path) -> Result<NaiveDate, StoreError> {
    opt_date(json, key, path)?.ok_or_else(|| StoreError::Malformed(path.to_path_buf()))
}

fn req_timestamp(json: &JsonValue, key: &str, path: &Path) -> Result<DateTime<Utc>, StoreError> {
    json[key].as_str()
        .and_then(|x| x.parse::<DateTime<Utc>>().ok())
        .ok_or_else(|| StoreError::Malformed(path.to_path_buf()))
}

fn set_opt(obj: &mut JsonValue, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        obj[key] = value.as_str().into();
    }
}

fn set_opt_date(obj: &mut JsonValue, key: &str, value: &Option<NaiveDate>) {
    if let Some(value) = value {
        obj[key] = value.to_string().into();
    }
}

pub(super) fn load_users(root: &Path) -> Result<HashMap<UserID, User>, StoreError> {
    read_documents(root, USERS_DIR)?.into_iter().map(|(id, json, path)| {
        let user = User {
            name: req_str(&json, "name", &path)?,
            email: req_str(&json, "email", &path)?,
            avatar: opt_str(&json, "avatar").unwrap_or_default(),
            date: req_timestamp(&json, "date", &path)?,
        };
        Ok((UserID(id), user))
    }).collect()
}

fn load_experience(json: &JsonValue, path: &Path) -> Result<Experience, StoreError> {
    Ok(Experience {
        id: EntryID(req_str(json, "id", path)?),
        title: req_str(json, "title", path)?,
        company: req_str(json, "company", path)?,
        location: opt_str(json, "location"),
        from: req_date(json, "from", path)?,
        to: opt_date(json, "to", path)?,
        current: json["current"].as_bool().unwrap_or(false),
        description: opt_str(json, "description"),
    })
}

fn load_education(json: &JsonValue, path: &Path) -> Result<Education, StoreError> {
    Ok(Education {
        id: EntryID(req_str(json, "id", path)?),
        school: req_str(json, "school", path)?,
        degree: req_str(json, "degree", path)?,
        fieldofstudy: req_str(json, "fieldofstudy", path)?,
        from: req_date(json, "from", path)?,
        to: opt_date(json, "to", path)?,
        current: json["current"].as_bool().unwrap_or(false),
        description: opt_str(json, "description"),
    })
}

pub(super) fn load_profiles(root: &Path) -> Result<HashMap<UserID, Profile>, StoreError> {
    read_documents(root, PROFILES_DIR)?.into_iter().map(|(owner, json, path)| {
        let skills = match &json["skills"] {
            JsonValue::Array(skills) => Some(skills.iter()
                .map(|x| x.as_str().map(str::to_string).ok_or_else(|| StoreError::Malformed(path.clone())))
                .collect::<Result<Vec<_>, _>>()?),
            _ => None,
        };
        let social = &json["social"];
        let profile = Profile {
            id: ProfileID(req_str(&json, "id", &path)?),
            user: UserID(owner.clone()),
            company: opt_str(&json, "company"),
            website: opt_str(&json, "website"),
            location: opt_str(&json, "location"),
            bio: opt_str(&json, "bio"),
            status: opt_str(&json, "status"),
            githubusername: opt_str(&json, "githubusername"),
            skills,
            social: Social {
                youtube: opt_str(social, "youtube"),
                facebook: opt_str(social, "facebook"),
                twitter: opt_str(social, "twitter"),
                instagram: opt_str(social, "instagram"),
                linkedin: opt_str(social, "linkedin"),
            },
            experience: json["experience"].members()
                .map(|x| load_experience(x, &path))
                .collect::<Result<_, _>>()?,
            education: json["education"].members()
                .map(|x| load_education(x, &path))
                .collect::<Result<_, _>>()?,
            date: req_timestamp(&json, "date", &path)?,
        };
        Ok((UserID(owner), profile))
    }).collect()
}

fn load_post(json: &JsonValue, path: &Path) -> Result<Post, StoreError> {
    Ok(Post { user: UserID(req_str(json, "user", path)?) })
}


pub(super) fn store_user(root: &Path, id: &UserID, user: &User) -> Result<(), StoreError> {
    let json = object! {
        name: user.name.as_str(),
        email: user.email.as_str(),
        avatar: user.avatar.as_str(),
        date: user.date.to_rfc3339(),
    };
    write_document(&document_path(root, USERS_DIR, &id.0), &json)
}

fn experience_json(experience: &Experience) -> JsonValue {
    let mut json = object! {
        id: experience.id.0.as_str(),
        title: experience.title.as_str(),
        company: experience.company.as_str(),
        from: experience.from.to_string(),
        current: experience.current,
    };
    set_opt(&mut json, "location", &experience.location);
    set_opt_date(&mut json, "to", &experience.to);
    set_opt(&mut json, "description", &experience.description);
    json
}

fn education_json(education: &Education) -> JsonValue {
    let mut json = object! {
        id: education.id.0.as_str(),
        school: education.school.as_str(),
        degree: education.degree.as_str(),
        fieldofstudy: education.fieldofstudy.as_str(),
        from: education.from.to_string(),
        current: education.current,
    };
    set_opt_date(&mut json, "to", &education.to);
    set_opt(&mut json, "description", &education.description);
    json
}

pub(super) fn store_profile(root: &Path, profile: &Profile) -> Result<(), StoreError> {
    let mut json = object! {
        id: profile.id.0.as_str(),
        experience: JsonValue::Array(profile.experience.iter().map(experience_json).collect()),
        education: JsonValue::Array(profile.education.iter().map(education_json).collect()),
        date: profile.date.to_rfc3339(),
    };
    set_opt(&mut json, "company", &profile.company);
    set_opt(&mut json, "website", &profile.website);
    set_opt(&mut json, "location", &profile.location);
    set_opt(&mut json, "bio", &profile.bio);
    set_opt(&mut json, "status", &profile.status);
    set_opt(&mut json, "githubusername", &profile.githubusername);
    if let Some(skills) = &profile.skills {
        json["skills"] = skills.iter().map(|x| x.as_str()).collect::<Vec<_>>().into();
    }
    let mut social = JsonValue::new_object();
    set_opt(&mut social, "youtube", &profile.social.youtube);
    set_opt(&mut social, "facebook", &profile.social.facebook);
    set_opt(&mut social, "twitter", &profile.social.twitter);
    set_opt(&mut social, "instagram", &profile.social.instagram);
    set_opt(&mut social, "linkedin", &profile.social.linkedin);
    json["social"] = social;
    write_document(&document_path(root, PROFILES_DIR, &profile.user.0), &json)
}


pub(super) fn delete_user(root: &Path, id: &UserID) -> Result<(), StoreError> {
    remove_document(&document_path(root, USERS_DIR, &id.0))
}

pub(super) fn delete_user_auth(root: &Path, id: &UserID) -> Result<(), StoreError> {
    remove_document(&document_path(root, AUTH_DIR, &id.0))
}

pub(super) fn delete_profile(root: &Path, owner: &UserID) -> Result<(), StoreError> {
    remove_document(&document_path(root, PROFILES_DIR, &owner.0))
}

/// Returns how many posts were removed.
pub(super) fn delete_posts_for_user(root: &Path, user: &UserID) -> Result<usize, StoreError> {
    let mut deleted = 0;
    for (_, json, path) in read_documents(root, POSTS_DIR)? {
        if &load_post(&json, &path)?.user == user {
            remove_document(&path)?;
            deleted += 1;
        }
    }
    Ok(deleted)
}

fn gen_id(root: &Path, dir: &str) -> String {
    let id = random_id();
    if document_path(root, dir, &id).exists() {
        gen_id(root, dir)
    } else {
        id
    }
}

pub(super) fn gen_user_id(root: &Path) -> UserID {
    UserID(gen_id(root, USERS_DIR))
}

pub(super) fn gen_profile_id() -> ProfileID {
    ProfileID(random_id())
}


pub fn store_user_auth(root: &Path, id: &UserID, password_store: &PasswordStore) -> Result<(), StoreError> {
    let json = object! {
        salt: password_store.salt.as_str(),
        hashed: password_store.hashed.as_str(),
    };
    write_document(&document_path(root, AUTH_DIR, &id.0), &json)
}

pub fn load_user_auth(root: &Path, id: &UserID) -> Result<Option<PasswordStore>, StoreError> {
    let path = document_path(root, AUTH_DIR, &id.0);
    let text = match read_to_string(&path) {
        Ok(x) => x,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StoreError::io(&path, e)),
    };
    let json = json::parse(&text).map_err(|_| StoreError::Malformed(path.clone()))?;
    Ok(Some(PasswordStore {
        salt: req_str(&json, "salt", &path)?,
        hashed: req_str(&json, "hashed", &path)?,
    }))
}
