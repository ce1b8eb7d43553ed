use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::Serialize;

use crate::data::{Education, EducationFields, EntryID, Experience, ExperienceFields, ProfileFields};

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

static EMAIL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

pub const PASSWORD_MIN_LEN: usize = 6;

/// Every field a request got wrong, reported as `{"errors": [...]}`.
#[derive(thiserror::Error, Debug, Default, Serialize)]
#[error("{} request field(s) rejected", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub msg: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<&'static str>,
}

impl ValidationErrors {
    /// An error not tied to a single field, such as rejected credentials.
    pub fn single(msg: &'static str) -> Self {
        Self { errors: vec![FieldError { msg, param: None }] }
    }

    #[cfg(test)]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }
}

/// Collects field errors. Accessors hand back `""` for a rejected field so
/// callers can keep going; `finish` fails whenever anything was recorded.
#[derive(Default)]
pub struct Check {
    errors: Vec<FieldError>,
}

impl Check {
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(&mut self, param: &'static str, msg: &'static str) {
        self.errors.push(FieldError { msg, param: Some(param) });
    }

    pub fn required<'a>(&mut self, param: &'static str, value: &'a Option<String>, msg: &'static str) -> &'a str {
        match value.as_deref() {
            Some(x) if !x.trim().is_empty() => x,
            _ => {
                self.reject(param, msg);
                ""
            }
        }
    }

    pub fn email<'a>(&mut self, param: &'static str, value: &'a Option<String>, msg: &'static str) -> &'a str {
        match value.as_deref() {
            Some(x) if is_email(x.trim()) => x.trim(),
            _ => {
                self.reject(param, msg);
                ""
            }
        }
    }

    pub fn min_len<'a>(&mut self, param: &'static str, value: &'a Option<String>, min: usize, msg: &'static str) -> &'a str {
        match value.as_deref() {
            Some(x) if x.chars().count() >= min => x,
            _ => {
                self.reject(param, msg);
                ""
            }
        }
    }

    pub fn date(&mut self, param: &'static str, value: &Option<String>, msg: &'static str) -> Option<NaiveDate> {
        let value = value.as_deref()?;
        let date = parse_date(value);
        if date.is_none() {
            self.reject(param, msg);
        }
        date
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors: self.errors })
        }
    }
}

pub fn is_email(value: &str) -> bool {
    EMAIL_REGEX
        .get_or_init(|| Regex::new(EMAIL_PATTERN).ok())
        .as_ref()
        .map_or(false, |re| re.is_match(value))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    value.parse::<NaiveDate>().ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|x| x.date_naive()))
}

pub fn profile(fields: &ProfileFields) -> Result<(), ValidationErrors> {
    let mut check = Check::new();
    check.required("status", &fields.status, "Status is required");
    check.required("skills", &fields.skills, "Skills is required");
    check.finish()
}

const FROM_REQUIRED: &str = "From Date is required";
const FROM_INVALID: &str = "From Date must be a valid date";
const TO_INVALID: &str = "To Date must be a valid date";

fn from_date(check: &mut Check, value: &Option<String>) -> Option<NaiveDate> {
    if check.required("from", value, FROM_REQUIRED).is_empty() {
        return None;
    }
    check.date("from", value, FROM_INVALID)
}

pub fn experience(fields: ExperienceFields) -> Result<Experience, ValidationErrors> {
    let mut check = Check::new();
    let title = check.required("title", &fields.title, "Title is required").to_string();
    let company = check.required("company", &fields.company, "Company is required").to_string();
    let from = from_date(&mut check, &fields.from);
    let to = check.date("to", &fields.to, TO_INVALID);
    check.finish()?;
    let from = from.ok_or_else(|| ValidationErrors::single(FROM_REQUIRED))?;
    Ok(Experience {
        id: EntryID::generate(),
        title,
        company,
        location: fields.location,
        from,
        to,
        current: fields.current,
        description: fields.description,
    })
}

pub fn education(fields: EducationFields) -> Result<Education, ValidationErrors> {
    let mut check = Check::new();
    let school = check.required("school", &fields.school, "School is required").to_string();
    let degree = check.required("degree", &fields.degree, "Degree is required").to_string();
    let fieldofstudy = check.required("fieldofstudy", &fields.fieldofstudy, "Field of Study is required").to_string();
    let from = from_date(&mut check, &fields.from);
    let to = check.date("to", &fields.to, TO_INVALID);
    check.finish()?;
    let from = from.ok_or_else(|| ValidationErrors::single(FROM_REQUIRED))?;
    Ok(Education {
        id: EntryID::generate(),
        school,
        degree,
        fieldofstudy,
        from,
        to,
        current: fields.current,
        description: fields.description,
    })
}
