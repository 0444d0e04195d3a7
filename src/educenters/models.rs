use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

pub type CourseId = i64;
pub type EducenterId = i64;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_SLUG_LENGTH: usize = 120;
pub const MAX_PHONE_NUMBER_LENGTH: usize = 13;

/// A course which can be taught by several education centers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    id: CourseId,
    title: String,
    slug: String,
}

impl Course {
    pub(crate) fn new(id: CourseId, title: impl Into<String>, slug: impl Into<String>) -> Course {
        Course {
            id,
            title: title.into(),
            slug: slug.into(),
        }
    }

    pub fn id(&self) -> CourseId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }
}

/// An education center which has not been stored yet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEducenter {
    name: String,
    slug: Option<String>,
    bio: Option<String>,
    phone_number: Option<String>,
    phone_number_extra: Option<String>,
}

impl NewEducenter {
    pub fn new(name: impl Into<String>) -> NewEducenter {
        NewEducenter {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_slug(self, slug: impl Into<String>) -> NewEducenter {
        NewEducenter {
            slug: Some(slug.into()),
            ..self
        }
    }

    pub fn with_bio(self, bio: impl Into<String>) -> NewEducenter {
        NewEducenter {
            bio: Some(bio.into()),
            ..self
        }
    }

    pub fn with_phone_numbers(
        self,
        phone_number: impl Into<String>,
        phone_number_extra: Option<String>,
    ) -> NewEducenter {
        NewEducenter {
            phone_number: Some(phone_number.into()),
            phone_number_extra,
            ..self
        }
    }

    pub(crate) fn from_columns(
        name: String,
        bio: Option<String>,
        phone_number: Option<String>,
        phone_number_extra: Option<String>,
    ) -> NewEducenter {
        NewEducenter {
            name,
            slug: None,
            bio,
            phone_number,
            phone_number_extra,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the slug given for this center, or the slug derived from its name
    pub fn slug(&self) -> Result<String> {
        match &self.slug {
            Some(slug) => Ok(slug.clone()),
            None => slug_for(&self.name),
        }
    }

    pub fn bio(&self) -> Option<&str> {
        self.bio.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn phone_number_extra(&self) -> Option<&str> {
        self.phone_number_extra.as_deref()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_length("name", &self.name, MAX_NAME_LENGTH)?;
        check_phone_number(self.phone_number())?;
        check_phone_number(self.phone_number_extra())
    }
}

/// A stored education center, with the courses it teaches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Educenter {
    id: EducenterId,
    name: String,
    slug: String,
    bio: Option<String>,
    phone_number: Option<String>,
    phone_number_extra: Option<String>,
    courses: Vec<Course>,
}

impl Educenter {
    pub(crate) fn new(id: EducenterId, slug: String, center: NewEducenter) -> Educenter {
        Educenter {
            id,
            name: center.name,
            slug,
            bio: center.bio,
            phone_number: center.phone_number,
            phone_number_extra: center.phone_number_extra,
            courses: vec![],
        }
    }

    pub fn id(&self) -> EducenterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn bio(&self) -> Option<&str> {
        self.bio.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    pub fn phone_number_extra(&self) -> Option<&str> {
        self.phone_number_extra.as_deref()
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn summary(&self) -> EducenterSummary {
        EducenterSummary {
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }

    pub fn with_courses(self, courses: Vec<Course>) -> Educenter {
        Educenter { courses, ..self }
    }

    /// Return a copy of this center with new details. The slug is kept
    pub fn with_details(self, details: NewEducenter) -> Educenter {
        Educenter {
            name: details.name,
            bio: details.bio,
            phone_number: details.phone_number,
            phone_number_extra: details.phone_number_extra,
            ..self
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_length("name", &self.name, MAX_NAME_LENGTH)?;
        check_phone_number(self.phone_number())?;
        check_phone_number(self.phone_number_extra())
    }
}

/// Name and slug of a center, as displayed in lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducenterSummary {
    pub name: String,
    pub slug: String,
}

/// Turn a name into a slug: lowercase ASCII letters and digits separated by single dashes.
/// Spaces, dashes and underscores become separators, other characters are removed.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut separator = false;
    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if separator && !slug.is_empty() {
                slug.push('-');
            }
            separator = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            separator = true;
        }
    }
    slug
}

/// Derive a slug which can be stored
pub(crate) fn slug_for(value: &str) -> Result<String> {
    let slug = slugify(value);
    if slug.is_empty() {
        return Err(ApiError::message(format!(
            "no slug can be derived from '{value}'"
        )));
    }
    Ok(slug)
}

pub(crate) fn check_length(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(ApiError::message(format!(
            "the {field} must have at most {max} characters"
        )));
    }
    Ok(())
}

fn check_phone_number(phone_number: Option<&str>) -> Result<()> {
    match phone_number {
        Some(phone_number) => check_length("phone number", phone_number, MAX_PHONE_NUMBER_LENGTH),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Math for Beginners"), "math-for-beginners");
        assert_eq!(slugify("  IT -- Academy__2024 "), "it-academy-2024");
        assert_eq!(slugify("C++ & Rust!"), "c-rust");
        assert_eq!(slugify("Ökonomie"), "konomie");
        assert_eq!(slugify("!!!"), "");
        assert!(slug_for("???").is_err());
    }

    #[test]
    fn test_derived_slug() {
        let center = NewEducenter::new("North Academy");
        assert_eq!(center.slug().unwrap(), "north-academy");
        let center = center.with_slug("north");
        assert_eq!(center.slug().unwrap(), "north");
    }

    #[test]
    fn test_validation() {
        assert!(NewEducenter::new("North").validate().is_ok());
        assert!(NewEducenter::new("x".repeat(101)).validate().is_err());
        let center = NewEducenter::new("North").with_phone_numbers("+99899123456789", None);
        assert!(center.validate().is_err());
        let center = NewEducenter::new("North")
            .with_phone_numbers("+998991234567", Some("+998997654321".to_string()));
        assert!(center.validate().is_ok());
    }
}
