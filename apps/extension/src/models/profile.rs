//! Profile: the single durable user record, personal info plus attached documents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Personal data entered in the side panel.
/// Every field is a string; an empty string means "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub city: String,
    pub country: String,
    pub linkedin_url: String,
    pub portfolio_url: String,
    pub current_title: String,
    pub years_of_experience: String,
}

/// The full persisted record. Documents keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub personal_info: PersonalInfo,
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileField {
    FirstName,
    LastName,
    Email,
    Phone,
    City,
    Country,
    LinkedinUrl,
    PortfolioUrl,
    CurrentTitle,
    YearsOfExperience,
}

#[derive(Debug, Error)]
#[error("Unknown profile field '{0}'")]
pub struct UnknownField(pub String);

impl ProfileField {
    pub const ALL: [ProfileField; 10] = [
        ProfileField::FirstName,
        ProfileField::LastName,
        ProfileField::Email,
        ProfileField::Phone,
        ProfileField::City,
        ProfileField::Country,
        ProfileField::LinkedinUrl,
        ProfileField::PortfolioUrl,
        ProfileField::CurrentTitle,
        ProfileField::YearsOfExperience,
    ];

    /// Storage key, identical to the serialized name inside `personalInfo`.
    pub fn key(self) -> &'static str {
        match self {
            ProfileField::FirstName => "firstName",
            ProfileField::LastName => "lastName",
            ProfileField::Email => "email",
            ProfileField::Phone => "phone",
            ProfileField::City => "city",
            ProfileField::Country => "country",
            ProfileField::LinkedinUrl => "linkedinUrl",
            ProfileField::PortfolioUrl => "portfolioUrl",
            ProfileField::CurrentTitle => "currentTitle",
            ProfileField::YearsOfExperience => "yearsOfExperience",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProfileField::FirstName => "First name",
            ProfileField::LastName => "Last name",
            ProfileField::Email => "Email",
            ProfileField::Phone => "Phone",
            ProfileField::City => "City",
            ProfileField::Country => "Country",
            ProfileField::LinkedinUrl => "LinkedIn URL",
            ProfileField::PortfolioUrl => "Portfolio URL",
            ProfileField::CurrentTitle => "Current title",
            ProfileField::YearsOfExperience => "Years of experience",
        }
    }

    /// Identity fields and LinkedIn must be filled before autofill runs.
    pub fn is_required(self) -> bool {
        matches!(
            self,
            ProfileField::FirstName
                | ProfileField::LastName
                | ProfileField::Email
                | ProfileField::Phone
                | ProfileField::LinkedinUrl
        )
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ProfileField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProfileField::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

impl PersonalInfo {
    pub fn get(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::FirstName => &self.first_name,
            ProfileField::LastName => &self.last_name,
            ProfileField::Email => &self.email,
            ProfileField::Phone => &self.phone,
            ProfileField::City => &self.city,
            ProfileField::Country => &self.country,
            ProfileField::LinkedinUrl => &self.linkedin_url,
            ProfileField::PortfolioUrl => &self.portfolio_url,
            ProfileField::CurrentTitle => &self.current_title,
            ProfileField::YearsOfExperience => &self.years_of_experience,
        }
    }

    fn slot_mut(&mut self, field: ProfileField) -> &mut String {
        match field {
            ProfileField::FirstName => &mut self.first_name,
            ProfileField::LastName => &mut self.last_name,
            ProfileField::Email => &mut self.email,
            ProfileField::Phone => &mut self.phone,
            ProfileField::City => &mut self.city,
            ProfileField::Country => &mut self.country,
            ProfileField::LinkedinUrl => &mut self.linkedin_url,
            ProfileField::PortfolioUrl => &mut self.portfolio_url,
            ProfileField::CurrentTitle => &mut self.current_title,
            ProfileField::YearsOfExperience => &mut self.years_of_experience,
        }
    }

    /// Full display name, or an empty string when both parts are unset.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }
}

impl Profile {
    pub fn update_field(&mut self, field: ProfileField, value: impl Into<String>) {
        *self.personal_info.slot_mut(field) = value.into();
    }

    /// Required fields that are empty or whitespace-only, in display order.
    pub fn missing_required(&self) -> Vec<ProfileField> {
        ProfileField::ALL
            .into_iter()
            .filter(|field| field.is_required())
            .filter(|field| self.personal_info.get(*field).trim().is_empty())
            .collect()
    }

    /// Appends documents in the order given. Blank names are skipped; duplicates are kept.
    /// Returns how many were added.
    pub fn add_documents<I, S>(&mut self, names: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let before = self.documents.len();
        self.documents.extend(
            names
                .into_iter()
                .map(Into::into)
                .filter(|name| !name.trim().is_empty()),
        );
        self.documents.len() - before
    }

    /// Removes the first document with this exact name.
    pub fn remove_document(&mut self, name: &str) -> bool {
        match self.documents.iter().position(|doc| doc == name) {
            Some(index) => {
                self.documents.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::alice;
    use serde_json::json;

    #[test]
    fn test_default_profile_is_all_empty() {
        let profile = Profile::default();
        for field in ProfileField::ALL {
            assert_eq!(profile.personal_info.get(field), "");
        }
        assert!(profile.documents.is_empty());
    }

    #[test]
    fn test_missing_required_lists_identity_and_linkedin() {
        let missing = Profile::default().missing_required();
        assert_eq!(
            missing,
            vec![
                ProfileField::FirstName,
                ProfileField::LastName,
                ProfileField::Email,
                ProfileField::Phone,
                ProfileField::LinkedinUrl,
            ]
        );
    }

    #[test]
    fn test_complete_profile_has_nothing_missing() {
        assert!(alice().missing_required().is_empty());
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let mut profile = alice();
        profile.update_field(ProfileField::Email, "   ");
        assert_eq!(profile.missing_required(), vec![ProfileField::Email]);
    }

    #[test]
    fn test_optional_fields_never_required() {
        let mut profile = alice();
        profile.update_field(ProfileField::City, "");
        profile.update_field(ProfileField::PortfolioUrl, "");
        assert!(profile.missing_required().is_empty());
    }

    #[test]
    fn test_field_parses_from_storage_key() {
        assert_eq!(
            "linkedinUrl".parse::<ProfileField>().unwrap(),
            ProfileField::LinkedinUrl
        );
        assert_eq!(
            "FIRSTNAME".parse::<ProfileField>().unwrap(),
            ProfileField::FirstName
        );
        assert!("middleName".parse::<ProfileField>().is_err());
    }

    #[test]
    fn test_duplicate_documents_remove_only_first() {
        let mut profile = Profile::default();
        assert_eq!(profile.add_documents(["cv.pdf", "cv.pdf"]), 2);

        assert!(profile.remove_document("cv.pdf"));
        assert_eq!(profile.documents, vec!["cv.pdf".to_string()]);
    }

    #[test]
    fn test_remove_unknown_document_is_noop() {
        let mut profile = Profile::default();
        profile.add_documents(["a.pdf", "b.pdf"]);
        assert!(!profile.remove_document("c.pdf"));
        assert_eq!(profile.documents, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_blank_document_names_skipped() {
        let mut profile = Profile::default();
        assert_eq!(profile.add_documents(["", "  ", "resume.pdf"]), 1);
        assert_eq!(profile.documents, vec!["resume.pdf"]);
    }

    #[test]
    fn test_serialized_layout_uses_camel_case() {
        let mut profile = alice();
        profile.add_documents(["My_CV_1.pdf"]);
        let value = serde_json::to_value(&profile).unwrap();

        assert_eq!(value["personalInfo"]["firstName"], "Alice");
        assert_eq!(value["personalInfo"]["linkedinUrl"], "linkedin.com/alice");
        assert_eq!(value["personalInfo"]["city"], "");
        assert_eq!(value["documents"], json!(["My_CV_1.pdf"]));
    }

    #[test]
    fn test_missing_keys_deserialize_as_empty_strings() {
        let profile: Profile =
            serde_json::from_value(json!({ "personalInfo": { "email": "a@b.c" } })).unwrap();
        assert_eq!(profile.personal_info.email, "a@b.c");
        assert_eq!(profile.personal_info.phone, "");
        assert!(profile.documents.is_empty());
    }

    #[test]
    fn test_full_name_trims_unset_parts() {
        let mut profile = Profile::default();
        profile.update_field(ProfileField::FirstName, "Alice");
        assert_eq!(profile.personal_info.full_name(), "Alice");
        assert_eq!(alice().personal_info.full_name(), "Alice Johnson");
    }
}
