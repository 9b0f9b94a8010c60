use crate::report::FieldErrors;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

/// A government support programme as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scheme {
    pub id: u64,
    #[serde(flatten)]
    pub details: NewScheme,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScheme {
    pub title: String,
    pub provider: String,
    pub organization_name: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub deadline: Option<NaiveDate>,
    pub description: String,
    pub eligibility: String,
    pub benefits: String,
    pub documents: String,
    pub application_process: String,
    pub website: String,
    pub tags: String,
}

/// Scheme payload as submitted; every field is checked by [`SchemeInput::validate`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemeInput {
    pub title: Option<String>,
    pub provider: Option<String>,
    pub organization_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub deadline: Option<String>,
    pub description: Option<String>,
    pub eligibility: Option<String>,
    pub benefits: Option<String>,
    pub documents: Option<String>,
    pub application_process: Option<String>,
    pub website: Option<String>,
    pub tags: Option<String>,
}

struct Validator {
    errors: FieldErrors,
}

impl Validator {
    fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    fn text(&mut self, field: &str, value: Option<String>, max_len: Option<usize>) -> String {
        let Some(value) = value else {
            self.fail(field, REQUIRED);
            return String::new();
        };
        let value = value.trim().to_string();
        if value.is_empty() {
            self.fail(field, BLANK);
        } else if let Some(max_len) = max_len {
            if value.chars().count() > max_len {
                self.fail(
                    field,
                    format!("Ensure this field has no more than {} characters.", max_len),
                );
            }
        }
        value
    }
}

impl SchemeInput {
    pub fn validate(self) -> Result<NewScheme, FieldErrors> {
        let mut v = Validator {
            errors: FieldErrors::new(),
        };

        let title = v.text("title", self.title, Some(200));
        let provider = v.text("provider", self.provider, Some(100));
        let organization_name = v.text("organizationName", self.organization_name, Some(150));
        let contact_name = v.text("contactName", self.contact_name, Some(100));
        let contact_email = v.text("contactEmail", self.contact_email, Some(254));
        if !contact_email.is_empty() && !is_valid_email(&contact_email) {
            v.fail("contactEmail", "Enter a valid email address.");
        }
        let contact_phone = v.text("contactPhone", self.contact_phone, Some(20));
        let description = v.text("description", self.description, None);
        let eligibility = v.text("eligibility", self.eligibility, None);
        let benefits = v.text("benefits", self.benefits, None);
        let documents = v.text("documents", self.documents, None);
        let application_process = v.text("applicationProcess", self.application_process, None);
        let tags = v.text("tags", self.tags, Some(255));

        let deadline = match self.deadline.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    v.fail(
                        "deadline",
                        "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.",
                    );
                    None
                }
            },
        };

        let website = self.website.unwrap_or_default().trim().to_string();
        if !website.is_empty() && !is_valid_url(&website) {
            v.fail("website", "Enter a valid URL.");
        }

        if !v.errors.is_empty() {
            return Err(v.errors);
        }

        Ok(NewScheme {
            title,
            provider,
            organization_name,
            contact_name,
            contact_email,
            contact_phone,
            deadline,
            description,
            eligibility,
            benefits,
            documents,
            application_process,
            website,
            tags,
        })
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn is_valid_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn valid_input() -> SchemeInput {
        SchemeInput {
            title: Some("PM-KISAN".to_string()),
            provider: Some("Government of India".to_string()),
            organization_name: Some("Ministry of Agriculture".to_string()),
            contact_name: Some("Helpdesk".to_string()),
            contact_email: Some("pmkisan-ict@gov.in".to_string()),
            contact_phone: Some("155261".to_string()),
            deadline: Some("2026-12-31".to_string()),
            description: Some("Income support for farmer families.".to_string()),
            eligibility: Some("Landholding farmer families.".to_string()),
            benefits: Some("6000 per year in three instalments.".to_string()),
            documents: Some("Aadhaar, land records".to_string()),
            application_process: Some("Apply through the portal.".to_string()),
            website: Some("https://pmkisan.gov.in".to_string()),
            tags: Some("income,support".to_string()),
        }
    }

    #[test]
    fn test_valid_scheme() {
        let scheme = valid_input().validate().unwrap();
        assert_eq!(scheme.deadline, NaiveDate::from_ymd_opt(2026, 12, 31));
        assert_eq!(scheme.organization_name, "Ministry of Agriculture");
    }

    #[test]
    fn test_optional_fields() {
        let mut input = valid_input();
        input.deadline = None;
        input.website = Some(String::new());
        let scheme = input.validate().unwrap();
        assert_eq!(scheme.deadline, None);
        assert_eq!(scheme.website, "");
    }

    #[test]
    fn test_field_errors_use_wire_names() {
        let mut input = valid_input();
        input.title = None;
        input.contact_email = Some("not-an-email".to_string());
        input.contact_phone = Some("0".repeat(21));
        input.deadline = Some("31/12/2026".to_string());
        input.website = Some("ftp://example.org".to_string());
        input.benefits = Some("   ".to_string());

        let errors = input.validate().unwrap_err();

        assert_eq!(errors["title"], vec![REQUIRED.to_string()]);
        assert_eq!(errors["benefits"], vec![BLANK.to_string()]);
        assert!(errors.contains_key("contactEmail"));
        assert!(errors.contains_key("contactPhone"));
        assert!(errors.contains_key("deadline"));
        assert!(errors.contains_key("website"));
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn test_serializes_camel_case_with_id() {
        let scheme = Scheme {
            id: 3,
            details: valid_input().validate().unwrap(),
        };
        let value = serde_json::to_value(&scheme).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["organizationName"], "Ministry of Agriculture");
        assert_eq!(value["deadline"], "2026-12-31");
        assert_eq!(value["applicationProcess"], "Apply through the portal.");
    }

    #[test]
    fn test_email_and_url_checks() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(is_valid_url("http://example.org/path"));
        assert!(is_valid_url("https://pmkisan.gov.in/?lang=en"));
        assert!(!is_valid_url("https://"));
        assert!(!is_valid_url("http://:80"));
        assert!(!is_valid_url("https://@"));
        assert!(!is_valid_url("https://?x"));
        assert!(!is_valid_url("ftp://example.org"));
        assert!(!is_valid_url("pmkisan.gov.in"));
    }
}
