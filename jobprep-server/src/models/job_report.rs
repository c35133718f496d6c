//! Job report records and creation-request validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type JobReportId = i64;

const COMPANY_MAX_CHARS: usize = 100;
const TITLE_MAX_CHARS: usize = 150;
const DESCRIPTION_MIN_CHARS: usize = 50;
/// A description may repeat one character at most this many times in a row
const DESCRIPTION_MAX_RUN: usize = 10;

/// Persisted job report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub id: JobReportId,
    pub company: String,
    pub title: String,
    pub description: String,
    /// External pipeline session, set once the pipeline accepts the job
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl JobReport {
    pub fn job_info(&self) -> String {
        format_job_info(&self.company, &self.title, &self.description)
    }
}

/// Validated fields for a new job report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJobReport {
    pub company: String,
    pub title: String,
    pub description: String,
    /// Where the pipeline posts its callbacks
    pub callback_url: String,
}

impl NewJobReport {
    pub fn job_info(&self) -> String {
        format_job_info(&self.company, &self.title, &self.description)
    }
}

/// Canonical textual job description sent to the interview pipeline
pub fn format_job_info(company: &str, title: &str, description: &str) -> String {
    format!(
        "Company: {}\nTitle: {}\nDescription: {}",
        company.trim(),
        title.trim(),
        description.trim()
    )
}

/// POST /api/jobReport/create body.
///
/// Fields default to empty so that a missing field reports as a validation
/// error instead of a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobReportRequest {
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub callback_url: String,
}

impl JobReportRequest {
    /// Check every field and collect all problems before rejecting.
    pub fn validate(&self) -> Result<NewJobReport, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let company = self.company.trim();
        if company.is_empty() {
            errors.push("company", "company must not be blank");
        } else {
            if company.chars().count() > COMPANY_MAX_CHARS {
                errors.push("company", format!("company must be at most {} characters", COMPANY_MAX_CHARS));
            }
            if !company.chars().all(is_company_char) {
                errors.push("company", "company contains invalid characters");
            }
        }

        let title = self.title.trim();
        if title.is_empty() {
            errors.push("title", "title must not be blank");
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.push("title", format!("title must be at most {} characters", TITLE_MAX_CHARS));
        }

        let description = self.description.trim();
        if description.is_empty() {
            errors.push("description", "description must not be blank");
        } else {
            if description.chars().count() < DESCRIPTION_MIN_CHARS {
                errors.push(
                    "description",
                    format!("description must be at least {} characters", DESCRIPTION_MIN_CHARS),
                );
            }
            if longest_char_run(description) > DESCRIPTION_MAX_RUN {
                errors.push("description", "description repeats a character excessively");
            }
        }

        let callback_url = self.callback_url.trim();
        if callback_url.is_empty() {
            errors.push("callback_url", "callback_url must not be blank");
        } else if !(callback_url.starts_with("http://") || callback_url.starts_with("https://")) {
            errors.push("callback_url", "callback_url must be an http(s) URL");
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(NewJobReport {
            company: company.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            callback_url: callback_url.to_string(),
        })
    }
}

/// Letters (ASCII and Latin-1 accented), digits, space and `. , & -`
fn is_company_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || ('\u{C0}'..='\u{FF}').contains(&c) || matches!(c, ' ' | '.' | ',' | '&' | '-')
}

fn longest_char_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<char> = None;

    for c in text.chars() {
        if previous == Some(c) {
            current += 1;
        } else {
            current = 1;
            previous = Some(c);
        }
        longest = longest.max(current);
    }

    longest
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All field problems found in one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> JobReportRequest {
        JobReportRequest {
            company: "Acme & Sons, Ltda.".to_string(),
            title: "Backend Engineer".to_string(),
            description: "Build and operate the services behind our interview practice product.".to_string(),
            callback_url: "https://backend.example/api/jobReport/callback/audios-ready".to_string(),
        }
    }

    #[test]
    fn test_valid_request_passes_and_trims() {
        let mut request = valid_request();
        request.title = "  Backend Engineer  ".to_string();

        let new_report = request.validate().unwrap();
        assert_eq!(new_report.title, "Backend Engineer");
        assert_eq!(new_report.company, "Acme & Sons, Ltda.");
    }

    #[test]
    fn test_accented_company_is_allowed() {
        let mut request = valid_request();
        request.company = "Ação Ágil".to_string();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_missing_fields_all_reported() {
        let errors = JobReportRequest::default().validate().unwrap_err();
        assert!(errors.has_field("company"));
        assert!(errors.has_field("title"));
        assert!(errors.has_field("description"));
        assert!(errors.has_field("callback_url"));
    }

    #[test]
    fn test_company_rules() {
        let mut request = valid_request();
        request.company = "Acme<script>".to_string();
        assert!(request.validate().unwrap_err().has_field("company"));

        request.company = "A".repeat(101);
        assert!(request.validate().unwrap_err().has_field("company"));

        request.company = "A".repeat(100);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_title_length_limit() {
        let mut request = valid_request();
        request.title = "t".repeat(151);
        assert!(request.validate().unwrap_err().has_field("title"));
    }

    #[test]
    fn test_description_rules() {
        let mut request = valid_request();
        request.description = "Too short".to_string();
        assert!(request.validate().unwrap_err().has_field("description"));

        request.description = format!("{} {}", "a".repeat(11), "x".repeat(50));
        assert!(request.validate().unwrap_err().has_field("description"));

        request.description = format!("{} {}", "a".repeat(10), "xy".repeat(25));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_callback_url_must_be_http() {
        let mut request = valid_request();
        request.callback_url = "ftp://example.com/cb".to_string();
        assert!(request.validate().unwrap_err().has_field("callback_url"));
    }

    #[test]
    fn test_job_info_format() {
        let info = format_job_info(" Acme ", "Engineer", "Does things");
        assert_eq!(info, "Company: Acme\nTitle: Engineer\nDescription: Does things");
    }

    #[test]
    fn test_longest_char_run() {
        assert_eq!(longest_char_run(""), 0);
        assert_eq!(longest_char_run("abc"), 1);
        assert_eq!(longest_char_run("abbbc"), 3);
    }
}
