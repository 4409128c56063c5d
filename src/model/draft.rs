//! Drafts for new applications and the insert payload built from them

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::JobStatus;

/// Everything a caller supplies to create an application.
/// `id`, `user_id` and `updated_at` come from the session and the server.
#[derive(Debug, Clone, PartialEq)]
pub struct NewApplication {
    pub company: String,
    pub role: String,
    pub status: JobStatus,
    pub applied_date: NaiveDate,
    pub follow_up_date: Option<NaiveDate>,
    pub jd_text: String,
    pub notes: String,
    pub resume_file_name: Option<String>,
    pub resume_text: Option<String>,
    pub skill_gaps: Vec<String>,
    pub application_url: Option<String>,
}

impl NewApplication {
    /// Draft applied today with status `Applied`
    pub fn new(company: &str, role: &str) -> Self {
        Self {
            company: company.to_string(),
            role: role.to_string(),
            status: JobStatus::Applied,
            applied_date: Utc::now().date_naive(),
            follow_up_date: None,
            jd_text: String::new(),
            notes: String::new(),
            resume_file_name: None,
            resume_text: None,
            skill_gaps: Vec::new(),
            application_url: None,
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_applied_date(mut self, date: NaiveDate) -> Self {
        self.applied_date = date;
        self
    }

    pub fn with_follow_up_date(mut self, date: NaiveDate) -> Self {
        self.follow_up_date = Some(date);
        self
    }

    pub fn with_jd_text(mut self, text: &str) -> Self {
        self.jd_text = text.to_string();
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_string();
        self
    }

    pub fn with_application_url(mut self, url: &str) -> Self {
        self.application_url = Some(url.to_string());
        self
    }

    pub fn with_skill_gaps<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skill_gaps = skills.into_iter().map(Into::into).collect();
        self
    }

    /// Checks the fields a form must enforce before calling `add_application`
    pub fn validate(&self) -> Result<()> {
        if self.company.trim().is_empty() {
            return Err(Error::validation("company is required"));
        }
        if self.role.trim().is_empty() {
            return Err(Error::validation("role is required"));
        }
        Ok(())
    }

    /// Build the insert payload for `user_id`.
    ///
    /// Optional strings are trimmed and dropped when blank so the remote store
    /// never receives empty strings. A half-present resume pair is dropped.
    pub fn into_record(self, user_id: &str) -> NewRecord {
        let mut resume_file_name = non_blank(self.resume_file_name);
        let mut resume_text = non_blank(self.resume_text);
        if resume_file_name.is_some() != resume_text.is_some() {
            log::debug!("Dropping incomplete resume fields from new application draft");
            resume_file_name = None;
            resume_text = None;
        }

        NewRecord {
            user_id: user_id.to_string(),
            company: self.company,
            role: self.role,
            status: self.status,
            applied_date: self.applied_date,
            follow_up_date: self.follow_up_date,
            jd_text: self.jd_text,
            notes: self.notes,
            resume_file_name,
            resume_text,
            skill_gaps: self.skill_gaps,
            application_url: non_blank(self.application_url),
            is_trash: false,
        }
    }
}

/// Insert payload for the applications table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewRecord {
    pub user_id: String,
    pub company: String,
    pub role: String,
    pub status: JobStatus,
    pub applied_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
    pub jd_text: String,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_text: Option<String>,
    pub skill_gaps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_url: Option<String>,
    pub is_trash: bool,
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
