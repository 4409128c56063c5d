//! Partial updates for an existing application

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::draft::non_blank;
use crate::model::JobStatus;

/// A partial update merged server-side.
///
/// `None` leaves a column alone. For clearable columns `Some(None)` is sent as
/// `null`. There is deliberately no field for `id`, `user_id` or `applied_date`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ApplicationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jd_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_file_name: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_text: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill_gaps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_url: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_trash: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ApplicationPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn company(mut self, company: &str) -> Self {
        self.company = Some(company.to_string());
        self
    }

    pub fn role(mut self, role: &str) -> Self {
        self.role = Some(role.to_string());
        self
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn follow_up_date(mut self, date: Option<NaiveDate>) -> Self {
        self.follow_up_date = Some(date);
        self
    }

    pub fn jd_text(mut self, text: &str) -> Self {
        self.jd_text = Some(text.to_string());
        self
    }

    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }

    pub fn skill_gaps(mut self, skills: Vec<String>) -> Self {
        self.skill_gaps = Some(skills);
        self
    }

    /// Set the posting URL; `None` or a blank string clears it
    pub fn application_url(mut self, url: Option<&str>) -> Self {
        self.application_url = Some(url.map(str::to_string));
        self
    }

    /// Attach an uploaded resume; both fields change together
    pub fn attach_resume(mut self, file_name: &str, public_url: &str) -> Self {
        self.resume_file_name = Some(Some(file_name.to_string()));
        self.resume_text = Some(Some(public_url.to_string()));
        self
    }

    /// Detach the resume; both fields are cleared together
    pub fn clear_resume(mut self) -> Self {
        self.resume_file_name = Some(None);
        self.resume_text = Some(None);
        self
    }

    pub(crate) fn trash(is_trash: bool) -> Self {
        Self {
            is_trash: Some(is_trash),
            ..Self::default()
        }
    }

    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn stamped(mut self, now: DateTime<Utc>) -> Self {
        self.updated_at = Some(now);
        self
    }

    /// Normalize blank optionals and enforce the record invariants.
    ///
    /// Blank `application_url` and resume values become explicit clears.
    /// The resume pair must be set together or cleared together.
    pub fn normalized(mut self) -> Result<Self> {
        if matches!(&self.company, Some(c) if c.trim().is_empty()) {
            return Err(Error::validation("company cannot be empty"));
        }
        if matches!(&self.role, Some(r) if r.trim().is_empty()) {
            return Err(Error::validation("role cannot be empty"));
        }

        self.application_url = self.application_url.map(non_blank);
        self.resume_file_name = self.resume_file_name.map(non_blank);
        self.resume_text = self.resume_text.map(non_blank);

        match (&self.resume_file_name, &self.resume_text) {
            (None, None) | (Some(Some(_)), Some(Some(_))) | (Some(None), Some(None)) => Ok(self),
            _ => Err(Error::validation(
                "resume_file_name and resume_text must be set or cleared together",
            )),
        }
    }
}
