//! The persisted job application record and its status

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Where an application stands in the hiring process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobStatus {
    #[default]
    Applied,
    /// Online assessment
    #[serde(rename = "OA")]
    Oa,
    Interview,
    Offer,
    Rejected,
    Ghosted,
}

impl JobStatus {
    /// Every status, in display order
    pub const ALL: [JobStatus; 6] = [
        JobStatus::Applied,
        JobStatus::Oa,
        JobStatus::Interview,
        JobStatus::Offer,
        JobStatus::Rejected,
        JobStatus::Ghosted,
    ];

    /// The ordered stages shown in the pipeline view.
    /// Any status is still a legal transition target.
    pub const PIPELINE: [JobStatus; 4] = [
        JobStatus::Applied,
        JobStatus::Oa,
        JobStatus::Interview,
        JobStatus::Offer,
    ];

    /// Convert the status to its wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Applied => "Applied",
            JobStatus::Oa => "OA",
            JobStatus::Interview => "Interview",
            JobStatus::Offer => "Offer",
            JobStatus::Rejected => "Rejected",
            JobStatus::Ghosted => "Ghosted",
        }
    }

    /// Whether the employer answered in any way
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            JobStatus::Oa | JobStatus::Interview | JobStatus::Offer | JobStatus::Rejected
        )
    }

    /// Position in the pipeline view, `None` for off-pipeline outcomes
    pub fn pipeline_stage(&self) -> Option<usize> {
        Self::PIPELINE.iter().position(|s| s == self)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        JobStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::validation(format!("unknown status '{}'", s)))
    }
}

/// Status filter of the list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(JobStatus),
}

impl StatusFilter {
    /// Whether a status passes the filter
    pub fn matches(&self, status: JobStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl From<JobStatus> for StatusFilter {
    fn from(status: JobStatus) -> Self {
        StatusFilter::Only(status)
    }
}

impl FromStr for StatusFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Soft-delete lifecycle of a record.
///
/// `Active` and `Trashed` toggle freely. `PurgePending` only exists while a hard
/// delete is in flight; it ends with the record gone, or back in `Trashed` if the
/// delete failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Trashed,
    PurgePending,
}

/// A job application as stored remotely
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobApplication {
    pub id: String,
    pub user_id: String,
    pub company: String,
    pub role: String,
    #[serde(default)]
    pub status: JobStatus,
    pub applied_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub jd_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub resume_file_name: Option<String>,
    /// Public URL of the uploaded resume
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub resume_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skill_gaps: Vec<String>,
    #[serde(
        default,
        deserialize_with = "blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub application_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_trash: bool,
    pub updated_at: DateTime<Utc>,
}

impl JobApplication {
    /// Soft-delete state as recorded on the row
    pub fn lifecycle(&self) -> Lifecycle {
        if self.is_trash {
            Lifecycle::Trashed
        } else {
            Lifecycle::Active
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_trash
    }

    /// A resume counts as attached only when both fields are present
    pub fn has_resume(&self) -> bool {
        self.resume_file_name.is_some() && self.resume_text.is_some()
    }

    /// Whether the record was touched on a later day than it was applied
    pub fn was_modified(&self) -> bool {
        self.updated_at.date_naive() != self.applied_date
    }

    /// Case-insensitive substring match on company or role.
    /// `needle` must already be lowercase.
    pub(crate) fn matches_query(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.company.to_lowercase().contains(needle)
            || self.role.to_lowercase().contains(needle)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> serde_json::Value {
        json!({
            "id": "app-1",
            "user_id": "user-1",
            "company": "Acme",
            "role": "Backend Engineer",
            "status": "OA",
            "applied_date": "2024-03-01",
            "jd_text": null,
            "notes": "call back",
            "resume_text": "",
            "resume_file_name": null,
            "skill_gaps": null,
            "application_url": "  ",
            "is_trash": false,
            "updated_at": "2024-03-02T10:00:00+00:00"
        })
    }

    #[test]
    fn deserializes_store_rows_leniently() {
        let app: JobApplication = serde_json::from_value(row()).unwrap();
        assert_eq!(app.status, JobStatus::Oa);
        assert_eq!(app.jd_text, "");
        assert_eq!(app.notes, "call back");
        assert!(app.resume_text.is_none());
        assert!(app.application_url.is_none());
        assert!(app.skill_gaps.is_empty());
        assert_eq!(app.lifecycle(), Lifecycle::Active);
        assert!(app.was_modified());
    }

    #[test]
    fn status_wire_names() {
        assert_eq!(serde_json::to_value(JobStatus::Oa).unwrap(), json!("OA"));
        assert_eq!("interview".parse::<JobStatus>().unwrap(), JobStatus::Interview);
        assert_eq!("OA".parse::<JobStatus>().unwrap(), JobStatus::Oa);
        assert!("Hired".parse::<JobStatus>().is_err());
        assert_eq!(JobStatus::Offer.to_string(), "Offer");
    }

    #[test]
    fn responses_and_pipeline() {
        let responded: Vec<_> = JobStatus::ALL.iter().filter(|s| s.is_response()).collect();
        assert_eq!(
            responded,
            vec![
                &JobStatus::Oa,
                &JobStatus::Interview,
                &JobStatus::Offer,
                &JobStatus::Rejected
            ]
        );
        assert_eq!(JobStatus::Interview.pipeline_stage(), Some(2));
        assert_eq!(JobStatus::Ghosted.pipeline_stage(), None);
    }

    #[test]
    fn status_filter_parsing() {
        assert_eq!("All".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        let filter: StatusFilter = "Interview".parse().unwrap();
        assert!(filter.matches(JobStatus::Interview));
        assert!(!filter.matches(JobStatus::Applied));
        assert!(StatusFilter::All.matches(JobStatus::Ghosted));
    }
}
