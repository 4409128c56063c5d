//! Snapshot of the application store and the views derived from it

use std::collections::HashSet;

use crate::model::{JobApplication, JobStatus, Lifecycle, StatusFilter};

/// Immutable copy of the application store state
#[derive(Debug, Clone, Default)]
pub struct ApplicationsState {
    /// Most recently updated first, as fetched
    pub applications: Vec<JobApplication>,
    pub loading: bool,
    pub search_query: String,
    pub status_filter: StatusFilter,
    pub(crate) purging: HashSet<String>,
}

/// Dashboard counters over active records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub total: usize,
    pub oa: usize,
    pub interview: usize,
    /// Records in OA, Interview, Offer or Rejected
    pub responses: usize,
    /// Percentage of responses, rounded to the nearest integer
    pub response_rate: u32,
}

impl ApplicationsState {
    pub fn get(&self, id: &str) -> Option<&JobApplication> {
        self.applications.iter().find(|a| a.id == id)
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.applications.iter().position(|a| a.id == id)
    }

    /// Lifecycle of record `id`, `None` when it is not held locally
    pub fn lifecycle(&self, id: &str) -> Option<Lifecycle> {
        let record = self.get(id)?;
        if self.purging.contains(id) {
            Some(Lifecycle::PurgePending)
        } else {
            Some(record.lifecycle())
        }
    }

    pub fn active(&self) -> Vec<&JobApplication> {
        self.applications.iter().filter(|a| a.is_active()).collect()
    }

    pub fn trash(&self) -> Vec<&JobApplication> {
        self.applications.iter().filter(|a| a.is_trash).collect()
    }

    /// Active records matching the search query and the status filter
    pub fn filtered(&self) -> Vec<&JobApplication> {
        let needle = self.search_query.trim().to_lowercase();
        self.applications
            .iter()
            .filter(|a| a.is_active())
            .filter(|a| a.matches_query(&needle))
            .filter(|a| self.status_filter.matches(a.status))
            .collect()
    }

    /// Active records per pipeline stage, in pipeline order
    pub fn pipeline(&self) -> Vec<(JobStatus, Vec<&JobApplication>)> {
        JobStatus::PIPELINE
            .iter()
            .map(|stage| {
                let records = self
                    .applications
                    .iter()
                    .filter(|a| a.is_active() && a.status == *stage)
                    .collect();
                (*stage, records)
            })
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let active = self.active();
        let count = |status: JobStatus| active.iter().filter(|a| a.status == status).count();

        let total = active.len();
        let responses = active.iter().filter(|a| a.status.is_response()).count();
        let response_rate = if total == 0 {
            0
        } else {
            (responses as f64 * 100.0 / total as f64).round() as u32
        };

        Summary {
            total,
            oa: count(JobStatus::Oa),
            interview: count(JobStatus::Interview),
            responses,
            response_rate,
        }
    }
}
