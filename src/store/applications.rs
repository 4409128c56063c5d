//! The application store: the signed-in user's job applications

use chrono::Utc;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;

use super::view::ApplicationsState;
use super::StoreEvent;
use crate::auth::User;
use crate::error::{Error, Result};
use crate::gateway::{BlobGateway, IdentityGateway, RecordGateway};
use crate::model::{
    ApplicationPatch, JobApplication, JobStatus, Lifecycle, NewApplication, ResumeFile,
    StatusFilter,
};

/// In-memory collection of the current user's applications.
///
/// Every mutation goes to the gateway first; local state only changes once the
/// gateway succeeded, and observers hear about it afterwards. The state lock is
/// never held across an `.await`.
pub struct ApplicationStore {
    records: Arc<dyn RecordGateway>,
    blobs: Arc<dyn BlobGateway>,
    identity: Arc<dyn IdentityGateway>,
    resume_prefix: String,
    state: RwLock<ApplicationsState>,
    events: broadcast::Sender<StoreEvent>,
}

impl ApplicationStore {
    pub fn new(
        records: Arc<dyn RecordGateway>,
        blobs: Arc<dyn BlobGateway>,
        identity: Arc<dyn IdentityGateway>,
        resume_prefix: &str,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            records,
            blobs,
            identity,
            resume_prefix: resume_prefix.to_string(),
            state: RwLock::new(ApplicationsState {
                loading: true,
                ..ApplicationsState::default()
            }),
            events,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ApplicationsState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ApplicationsState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: StoreEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    /// Register an observer
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> ApplicationsState {
        self.read().clone()
    }

    pub fn get(&self, id: &str) -> Option<JobApplication> {
        self.read().get(id).cloned()
    }

    pub fn lifecycle(&self, id: &str) -> Option<Lifecycle> {
        self.read().lifecycle(id)
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    fn require(&self, id: &str) -> Result<JobApplication> {
        self.get(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn signed_in_user(&self) -> Result<User> {
        self.identity
            .current_user()
            .await
            .map_err(Error::into_auth)?
            .ok_or_else(|| Error::auth("no signed-in user"))
    }

    fn set_loading(&self, loading: bool) {
        self.write().loading = loading;
        self.emit(StoreEvent::LoadingChanged(loading));
    }

    /// Replace the collection with the signed-in user's records.
    ///
    /// Failures are logged and leave the previous records in place.
    pub async fn fetch_applications(&self) {
        self.set_loading(true);

        let fetched: Result<Vec<JobApplication>> = async {
            let user = self.signed_in_user().await?;
            self.records.list_records(&user.id).await
        }
        .await;

        match fetched {
            Ok(records) => {
                let count = records.len();
                {
                    let mut state = self.write();
                    state.applications = records;
                    state.loading = false;
                }
                log::debug!("Fetched {} applications", count);
                self.emit(StoreEvent::Replaced { count });
                self.emit(StoreEvent::LoadingChanged(false));
            }
            Err(e) => {
                log::error!("Failed to fetch applications: {}", e);
                self.set_loading(false);
            }
        }
    }

    /// Create an application for the signed-in user and prepend it
    pub async fn add_application(&self, draft: NewApplication) -> Result<JobApplication> {
        let user = self.signed_in_user().await?;
        let record = draft.into_record(&user.id);

        let created = self
            .records
            .create_record(&record)
            .await
            .map_err(Error::into_persistence)?;

        self.write().applications.insert(0, created.clone());
        log::info!("Added application {} at {}", created.id, created.company);
        self.emit(StoreEvent::Inserted {
            id: created.id.clone(),
        });
        Ok(created)
    }

    /// Merge `patch` into record `id` and keep the canonical result.
    /// The record keeps its position in the collection.
    pub async fn update_application(
        &self,
        id: &str,
        patch: ApplicationPatch,
    ) -> Result<JobApplication> {
        let patch = patch.normalized()?;
        self.require(id)?;

        let updated = self
            .records
            .update_record(id, &patch.stamped(Utc::now()))
            .await
            .map_err(Error::into_persistence)?;

        let replaced = {
            let mut state = self.write();
            match state.position(id) {
                Some(index) => {
                    state.applications[index] = updated.clone();
                    true
                }
                None => false,
            }
        };
        if replaced {
            self.emit(StoreEvent::Updated { id: id.to_string() });
        } else {
            log::debug!("Application {} left local state during update", id);
        }
        Ok(updated)
    }

    pub async fn set_status(&self, id: &str, status: JobStatus) -> Result<JobApplication> {
        self.update_application(id, ApplicationPatch::new().status(status))
            .await
    }

    /// Append a skill gap. Blank input changes nothing.
    pub async fn add_skill_gap(&self, id: &str, skill: &str) -> Result<JobApplication> {
        let current = self.require(id)?;
        let skill = skill.trim();
        if skill.is_empty() {
            return Ok(current);
        }

        let mut skills = current.skill_gaps;
        skills.push(skill.to_string());
        self.update_application(id, ApplicationPatch::new().skill_gaps(skills))
            .await
    }

    /// Remove every occurrence of `skill`
    pub async fn remove_skill_gap(&self, id: &str, skill: &str) -> Result<JobApplication> {
        let current = self.require(id)?;
        if !current.skill_gaps.iter().any(|s| s == skill) {
            return Ok(current);
        }

        let skills = current
            .skill_gaps
            .into_iter()
            .filter(|s| s != skill)
            .collect();
        self.update_application(id, ApplicationPatch::new().skill_gaps(skills))
            .await
    }

    /// Detach the resume. The stored file is left in place.
    pub async fn clear_resume(&self, id: &str) -> Result<JobApplication> {
        self.update_application(id, ApplicationPatch::new().clear_resume())
            .await
    }

    /// Soft-delete (`true`) or restore (`false`) a record
    pub async fn move_to_trash(&self, id: &str, is_trash: bool) -> Result<()> {
        let lifecycle = self
            .lifecycle(id)
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        if lifecycle == Lifecycle::PurgePending {
            return Err(Error::Lifecycle(format!("application {} is being purged", id)));
        }

        self.records
            .touch_record(id, &ApplicationPatch::trash(is_trash).stamped(Utc::now()))
            .await
            .map_err(Error::into_persistence)?;

        let toggled = {
            let mut state = self.write();
            match state.position(id) {
                Some(index) => {
                    state.applications[index].is_trash = is_trash;
                    true
                }
                None => false,
            }
        };
        if toggled {
            self.emit(StoreEvent::TrashToggled {
                id: id.to_string(),
                is_trash,
            });
        }
        Ok(())
    }

    pub async fn restore_from_trash(&self, id: &str) -> Result<()> {
        self.move_to_trash(id, false).await
    }

    /// Permanently delete a trashed record.
    ///
    /// Only records in trash can be purged. While the delete is in flight the
    /// record is `PurgePending`; on failure it goes back to `Trashed`.
    pub async fn purge_from_trash(&self, id: &str) -> Result<()> {
        {
            let mut state = self.write();
            match state.lifecycle(id) {
                None => return Err(Error::NotFound(id.to_string())),
                Some(Lifecycle::Active) => {
                    return Err(Error::Lifecycle(format!(
                        "application {} must be in trash before it can be purged",
                        id
                    )))
                }
                Some(Lifecycle::PurgePending) => {
                    return Err(Error::Lifecycle(format!(
                        "application {} is already being purged",
                        id
                    )))
                }
                Some(Lifecycle::Trashed) => {
                    state.purging.insert(id.to_string());
                }
            }
        }
        self.emit(StoreEvent::PurgeStarted { id: id.to_string() });

        match self.records.delete_record(id).await {
            Ok(()) => {
                {
                    let mut state = self.write();
                    state.purging.remove(id);
                    state.applications.retain(|a| a.id != id);
                }
                log::info!("Purged application {}", id);
                self.emit(StoreEvent::Purged { id: id.to_string() });
                Ok(())
            }
            Err(e) => {
                self.write().purging.remove(id);
                log::warn!("Purge of application {} failed: {}", id, e);
                self.emit(StoreEvent::PurgeReverted { id: id.to_string() });
                Err(e.into_persistence())
            }
        }
    }

    /// Upload a resume and attach it to record `id`. Returns the public URL.
    ///
    /// If attaching fails the uploaded file is removed again, best-effort.
    pub async fn upload_resume(&self, id: &str, file: ResumeFile) -> Result<String> {
        self.require(id)?;
        let path = file.storage_path(&self.resume_prefix, id);

        self.blobs
            .upload_blob(&path, file.bytes.clone(), &file.content_type)
            .await
            .map_err(Error::into_upload)?;

        let attached = match self.blobs.public_url(&path).await {
            Ok(url) => self
                .update_application(id, ApplicationPatch::new().attach_resume(&file.name, &url))
                .await
                .map(|_| url),
            Err(e) => Err(e.into_upload()),
        };

        if attached.is_err() {
            if let Err(e) = self.blobs.remove_blob(&path).await {
                log::warn!("Failed to remove orphaned resume {}: {}", path, e);
            }
        }
        attached
    }

    pub fn set_search_query(&self, query: &str) {
        {
            let mut state = self.write();
            if state.search_query == query {
                return;
            }
            state.search_query = query.to_string();
        }
        self.emit(StoreEvent::SearchChanged);
    }

    pub fn set_status_filter(&self, filter: StatusFilter) {
        {
            let mut state = self.write();
            if state.status_filter == filter {
                return;
            }
            state.status_filter = filter;
        }
        self.emit(StoreEvent::FilterChanged);
    }

    /// Drop every local record, e.g. after sign-out
    pub fn clear(&self) {
        {
            let mut state = self.write();
            state.applications.clear();
            state.purging.clear();
        }
        self.emit(StoreEvent::Cleared);
    }
}
