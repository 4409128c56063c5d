#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};

use jobtrail::auth::{Session, SessionChange, SessionEvent, User};
use jobtrail::config::TrackerOptions;
use jobtrail::error::{Error, Result};
use jobtrail::gateway::{BlobGateway, IdentityGateway, RecordGateway};
use jobtrail::model::{ApplicationPatch, JobApplication, NewRecord};
use jobtrail::JobTracker;

/// Gateway operations that can be failed, held or counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Create,
    Update,
    Touch,
    Delete,
    DeleteOwner,
    Upload,
    PublicUrl,
    RemoveBlob,
    CurrentUser,
    SignOut,
    DeleteAccount,
}

/// In-memory stand-in for the hosted backend
pub struct MemoryGateway {
    rows: Mutex<Vec<JobApplication>>,
    blobs: Mutex<HashMap<String, (Bytes, String)>>,
    user: Mutex<Option<User>>,
    sessions: broadcast::Sender<SessionChange>,
    failing: Mutex<HashSet<Op>>,
    gates: Mutex<HashMap<Op, Arc<Notify>>>,
    calls: Mutex<Vec<Op>>,
    patches: Mutex<Vec<(Op, ApplicationPatch)>>,
    next_id: AtomicU64,
    clock: AtomicI64,
}

impl MemoryGateway {
    pub fn new() -> Arc<Self> {
        let (sessions, _) = broadcast::channel(16);
        Arc::new(Self {
            rows: Mutex::new(Vec::new()),
            blobs: Mutex::new(HashMap::new()),
            user: Mutex::new(None),
            sessions,
            failing: Mutex::new(HashSet::new()),
            gates: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            patches: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            clock: AtomicI64::new(0),
        })
    }

    /// A gateway with `user-1` already signed in
    pub fn signed_in() -> Arc<Self> {
        let gateway = Self::new();
        *gateway.user.lock().unwrap() = Some(user("user-1"));
        gateway
    }

    pub fn fail(&self, op: Op) {
        self.failing.lock().unwrap().insert(op);
    }

    pub fn heal(&self, op: Op) {
        self.failing.lock().unwrap().remove(&op);
    }

    /// Block calls to `op` until `release(op)`
    pub fn hold(&self, op: Op) {
        self.gates
            .lock()
            .unwrap()
            .insert(op, Arc::new(Notify::new()));
    }

    pub fn release(&self, op: Op) {
        if let Some(gate) = self.gates.lock().unwrap().remove(&op) {
            gate.notify_one();
        }
    }

    /// Stop holding new calls to `op`. Calls already held stay blocked until
    /// the returned gate is notified.
    pub fn detach(&self, op: Op) -> Option<Arc<Notify>> {
        self.gates.lock().unwrap().remove(&op)
    }

    pub fn calls(&self, op: Op) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    /// Wait until `op` has been entered `n` times
    pub async fn wait_for_calls(&self, op: Op, n: usize) {
        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while self.calls(op) < n {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for gateway call");
    }

    /// The last patch received by `op`, exactly as sent
    pub fn last_patch(&self, op: Op) -> Option<ApplicationPatch> {
        self.patches
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(o, _)| *o == op)
            .map(|(_, patch)| patch.clone())
    }

    pub fn rows(&self) -> Vec<JobApplication> {
        self.rows.lock().unwrap().clone()
    }

    pub fn row(&self, id: &str) -> Option<JobApplication> {
        self.rows().into_iter().find(|r| r.id == id)
    }

    pub fn blob_paths(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    /// Seed a row as if it had been created earlier
    pub fn seed(&self, owner: &str, company: &str, role: &str) -> JobApplication {
        let record = jobtrail::model::NewApplication::new(company, role).into_record(owner);
        let row = self.materialize(&record);
        self.rows.lock().unwrap().push(row.clone());
        row
    }

    pub fn sign_in(&self, user: User) {
        *self.user.lock().unwrap() = Some(user.clone());
        let _ = self.sessions.send(SessionChange::new(
            SessionEvent::SignedIn,
            Some(session(user)),
        ));
    }

    pub fn emit_signed_out(&self) {
        *self.user.lock().unwrap() = None;
        let _ = self
            .sessions
            .send(SessionChange::new(SessionEvent::SignedOut, None));
    }

    fn tick(&self) -> DateTime<Utc> {
        let n = self.clock.fetch_add(1, Ordering::SeqCst);
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap() + Duration::seconds(n)
    }

    fn materialize(&self, record: &NewRecord) -> JobApplication {
        let id = format!("app-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        JobApplication {
            id,
            user_id: record.user_id.clone(),
            company: record.company.clone(),
            role: record.role.clone(),
            status: record.status,
            applied_date: record.applied_date,
            follow_up_date: record.follow_up_date,
            jd_text: record.jd_text.clone(),
            notes: record.notes.clone(),
            resume_file_name: record.resume_file_name.clone(),
            resume_text: record.resume_text.clone(),
            skill_gaps: record.skill_gaps.clone(),
            application_url: record.application_url.clone(),
            is_trash: record.is_trash,
            updated_at: self.tick(),
        }
    }

    async fn enter(&self, op: Op) -> Result<()> {
        self.calls.lock().unwrap().push(op);
        let gate = self.gates.lock().unwrap().get(&op).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.lock().unwrap().contains(&op) {
            return Err(match op {
                Op::Upload | Op::PublicUrl | Op::RemoveBlob => {
                    Error::upload(format!("{:?} failed", op))
                }
                Op::CurrentUser | Op::SignOut | Op::DeleteAccount => {
                    Error::auth(format!("{:?} failed", op))
                }
                _ => Error::persistence(format!("{:?} failed", op)),
            });
        }
        Ok(())
    }

    fn merge(&self, id: &str, patch: &ApplicationPatch) -> Result<JobApplication> {
        let stamped = self.tick();
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::persistence(format!("no row {}", id)))?;

        if let Some(v) = &patch.company {
            row.company = v.clone();
        }
        if let Some(v) = &patch.role {
            row.role = v.clone();
        }
        if let Some(v) = patch.status {
            row.status = v;
        }
        if let Some(v) = patch.follow_up_date {
            row.follow_up_date = v;
        }
        if let Some(v) = &patch.jd_text {
            row.jd_text = v.clone();
        }
        if let Some(v) = &patch.notes {
            row.notes = v.clone();
        }
        if let Some(v) = &patch.resume_file_name {
            row.resume_file_name = v.clone();
        }
        if let Some(v) = &patch.resume_text {
            row.resume_text = v.clone();
        }
        if let Some(v) = &patch.skill_gaps {
            row.skill_gaps = v.clone();
        }
        if let Some(v) = &patch.application_url {
            row.application_url = v.clone();
        }
        if let Some(v) = patch.is_trash {
            row.is_trash = v;
        }
        row.updated_at = stamped;
        Ok(row.clone())
    }
}

pub fn user(id: &str) -> User {
    User {
        email: Some(format!("{}@example.com", id)),
        ..User::with_id(id)
    }
}

pub fn session(user: User) -> Session {
    Session {
        access_token: format!("token-{}", user.id),
        refresh_token: "refresh".to_string(),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        expires_at: None,
        user,
    }
}

/// Tracker over `gateway` with default options
pub fn tracker(gateway: &Arc<MemoryGateway>) -> JobTracker {
    JobTracker::with_gateway(gateway.clone(), &TrackerOptions::default())
}

#[async_trait]
impl RecordGateway for MemoryGateway {
    async fn list_records(&self, owner_id: &str) -> Result<Vec<JobApplication>> {
        self.enter(Op::List).await?;
        let mut rows: Vec<_> = self
            .rows()
            .into_iter()
            .filter(|r| r.user_id == owner_id)
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows)
    }

    async fn create_record(&self, record: &NewRecord) -> Result<JobApplication> {
        self.enter(Op::Create).await?;
        let row = self.materialize(record);
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update_record(&self, id: &str, patch: &ApplicationPatch) -> Result<JobApplication> {
        self.patches.lock().unwrap().push((Op::Update, patch.clone()));
        self.enter(Op::Update).await?;
        self.merge(id, patch)
    }

    async fn touch_record(&self, id: &str, patch: &ApplicationPatch) -> Result<()> {
        self.patches.lock().unwrap().push((Op::Touch, patch.clone()));
        self.enter(Op::Touch).await?;
        self.merge(id, patch).map(|_| ())
    }

    async fn delete_record(&self, id: &str) -> Result<()> {
        self.enter(Op::Delete).await?;
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn delete_records_for_owner(&self, owner_id: &str) -> Result<()> {
        self.enter(Op::DeleteOwner).await?;
        self.rows.lock().unwrap().retain(|r| r.user_id != owner_id);
        Ok(())
    }
}

#[async_trait]
impl BlobGateway for MemoryGateway {
    async fn upload_blob(&self, path: &str, bytes: Bytes, content_type: &str) -> Result<()> {
        self.enter(Op::Upload).await?;
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn public_url(&self, path: &str) -> Result<String> {
        self.enter(Op::PublicUrl).await?;
        Ok(format!("https://cdn.test/resumes/{}", path))
    }

    async fn remove_blob(&self, path: &str) -> Result<()> {
        self.enter(Op::RemoveBlob).await?;
        self.blobs.lock().unwrap().remove(path);
        Ok(())
    }
}

#[async_trait]
impl IdentityGateway for MemoryGateway {
    async fn current_user(&self) -> Result<Option<User>> {
        self.enter(Op::CurrentUser).await?;
        Ok(self.user.lock().unwrap().clone())
    }

    fn subscribe_sessions(&self) -> broadcast::Receiver<SessionChange> {
        self.sessions.subscribe()
    }

    async fn sign_out(&self) -> Result<()> {
        self.enter(Op::SignOut).await?;
        self.emit_signed_out();
        Ok(())
    }

    async fn delete_account(&self) -> Result<()> {
        self.enter(Op::DeleteAccount).await
    }
}

/// Next broadcast value, failing the test after a few seconds
pub async fn next_event<T: Clone>(events: &mut broadcast::Receiver<T>) -> T {
    tokio::time::timeout(std::time::Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}
