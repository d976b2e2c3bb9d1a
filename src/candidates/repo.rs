use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    migrate::{decode_collection, email_taken},
    repo_types::{normalize_email, Candidate, CandidateDraft, DEFAULT_PROFILE_IMAGE},
    services::{within_edit_window, EditWindowStatus},
};
use crate::{
    clock::Clock,
    error::{AppError, AppResult},
    storage::KeyValueStore,
};

pub type Snapshot = Arc<Vec<Candidate>>;

/// Owns the candidate collection. Every successful mutation rewrites the
/// whole JSON array under one key and then publishes a new snapshot.
/// The lock is held across the write, so store calls never interleave.
pub struct CandidateStore {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: String,
    candidates: Mutex<Vec<Candidate>>,
    snapshots: watch::Sender<Snapshot>,
}

impl CandidateStore {
    /// Reads and normalizes the persisted collection.
    ///
    /// Unreadable JSON does not abort startup: the store starts empty and
    /// the raw blob is copied to `<key>.corrupt` before anything can
    /// overwrite it.
    pub async fn load(
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        key: impl Into<String>,
    ) -> AppResult<Self> {
        let key = key.into();
        let candidates = match kv.get(&key).await? {
            None => Vec::new(),
            Some(blob) => match decode_collection(&blob, clock.today()) {
                Ok(decoded) => {
                    info!(
                        key = %key,
                        count = decoded.candidates.len(),
                        upgraded = decoded.upgraded,
                        skipped = decoded.skipped,
                        "candidates loaded"
                    );
                    decoded.candidates
                }
                Err(e) => {
                    let backup = format!("{key}.corrupt");
                    warn!(key = %key, backup = %backup, error = %e, "persisted candidates unreadable; starting empty");
                    kv.set(&backup, &blob).await?;
                    Vec::new()
                }
            },
        };

        let (snapshots, _) = watch::channel(Arc::new(candidates.clone()));
        Ok(Self {
            kv,
            clock,
            key,
            candidates: Mutex::new(candidates),
            snapshots,
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub async fn list(&self) -> Vec<Candidate> {
        self.candidates.lock().await.clone()
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Candidate> {
        self.candidates
            .lock()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    pub async fn get_by_email(&self, email: &str) -> Option<Candidate> {
        let wanted = normalize_email(email);
        self.candidates
            .lock()
            .await
            .iter()
            .find(|c| c.normalized_email() == wanted)
            .cloned()
    }

    pub async fn create(&self, draft: CandidateDraft) -> AppResult<Candidate> {
        let mut guard = self.candidates.lock().await;
        if email_taken(&guard, &draft.email, None) {
            debug!(email = %draft.email, "create rejected: duplicate email");
            return Err(AppError::DuplicateEmail(draft.email));
        }

        let candidate = Candidate {
            id: Uuid::new_v4().to_string(),
            full_name: draft.full_name,
            email: draft.email,
            phone: draft.phone,
            date_of_birth: draft.date_of_birth,
            city: draft.city,
            hobbies: draft.hobbies,
            why_perfect: draft.why_perfect,
            profile_image: draft
                .profile_image
                .unwrap_or_else(|| DEFAULT_PROFILE_IMAGE.to_string()),
            submission_date: self.clock.now(),
            last_edit_date: None,
        };

        let mut next = guard.clone();
        next.push(candidate.clone());
        self.commit(&mut guard, next).await?;
        info!(id = %candidate.id, "candidate created");
        Ok(candidate)
    }

    /// Replaces the record with `id`, keeping its id and submission date.
    pub async fn update(&self, id: &str, draft: CandidateDraft) -> AppResult<Candidate> {
        let mut guard = self.candidates.lock().await;
        let Some(index) = guard.iter().position(|c| c.id == id) else {
            return Err(AppError::NotFound(id.to_string()));
        };

        let now = self.clock.now();
        let existing = &guard[index];
        if !within_edit_window(existing.submission_date, now) {
            debug!(%id, "update rejected: edit window expired");
            return Err(AppError::EditWindowExpired(id.to_string()));
        }
        if email_taken(&guard, &draft.email, Some(id)) {
            return Err(AppError::DuplicateEmail(draft.email));
        }

        let updated = Candidate {
            id: existing.id.clone(),
            full_name: draft.full_name,
            email: draft.email,
            phone: draft.phone,
            date_of_birth: draft.date_of_birth,
            city: draft.city,
            hobbies: draft.hobbies,
            why_perfect: draft.why_perfect,
            profile_image: draft
                .profile_image
                .unwrap_or_else(|| existing.profile_image.clone()),
            submission_date: existing.submission_date,
            last_edit_date: Some(now),
        };

        let mut next = guard.clone();
        next[index] = updated.clone();
        self.commit(&mut guard, next).await?;
        info!(%id, "candidate updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> AppResult<Candidate> {
        let mut guard = self.candidates.lock().await;
        let Some(index) = guard.iter().position(|c| c.id == id) else {
            return Err(AppError::NotFound(id.to_string()));
        };
        let mut next = guard.clone();
        let removed = next.remove(index);
        self.commit(&mut guard, next).await?;
        info!(%id, "candidate deleted");
        Ok(removed)
    }

    pub async fn clear_all(&self) -> AppResult<()> {
        let mut guard = self.candidates.lock().await;
        self.kv.remove(&self.key).await?;
        guard.clear();
        self.snapshots.send_replace(Arc::new(Vec::new()));
        info!("all candidates cleared");
        Ok(())
    }

    pub async fn edit_window_status(&self, email: &str) -> EditWindowStatus {
        match self.get_by_email(email).await {
            Some(c) => EditWindowStatus::for_submission(c.submission_date, self.clock.now()),
            None => EditWindowStatus::not_found(),
        }
    }

    /// Persists `next`, then swaps it in and publishes. On a failed write
    /// neither the in-memory list nor the snapshot changes.
    async fn commit(&self, current: &mut Vec<Candidate>, next: Vec<Candidate>) -> AppResult<()> {
        let json = serde_json::to_string(&next)?;
        self.kv.set(&self.key, &json).await?;
        *current = next;
        self.snapshots.send_replace(Arc::new(current.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::testing::ManualClock, storage::MemoryKeyValueStore};
    use async_trait::async_trait;
    use time::{
        macros::{date, datetime},
        Duration,
    };

    const KEY: &str = "candidates";

    fn draft(email: &str) -> CandidateDraft {
        CandidateDraft {
            full_name: "Dana Levi".into(),
            email: email.into(),
            phone: "050-1234567".into(),
            date_of_birth: date!(1995 - 06 - 15),
            city: "Haifa".into(),
            hobbies: "climbing".into(),
            why_perfect: "curious".into(),
            profile_image: None,
        }
    }

    struct Fixture {
        kv: Arc<MemoryKeyValueStore>,
        clock: Arc<ManualClock>,
        store: CandidateStore,
    }

    async fn fixture() -> Fixture {
        fixture_with(MemoryKeyValueStore::new()).await
    }

    async fn fixture_with(kv: MemoryKeyValueStore) -> Fixture {
        let kv = Arc::new(kv);
        let clock = Arc::new(ManualClock::at(datetime!(2024-07-01 09:00:00 UTC)));
        let store = CandidateStore::load(kv.clone(), clock.clone(), KEY).await.unwrap();
        Fixture { kv, clock, store }
    }

    #[tokio::test]
    async fn create_then_lookup_by_email() {
        let f = fixture().await;
        let created = f.store.create(draft("dana@example.com")).await.unwrap();

        let found = f.store.get_by_email("DANA@example.com").await.unwrap();
        assert_eq!(found, created);
        assert_eq!(found.submission_date, datetime!(2024-07-01 09:00:00 UTC));
        assert_eq!(found.profile_image, DEFAULT_PROFILE_IMAGE);
        let by_id = f.store.get_by_id(&created.id).await;
        assert_eq!(by_id, Some(created));
        assert_eq!(f.store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_regardless_of_case() {
        let f = fixture().await;
        f.store.create(draft("B@X.com")).await.unwrap();
        let err = f.store.create(draft("b@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail(_)));
        assert_eq!(f.store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn update_inside_window_then_rejected_after() {
        let f = fixture().await;
        let created = f.store.create(draft("a@x.com")).await.unwrap();
        let t = created.submission_date;

        f.clock.advance(Duration::days(2));
        let mut edit = draft("a@x.com");
        edit.city = "Eilat".into();
        let updated = f.store.update(&created.id, edit).await.unwrap();
        assert_eq!(updated.submission_date, t);
        assert_eq!(updated.last_edit_date, Some(t + Duration::days(2)));
        assert_eq!(updated.city, "Eilat");

        f.clock.set(t + Duration::days(4));
        let mut late = draft("a@x.com");
        late.city = "Lod".into();
        let err = f.store.update(&created.id, late).await.unwrap_err();
        assert!(matches!(err, AppError::EditWindowExpired(_)));
        assert_eq!(f.store.get_by_id(&created.id).await, Some(updated));
    }

    #[tokio::test]
    async fn update_is_allowed_at_exactly_three_days() {
        let f = fixture().await;
        let created = f.store.create(draft("a@x.com")).await.unwrap();
        let t = created.submission_date;

        f.clock.set(t + Duration::days(3));
        let status = f.store.edit_window_status("a@x.com").await;
        assert!(status.editable);
        assert_eq!(status.days_remaining, 0);
        let mut edit = draft("a@x.com");
        edit.city = "Eilat".into();
        let updated = f.store.update(&created.id, edit).await.unwrap();
        assert_eq!(updated.city, "Eilat");

        f.clock.advance(Duration::SECOND);
        let err = f.store.update(&created.id, draft("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::EditWindowExpired(_)));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let f = fixture().await;
        let err = f.store.update("missing", draft("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_cannot_steal_another_email() {
        let f = fixture().await;
        f.store.create(draft("a@x.com")).await.unwrap();
        let b = f.store.create(draft("b@x.com")).await.unwrap();
        let err = f.store.update(&b.id, draft("A@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail(_)));
    }

    #[tokio::test]
    async fn update_keeps_existing_image_when_none_given() {
        let f = fixture().await;
        let mut first = draft("a@x.com");
        first.profile_image = Some("data:image/png;base64,AAAA".into());
        let created = f.store.create(first).await.unwrap();
        let updated = f.store.update(&created.id, draft("a@x.com")).await.unwrap();
        assert_eq!(updated.profile_image, "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    async fn delete_and_clear_all() {
        let f = fixture().await;
        let a = f.store.create(draft("a@x.com")).await.unwrap();
        f.store.create(draft("b@x.com")).await.unwrap();

        assert_eq!(f.store.delete(&a.id).await.unwrap().id, a.id);
        assert!(matches!(f.store.delete(&a.id).await, Err(AppError::NotFound(_))));
        assert_eq!(f.store.list().await.len(), 1);

        f.store.clear_all().await.unwrap();
        assert!(f.store.list().await.is_empty());
        assert_eq!(f.kv.get(KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn edit_window_status_tracks_clock() {
        let f = fixture().await;
        assert_eq!(
            f.store.edit_window_status("a@x.com").await,
            EditWindowStatus::not_found()
        );

        f.store.create(draft("a@x.com")).await.unwrap();
        let s = f.store.edit_window_status("A@X.COM").await;
        assert!(s.editable);
        assert_eq!(s.days_remaining, 3);

        f.clock.advance(Duration::days(3) + Duration::SECOND);
        let s = f.store.edit_window_status("a@x.com").await;
        assert!(!s.editable);
        assert_eq!(s.days_remaining, 0);
    }

    #[tokio::test]
    async fn collection_survives_reload() {
        let f = fixture().await;
        f.store.create(draft("a@x.com")).await.unwrap();
        let b = f.store.create(draft("b@x.com")).await.unwrap();
        f.clock.advance(Duration::hours(5));
        f.store.update(&b.id, draft("b@x.com")).await.unwrap();
        let before = f.store.list().await;

        let reloaded = CandidateStore::load(f.kv.clone(), f.clock.clone(), KEY)
            .await
            .unwrap();
        assert_eq!(reloaded.list().await, before);
    }

    #[tokio::test]
    async fn legacy_records_are_upgraded_on_load() {
        let blob = serde_json::json!([{
            "id": "1717171717171",
            "fullName": "Avi Cohen",
            "email": "avi@x.com",
            "phone": "050",
            "age": 30,
            "city": "Tel Aviv",
            "hobbies": "chess",
            "whyPerfect": "motivated",
            "profileImage": "data:,",
            "submissionDate": "2024-06-30T12:00:00.000Z"
        }])
        .to_string();
        let f = fixture_with(MemoryKeyValueStore::with_entry(KEY, &blob)).await;
        let avi = f.store.get_by_email("avi@x.com").await.unwrap();
        assert_eq!(avi.date_of_birth, date!(1994 - 07 - 01));

        // the upgraded shape is what gets written back
        f.store.create(draft("new@x.com")).await.unwrap();
        let saved = f.kv.get(KEY).await.unwrap().unwrap();
        assert!(saved.contains("\"dateOfBirth\":\"1994-07-01\""));
        assert!(!saved.contains("\"age\""));
    }

    #[tokio::test]
    async fn corrupt_blob_starts_empty_and_is_backed_up() {
        let f = fixture_with(MemoryKeyValueStore::with_entry(KEY, "[{\"id\":")).await;
        assert!(f.store.list().await.is_empty());
        assert_eq!(
            f.kv.get("candidates.corrupt").await.unwrap().as_deref(),
            Some("[{\"id\":")
        );
    }

    #[tokio::test]
    async fn subscribers_see_each_mutation() {
        let f = fixture().await;
        let mut rx = f.store.subscribe();
        assert!(rx.borrow_and_update().is_empty());

        let a = f.store.create(draft("a@x.com")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        f.store.delete(&a.id).await.unwrap();
        assert!(rx.borrow_and_update().is_empty());
    }

    struct FailingWrites;

    #[async_trait]
    impl KeyValueStore for FailingWrites {
        async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }
        async fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("quota exceeded")
        }
        async fn remove(&self, _key: &str) -> anyhow::Result<()> {
            anyhow::bail!("quota exceeded")
        }
    }

    #[tokio::test]
    async fn failed_write_leaves_state_untouched() {
        let clock = Arc::new(ManualClock::at(datetime!(2024-07-01 09:00:00 UTC)));
        let store = CandidateStore::load(Arc::new(FailingWrites), clock, KEY)
            .await
            .unwrap();
        let rx = store.subscribe();

        let err = store.create(draft("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
        assert!(store.list().await.is_empty());
        assert!(!rx.has_changed().unwrap());
    }
}
