use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::profiles::{ProfileStore, ProfileStoreError};
use crate::{JobRecord, TalentRecord};

/// Profile store held in memory, for tests and local runs. Records keep
/// insertion order; "newest first" listings return the most recently inserted
/// records first.
#[derive(Debug, Default)]
pub struct InMemoryProfileStore {
    talents: RwLock<Vec<TalentRecord>>,
    jobs: RwLock<Vec<JobRecord>>,
    unavailable: AtomicBool,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(talents: Vec<TalentRecord>, jobs: Vec<JobRecord>) -> Self {
        Self {
            talents: RwLock::new(talents),
            jobs: RwLock::new(jobs),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Insert or replace by id.
    pub async fn upsert_talent(&self, record: TalentRecord) {
        let mut talents = self.talents.write().await;
        match talents.iter_mut().find(|t| t.id == record.id) {
            Some(existing) => *existing = record,
            None => talents.push(record),
        }
    }

    /// Insert or replace by id.
    pub async fn upsert_job(&self, record: JobRecord) {
        let mut jobs = self.jobs.write().await;
        match jobs.iter_mut().find(|j| j.id == record.id) {
            Some(existing) => *existing = record,
            None => jobs.push(record),
        }
    }

    /// Make every call fail with `Unavailable`, to simulate an outage.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), ProfileStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(ProfileStoreError::Unavailable(
                "in-memory store marked unavailable".into(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch_talent(&self, id: &str) -> Result<Option<TalentRecord>, ProfileStoreError> {
        self.check_available()?;
        Ok(self.talents.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn fetch_job(&self, id: &str) -> Result<Option<JobRecord>, ProfileStoreError> {
        self.check_available()?;
        Ok(self.jobs.read().await.iter().find(|j| j.id == id).cloned())
    }

    async fn fetch_active_jobs(&self, limit: usize) -> Result<Vec<JobRecord>, ProfileStoreError> {
        self.check_available()?;
        Ok(self
            .jobs
            .read()
            .await
            .iter()
            .rev()
            .filter(|j| j.is_active)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn fetch_talents(&self, limit: usize) -> Result<Vec<TalentRecord>, ProfileStoreError> {
        self.check_available()?;
        Ok(self
            .talents
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), ProfileStoreError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, active: bool) -> JobRecord {
        JobRecord {
            id: id.into(),
            is_active: active,
            ..JobRecord::default()
        }
    }

    #[tokio::test]
    async fn active_jobs_are_filtered_newest_first_and_capped() {
        let store = InMemoryProfileStore::with_records(
            vec![],
            vec![job("j1", true), job("j2", false), job("j3", true), job("j4", true)],
        );

        let jobs = store.fetch_active_jobs(2).await.unwrap();
        let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["j4", "j3"]);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_record() {
        let store = InMemoryProfileStore::new();
        store
            .upsert_talent(TalentRecord {
                id: "t1".into(),
                o1_score: Some(10),
                ..TalentRecord::default()
            })
            .await;
        store
            .upsert_talent(TalentRecord {
                id: "t1".into(),
                o1_score: Some(90),
                ..TalentRecord::default()
            })
            .await;

        let talent = store.fetch_talent("t1").await.unwrap().unwrap();
        assert_eq!(talent.o1_score, Some(90));
        assert_eq!(store.fetch_talents(10).await.unwrap().len(), 1);
        assert!(store.fetch_talent("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unavailable_store_fails_every_call() {
        let store = InMemoryProfileStore::new();
        store.set_unavailable(true);

        assert!(matches!(
            store.ping().await,
            Err(ProfileStoreError::Unavailable(_))
        ));
        assert!(store.fetch_job("j").await.is_err());

        store.set_unavailable(false);
        assert!(store.ping().await.is_ok());
    }
}
