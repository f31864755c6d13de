use async_trait::async_trait;
use deadpool_postgres::PoolError;
use tokio_postgres::{Error as PgError, Row};
use tracing::instrument;

use crate::db::PgPool;
use crate::db::util::TimedClientExt;
use crate::{JobRecord, TalentRecord};

/// Upper bound on candidates handed to the engine per ranking request.
pub const DEFAULT_FETCH_CAP: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the external talent/job profile store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_talent(&self, id: &str) -> Result<Option<TalentRecord>, ProfileStoreError>;

    async fn fetch_job(&self, id: &str) -> Result<Option<JobRecord>, ProfileStoreError>;

    /// Active job postings, newest first, at most `limit`.
    async fn fetch_active_jobs(&self, limit: usize) -> Result<Vec<JobRecord>, ProfileStoreError>;

    /// Talent profiles, newest first, at most `limit`.
    async fn fetch_talents(&self, limit: usize) -> Result<Vec<TalentRecord>, ProfileStoreError>;

    async fn ping(&self) -> Result<(), ProfileStoreError>;
}

const TALENT_COLUMNS: &str = "id::text AS id, \
    user_id::text AS user_id, \
    full_name, \
    headline, \
    o1_score::int4 AS o1_score, \
    criteria_met, \
    skills, \
    education_level, \
    years_experience::int4 AS years_experience";

const JOB_COLUMNS: &str = "id::text AS id, \
    employer_id::text AS employer_id, \
    title, \
    company_name, \
    location, \
    COALESCE(is_active, false) AS is_active, \
    min_score::int4 AS min_score, \
    preferred_criteria, \
    required_skills, \
    preferred_skills, \
    required_education, \
    min_experience::int4 AS min_experience";

/// Postgres-backed store over `public.talent_profiles` and
/// `public.job_postings`.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    #[instrument(skip(self))]
    async fn fetch_talent(&self, id: &str) -> Result<Option<TalentRecord>, ProfileStoreError> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {TALENT_COLUMNS} FROM public.talent_profiles WHERE id::text = $1");
        let row = client
            .timed_query_opt_cached(&sql, &[&id], "fetch_talent")
            .await?;
        Ok(row.as_ref().map(talent_from_row))
    }

    #[instrument(skip(self))]
    async fn fetch_job(&self, id: &str) -> Result<Option<JobRecord>, ProfileStoreError> {
        let client = self.pool.get().await?;
        let sql = format!("SELECT {JOB_COLUMNS} FROM public.job_postings WHERE id::text = $1");
        let row = client
            .timed_query_opt_cached(&sql, &[&id], "fetch_job")
            .await?;
        Ok(row.as_ref().map(job_from_row))
    }

    #[instrument(skip(self))]
    async fn fetch_active_jobs(&self, limit: usize) -> Result<Vec<JobRecord>, ProfileStoreError> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM public.job_postings \
             WHERE is_active \
             ORDER BY created_at DESC NULLS LAST, id \
             LIMIT $1"
        );
        let limit = limit as i64;
        let rows = client
            .timed_query_cached(&sql, &[&limit], "fetch_active_jobs")
            .await?;
        Ok(rows.iter().map(job_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn fetch_talents(&self, limit: usize) -> Result<Vec<TalentRecord>, ProfileStoreError> {
        let client = self.pool.get().await?;
        let sql = format!(
            "SELECT {TALENT_COLUMNS} FROM public.talent_profiles \
             ORDER BY created_at DESC NULLS LAST, id \
             LIMIT $1"
        );
        let limit = limit as i64;
        let rows = client
            .timed_query_cached(&sql, &[&limit], "fetch_talents")
            .await?;
        Ok(rows.iter().map(talent_from_row).collect())
    }

    async fn ping(&self) -> Result<(), ProfileStoreError> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }
}

fn talent_from_row(row: &Row) -> TalentRecord {
    TalentRecord {
        id: row.get("id"),
        user_id: row.get("user_id"),
        full_name: row.get("full_name"),
        headline: row.get("headline"),
        o1_score: row.get("o1_score"),
        criteria_met: row.get("criteria_met"),
        skills: row.get("skills"),
        education_level: row.get("education_level"),
        years_experience: row.get("years_experience"),
    }
}

fn job_from_row(row: &Row) -> JobRecord {
    JobRecord {
        id: row.get("id"),
        employer_id: row.get("employer_id"),
        title: row.get("title"),
        company_name: row.get("company_name"),
        location: row.get("location"),
        is_active: row.get("is_active"),
        min_score: row.get("min_score"),
        preferred_criteria: row.get("preferred_criteria"),
        required_skills: row.get("required_skills"),
        preferred_skills: row.get("preferred_skills"),
        required_education: row.get("required_education"),
        min_experience: row.get("min_experience"),
    }
}
