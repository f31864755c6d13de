use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use tracing::{debug, instrument};

use om_common::api::{
    JobMatchEntry, LimitQuery, MAX_MATCH_LIMIT, MatchResponse, TalentMatchEntry,
};
use om_common::matching::{JobMatchProfile, TalentMatchProfile};
use om_common::{JobRecord, TalentRecord};

use crate::SharedState;
use crate::auth::AuthUser;
use crate::error::ApiError;

fn resolve_limit(query: &LimitQuery) -> Result<usize, ApiError> {
    query.resolve().ok_or_else(|| {
        ApiError::BadRequest(format!("limit must be between 1 and {MAX_MATCH_LIMIT}"))
    })
}

async fn load_talent(state: &SharedState, talent_id: &str) -> Result<TalentRecord, ApiError> {
    state
        .store
        .fetch_talent(talent_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("talent {talent_id} not found")))
}

async fn load_job(state: &SharedState, job_id: &str) -> Result<JobRecord, ApiError> {
    state
        .store
        .fetch_job(job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job {job_id} not found")))
}

/// `GET /api/matches/talents/:talent_id/jobs/:job_id`
#[instrument(skip_all, fields(%talent_id, %job_id))]
pub async fn get_match(
    State(state): State<SharedState>,
    Path((talent_id, job_id)): Path<(String, String)>,
    _auth: AuthUser,
) -> Result<Json<MatchResponse>, ApiError> {
    let (talent, job) = tokio::try_join!(load_talent(&state, &talent_id), load_job(&state, &job_id))?;

    let result = state.engine.calculate_match_score(
        &TalentMatchProfile::from_record(&talent),
        &JobMatchProfile::from_record(&job),
    );

    Ok(Json(MatchResponse::from_match_result(
        &talent.id,
        &job.id,
        result,
        Utc::now(),
    )))
}

/// `GET /api/matches/talents/:talent_id/jobs`
#[instrument(skip_all, fields(%talent_id, limit = ?query.limit))]
pub async fn best_jobs_for_talent(
    State(state): State<SharedState>,
    Path(talent_id): Path<String>,
    _auth: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<JobMatchEntry>>, ApiError> {
    let limit = resolve_limit(&query)?;
    let talent = load_talent(&state, &talent_id).await?;
    let jobs = state.store.fetch_active_jobs(state.config.fetch_cap).await?;

    let talent_profile = TalentMatchProfile::from_record(&talent);
    let job_profiles: Vec<JobMatchProfile> = jobs.iter().map(JobMatchProfile::from).collect();

    let entries: Vec<JobMatchEntry> = state
        .engine
        .best_job_matches(&talent_profile, &job_profiles, limit)
        .into_iter()
        .filter_map(|ranked| JobMatchEntry::from_ranked(&jobs, ranked))
        .collect();

    debug!(candidates = jobs.len(), returned = entries.len(), "best jobs computed");
    Ok(Json(entries))
}

/// `GET /api/matches/jobs/:job_id/talents`. Restricted to the job's employer,
/// admins and service callers.
#[instrument(skip_all, fields(%job_id, subject = %auth.subject, limit = ?query.limit))]
pub async fn best_talents_for_job(
    State(state): State<SharedState>,
    Path(job_id): Path<String>,
    auth: AuthUser,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<TalentMatchEntry>>, ApiError> {
    let limit = resolve_limit(&query)?;
    let job = load_job(&state, &job_id).await?;

    if !auth.can_manage_job(job.employer_id.as_deref()) {
        return Err(ApiError::Forbidden(format!(
            "{} may not rank talent for job {}",
            auth.subject, job.id
        )));
    }

    let talents = state.store.fetch_talents(state.config.fetch_cap).await?;

    let job_profile = JobMatchProfile::from_record(&job);
    let talent_profiles: Vec<TalentMatchProfile> =
        talents.iter().map(TalentMatchProfile::from).collect();

    let entries: Vec<TalentMatchEntry> = state
        .engine
        .best_talent_matches(&job_profile, &talent_profiles, limit)
        .into_iter()
        .filter_map(|ranked| TalentMatchEntry::from_ranked(&talents, ranked))
        .collect();

    debug!(candidates = talents.len(), returned = entries.len(), "best talent computed");
    Ok(Json(entries))
}
