use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use tokio::time::timeout;
use tracing::info;

use gm_common::api::{MatchListResponse, PartnerMatchRequest, ProgramMatchRequest, QueryOptions};
use gm_common::matching::{AssemblyError, PartnerMatch, ProgramMatch, QueryKind, RankedPage};
use gm_common::service::MatchingService;

use crate::error::ApiError;
use crate::SharedState;

/// Run CPU-bound scoring off the async runtime, bounded by the configured request timeout.
async fn run_scoring<T, F>(state: &SharedState, job: F) -> Result<T, ApiError>
where
    F: FnOnce(&MatchingService) -> Result<T, AssemblyError> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    let handle = tokio::task::spawn_blocking(move || job(&service));

    match timeout(state.config.request_timeout, handle).await {
        Err(_) => Err(ApiError::Timeout(format!(
            "scoring exceeded {}ms",
            state.config.request_timeout.as_millis()
        ))),
        Ok(Err(join_err)) => Err(ApiError::Internal(format!(
            "scoring task failed: {join_err}"
        ))),
        Ok(Ok(result)) => result.map_err(ApiError::from),
    }
}

fn respond<T>(
    state: &SharedState,
    kind: QueryKind,
    page: RankedPage<T>,
    with_data_version: bool,
) -> Json<MatchListResponse<T>> {
    let service = &state.service;
    let response =
        MatchListResponse::from_page(kind, page, service.taxonomy().version(), Utc::now());
    Json(if with_data_version {
        response.with_data_version(service.data_version())
    } else {
        response
    })
}

pub async fn score_programs(
    State(state): State<SharedState>,
    Json(request): Json<ProgramMatchRequest>,
) -> Result<Json<MatchListResponse<ProgramMatch>>, ApiError> {
    let options = request
        .options
        .rank_options(state.config.assembly.default_page_size);
    let ProgramMatchRequest {
        organization,
        programs,
        ..
    } = request;

    let candidates = programs.len();
    let page = run_scoring(&state, move |service| {
        service.score_programs(&organization, &programs, &options)
    })
    .await?;

    info!(
        candidates,
        returned = page.items.len(),
        skipped = page.failures.len(),
        "scored program matches"
    );
    Ok(respond(&state, QueryKind::Programs, page, false))
}

pub async fn score_partners(
    State(state): State<SharedState>,
    Json(request): Json<PartnerMatchRequest>,
) -> Result<Json<MatchListResponse<PartnerMatch>>, ApiError> {
    let options = request
        .options
        .rank_options(state.config.assembly.default_page_size);
    let PartnerMatchRequest {
        organization,
        candidates,
        ..
    } = request;

    let submitted = candidates.len();
    let page = run_scoring(&state, move |service| {
        service.score_partners(&organization, candidates, &options)
    })
    .await?;

    info!(
        candidates = submitted,
        returned = page.items.len(),
        skipped = page.failures.len(),
        "scored partner candidates"
    );
    Ok(respond(&state, QueryKind::Partners, page, false))
}

pub async fn organization_programs(
    State(state): State<SharedState>,
    Path(organization_id): Path<String>,
    Query(query): Query<QueryOptions>,
) -> Result<Json<MatchListResponse<ProgramMatch>>, ApiError> {
    let options = query.rank_options(state.config.assembly.default_page_size);
    let page = run_scoring(&state, move |service| {
        service.top_programs_for(&organization_id, &options)
    })
    .await?;

    Ok(respond(&state, QueryKind::Programs, page, true))
}

pub async fn organization_partners(
    State(state): State<SharedState>,
    Path(organization_id): Path<String>,
    Query(query): Query<QueryOptions>,
) -> Result<Json<MatchListResponse<PartnerMatch>>, ApiError> {
    let options = query.rank_options(state.config.assembly.default_page_size);
    let page = run_scoring(&state, move |service| {
        service.top_partners_for(&organization_id, &options)
    })
    .await?;

    Ok(respond(&state, QueryKind::Partners, page, true))
}
