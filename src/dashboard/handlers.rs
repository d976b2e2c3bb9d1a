use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    cities::{recognized_cities, MAP_CENTER, MAP_ZOOM},
    dto::{CandidatesView, CitiesResponse, FilterQuery, MapResponse, StatsResponse},
    projector::{distinct_cities, FilterCriteria, Projector},
    stats::{age_groups, map_markers, top_cities, visit_summary},
};
use crate::{
    auth::DashboardSession,
    candidates::Candidate,
    error::{AppError, AppResult},
    state::AppState,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/dashboard/candidates",
            get(list_candidates).delete(clear_candidates),
        )
        .route(
            "/dashboard/candidates/:id",
            get(get_candidate).delete(delete_candidate),
        )
        .route("/dashboard/cities", get(list_cities))
        .route("/dashboard/stats", get(stats))
        .route("/dashboard/map", get(map))
}

#[instrument(skip(state, _session))]
pub async fn list_candidates(
    State(state): State<AppState>,
    _session: DashboardSession,
    Query(q): Query<FilterQuery>,
) -> AppResult<Json<CandidatesView>> {
    let filters = FilterCriteria::parse(
        q.search.as_deref(),
        q.city.as_deref(),
        q.age_range.as_deref(),
    )?;

    let mut projector = Projector::new(state.candidates.clock().today());
    projector.set_candidates(state.candidates.list().await);
    projector.set_filters(filters);
    let candidates = projector.projected_view().to_vec();

    Ok(Json(CandidatesView {
        total: candidates.len(),
        candidates,
    }))
}

#[instrument(skip(state, _session))]
pub async fn get_candidate(
    State(state): State<AppState>,
    _session: DashboardSession,
    Path(id): Path<String>,
) -> AppResult<Json<Candidate>> {
    state
        .candidates
        .get_by_id(&id)
        .await
        .map(Json)
        .ok_or(AppError::NotFound(id))
}

#[instrument(skip(state, _session))]
pub async fn delete_candidate(
    State(state): State<AppState>,
    _session: DashboardSession,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.candidates.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _session))]
pub async fn clear_candidates(
    State(state): State<AppState>,
    _session: DashboardSession,
) -> AppResult<StatusCode> {
    state.candidates.clear_all().await?;
    info!("dashboard cleared all candidates");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, _session))]
pub async fn list_cities(
    State(state): State<AppState>,
    _session: DashboardSession,
) -> Json<CitiesResponse> {
    let in_use = distinct_cities(&state.candidates.list().await)
        .into_iter()
        .collect();
    Json(CitiesResponse {
        in_use,
        recognized: recognized_cities(),
    })
}

#[instrument(skip(state, _session))]
pub async fn stats(
    State(state): State<AppState>,
    _session: DashboardSession,
) -> AppResult<Json<StatsResponse>> {
    let candidates = state.candidates.list().await;
    let today = state.candidates.clock().today();
    let visits = state.visits.visits_count().await?;

    Ok(Json(StatsResponse {
        age_groups: age_groups(&candidates, today),
        top_cities: top_cities(&candidates),
        visits: visit_summary(visits, candidates.len() as u64),
    }))
}

#[instrument(skip(state, _session))]
pub async fn map(
    State(state): State<AppState>,
    _session: DashboardSession,
) -> Json<MapResponse> {
    let candidates = state.candidates.list().await;
    let markers = map_markers(&candidates, state.candidates.clock().today());
    Json(MapResponse {
        center: MAP_CENTER,
        zoom: MAP_ZOOM,
        unplaced: candidates.len() - markers.len(),
        markers,
    })
}
