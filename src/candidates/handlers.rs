use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{StatusQuery, SubmissionStatusResponse},
    repo_types::{Candidate, CandidateDraft},
    services::validate_draft,
};
use crate::{error::AppResult, state::AppState};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/candidates", post(register))
        .route("/candidates/status", get(submission_status))
        .route("/candidates/:id", put(edit_submission))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<CandidateDraft>,
) -> AppResult<(StatusCode, HeaderMap, Json<Candidate>)> {
    let today = state.candidates.clock().today();
    let draft = validate_draft(payload, today).map_err(|e| {
        warn!(error = %e, "invalid registration");
        e
    })?;
    let candidate = state.candidates.create(draft).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/candidates/{}", candidate.id).parse() {
        headers.insert(header::LOCATION, location);
    }
    info!(id = %candidate.id, "registration submitted");
    Ok((StatusCode::CREATED, headers, Json(candidate)))
}

#[instrument(skip(state))]
pub async fn submission_status(
    State(state): State<AppState>,
    Query(q): Query<StatusQuery>,
) -> AppResult<Json<SubmissionStatusResponse>> {
    let status = state.candidates.edit_window_status(&q.email).await;
    let candidate = if status.editable {
        state.candidates.get_by_email(&q.email).await
    } else {
        None
    };
    Ok(Json(SubmissionStatusResponse { status, candidate }))
}

#[instrument(skip(state, payload))]
pub async fn edit_submission(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CandidateDraft>,
) -> AppResult<Json<Candidate>> {
    let today = state.candidates.clock().today();
    let draft = validate_draft(payload, today)?;
    let candidate = state.candidates.update(&id, draft).await?;
    Ok(Json(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{candidates::repo_types::DEFAULT_PROFILE_IMAGE, error::AppError};
    use time::macros::date;

    fn payload(email: &str) -> CandidateDraft {
        CandidateDraft {
            full_name: "Noa Mizrahi".into(),
            email: email.into(),
            phone: "050-7654321".into(),
            date_of_birth: date!(1990 - 03 - 03),
            city: "Haifa".into(),
            hobbies: "running".into(),
            why_perfect: "fast learner".into(),
            profile_image: None,
        }
    }

    #[tokio::test]
    async fn register_then_check_status_then_edit() {
        let state = AppState::fake().await;

        let (status, headers, Json(created)) =
            register(State(state.clone()), Json(payload("noa@x.com")))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert!(headers.get(header::LOCATION).is_some());

        let Json(found) = submission_status(
            State(state.clone()),
            Query(StatusQuery {
                email: "NOA@x.com".into(),
            }),
        )
        .await
        .unwrap();
        assert!(found.status.editable);
        assert_eq!(found.candidate.as_ref().map(|c| c.id.as_str()), Some(created.id.as_str()));

        let mut edit = payload("noa@x.com");
        edit.hobbies = "swimming".into();
        let Json(updated) = edit_submission(State(state), Path(created.id.clone()), Json(edit))
            .await
            .unwrap();
        assert_eq!(updated.hobbies, "swimming");
        assert!(updated.last_edit_date.is_some());
    }

    #[tokio::test]
    async fn register_rejects_duplicates_and_invalid_input() {
        let state = AppState::fake().await;
        let (status, _, _) = register(State(state.clone()), Json(payload("b@x.com")))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let dup = register(State(state.clone()), Json(payload("B@X.com"))).await;
        assert!(matches!(dup, Err(AppError::DuplicateEmail(_))));

        let mut bad = payload("c@x.com");
        bad.full_name = "Single".into();
        let invalid = register(State(state), Json(bad)).await;
        assert!(matches!(invalid, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn edit_without_image_keeps_the_stored_one() {
        let state = AppState::fake().await;
        let mut first = payload("img@x.com");
        first.profile_image = Some("data:image/png;base64,AAAA".into());
        let (_, _, Json(created)) = register(State(state.clone()), Json(first))
            .await
            .unwrap();

        let mut edit = payload("img@x.com");
        edit.profile_image = Some("   ".into());
        let Json(updated) = edit_submission(State(state.clone()), Path(created.id.clone()), Json(edit))
            .await
            .unwrap();
        assert_eq!(updated.profile_image, "data:image/png;base64,AAAA");

        let (_, _, Json(plain)) = register(State(state), Json(payload("plain@x.com")))
            .await
            .unwrap();
        assert_eq!(plain.profile_image, DEFAULT_PROFILE_IMAGE);
    }

    #[tokio::test]
    async fn status_for_unknown_email_has_no_record() {
        let state = AppState::fake().await;
        let Json(res) = submission_status(
            State(state),
            Query(StatusQuery {
                email: "nobody@x.com".into(),
            }),
        )
        .await
        .unwrap();
        assert!(!res.status.editable);
        assert!(res.candidate.is_none());
    }
}
