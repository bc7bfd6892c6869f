use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::public_dto::{RenderOptions, SubmitFormRequest, SubmitFormResponse};
use crate::models::entry::Submitter;
use crate::services::message_service::MessageProvider;
use crate::services::render_service::RenderError;
use crate::services::submission_service::SubmissionError;
use crate::store::BuildStore;
use crate::AppState;

#[axum::debug_handler]
pub async fn get_form(
    State(state): State<AppState>,
    Path(build_id): Path<Uuid>,
    Query(opts): Query<RenderOptions>,
) -> crate::error::Result<Response> {
    opts.validate()?;

    match state.renderer.render(build_id, &opts).await {
        Ok(model) => Ok(Json(model).into_response()),
        Err(RenderError::NotFound) => Ok((
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "form_not_found",
                "message": "This form does not exist or is no longer available"
            })),
        )
            .into_response()),
        Err(RenderError::Store(e)) => Err(e.into()),
    }
}

#[axum::debug_handler]
pub async fn submit_form(
    State(state): State<AppState>,
    Path(build_id): Path<Uuid>,
    headers: HeaderMap,
    Json(req): Json<SubmitFormRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    if let Some(guest) = &req.guest {
        guest.validate()?;
    }

    let submitter = match crate::middleware::auth::submitter_user_id(&headers)? {
        Some(user_id) => Submitter::User(user_id),
        None => {
            let guest = req.guest.clone();
            Submitter::Guest {
                name: guest.as_ref().and_then(|g| g.name.clone()),
                email: guest.and_then(|g| g.email),
            }
        }
    };

    // the build's kind and ajax flag shape the response, not the verdict
    let build = state.builds.get(build_id).await.map_err(crate::error::Error::from)?;

    match state.processor.submit(build_id, req, submitter).await {
        Ok(entry) => {
            let (kind, ajax) = build
                .map(|b| (b.kind, b.ajax_enabled))
                .unwrap_or((crate::models::build::BuildKind::Survey, true));
            let redirect_url = (!ajax).then(|| {
                format!(
                    "{}?entry={}&_status=success",
                    crate::config::get_config().result_page_url,
                    entry.id
                )
            });
            let resp = SubmitFormResponse {
                entry_id: entry.id,
                status: entry.status,
                correct_count: entry.correct_count,
                scorable_count: entry.scorable_count,
                percentage: entry.percentage,
                passed: entry.passed,
                message: state.messages.thank_you(kind),
                redirect_url,
            };
            Ok(Json(resp).into_response())
        }
        Err(err @ SubmissionError::UnknownBuild(_)) => {
            tracing::warn!(build_id = %build_id, kind = err.kind(), "submission failed");
            Ok((
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "form_not_found",
                    "message": "This form does not exist or is no longer available"
                })),
            )
                .into_response())
        }
        Err(SubmissionError::Storage(e)) => {
            tracing::error!(build_id = %build_id, error = ?e, "submission storage failure");
            Err(e.into())
        }
        Err(err) => {
            // one generic message for every recoverable rejection; the
            // specific reason only goes to the log
            debug_assert!(err.is_recoverable());
            tracing::warn!(build_id = %build_id, kind = err.kind(), detail = %err, "submission rejected");
            let ajax = build.map(|b| b.ajax_enabled).unwrap_or(true);
            let redirect_url = (!ajax).then(|| {
                format!(
                    "{}?build={}&_status=failure",
                    crate::config::get_config().result_page_url,
                    build_id
                )
            });
            Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "submission_rejected",
                    "message": state.messages.failure(),
                    "redirect_url": redirect_url,
                })),
            )
                .into_response())
        }
    }
}
