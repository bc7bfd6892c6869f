use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::admin_dto::{
    CreateBuildPayload, CreateQuestionPayload, ListQuery, PaginatedResponse, UpdateBuildPayload,
    UpdateQuestionPayload,
};
use crate::error::{Error, Result};
use crate::store::{BuildStore, EntryStore, QuestionStore};
use crate::AppState;

fn page_params(query: &ListQuery) -> (i64, i64) {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    (page, per_page)
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Json(payload): Json<CreateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    payload.check_marker().map_err(Error::BadRequest)?;

    let question = state.questions.insert(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(question)))
}

#[axum::debug_handler]
pub async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let question = state
        .questions
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound("Question not found".into()))?;
    Ok(Json(question))
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let question = state
        .questions
        .update(id, payload.into())
        .await?
        .ok_or_else(|| Error::NotFound("Question not found".into()))?;
    Ok(Json(json!({ "status": "success", "question": question })))
}

#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    // builds referencing this question simply skip it from now on
    let deleted = state.questions.delete(id).await?;
    if !deleted {
        return Err(Error::NotFound("Question not found".into()));
    }
    Ok(Json(json!({ "status": "deleted" })))
}

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let (page, per_page) = page_params(&query);
    let (items, total) = state.questions.list(page, per_page).await?;
    Ok(Json(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/builds",
    request_body = CreateBuildPayload,
    responses(
        (status = 201, description = "Build created successfully"),
        (status = 400, description = "Invalid payload")
    )
)]
#[axum::debug_handler]
pub async fn create_build(
    State(state): State<AppState>,
    Json(payload): Json<CreateBuildPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    payload.check_pagination().map_err(Error::BadRequest)?;

    let build = state.builds.insert(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(build)))
}

#[utoipa::path(
    get,
    path = "/api/admin/builds/{id}",
    params(
        ("id" = Uuid, Path, description = "Build ID")
    ),
    responses(
        (status = 200, description = "Build retrieved successfully"),
        (status = 404, description = "Build not found")
    )
)]
#[axum::debug_handler]
pub async fn get_build(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let build = state
        .builds
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound("Build not found".into()))?;
    Ok(Json(build))
}

#[utoipa::path(
    patch,
    path = "/api/admin/builds/{id}",
    params(
        ("id" = Uuid, Path, description = "Build ID")
    ),
    request_body = UpdateBuildPayload,
    responses(
        (status = 200, description = "Build updated successfully"),
        (status = 400, description = "Invalid payload"),
        (status = 404, description = "Build not found")
    )
)]
#[axum::debug_handler]
pub async fn update_build(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBuildPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let current = state
        .builds
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound("Build not found".into()))?;
    payload
        .check_pagination(&current)
        .map_err(Error::BadRequest)?;

    let build = state
        .builds
        .update(id, payload.into())
        .await?
        .ok_or_else(|| Error::NotFound("Build not found".into()))?;
    Ok(Json(json!({ "status": "success", "build": build })))
}

#[utoipa::path(
    delete,
    path = "/api/admin/builds/{id}",
    params(
        ("id" = Uuid, Path, description = "Build ID")
    ),
    responses(
        (status = 200, description = "Build deleted successfully"),
        (status = 404, description = "Build not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_build(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let deleted = state.builds.delete(id).await?;
    if !deleted {
        return Err(Error::NotFound("Build not found".into()));
    }
    Ok(Json(json!({ "status": "deleted" })))
}

#[axum::debug_handler]
pub async fn list_builds(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let (page, per_page) = page_params(&query);
    let (items, total) = state.builds.list(page, per_page).await?;
    Ok(Json(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

#[axum::debug_handler]
pub async fn list_entries_by_build(
    State(state): State<AppState>,
    Path(build_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse> {
    let (page, per_page) = page_params(&query);
    let (items, total) = state.entries.list_by_build(build_id, page, per_page).await?;
    Ok(Json(PaginatedResponse {
        items,
        total,
        page,
        per_page,
    }))
}

#[axum::debug_handler]
pub async fn get_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let entry = state
        .entries
        .get(id)
        .await?
        .ok_or_else(|| Error::NotFound("Entry not found".into()))?;
    Ok(Json(entry))
}
