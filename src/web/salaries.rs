//! `/api/salaries` handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::core::error::AppResult;
use crate::domain::{
    AddSalaryRequest, CreateOrEditSalaryRecordResponse, EditSalaryRequest, Pageable, UserSalaryAdminDto,
    UserSalaryDto,
};
use crate::salaries::criteria::ChartFilterCriteria;
use crate::salaries::{SalariesChartResponse, SalariesHistoricalChartResponse, SelectBoxItems};
use crate::web::auth::{MaybeUser, RequireUser};
use crate::web::extract::{JsonBody, QueryPairs};
use crate::web::AppState;

/// GET /api/salaries/chart
pub async fn chart(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    QueryPairs(pairs): QueryPairs,
) -> AppResult<Json<SalariesChartResponse>> {
    let criteria = ChartFilterCriteria::from_query_pairs(&pairs)?;
    let cancel = state.shutdown.child_token();
    let chart = state
        .salaries
        .chart(&criteria, user.as_ref(), &cancel, Utc::now())
        .await?;
    Ok(Json(chart))
}

/// GET /api/salaries/historical-chart
pub async fn historical_chart(
    State(state): State<AppState>,
    QueryPairs(pairs): QueryPairs,
) -> AppResult<Json<SalariesHistoricalChartResponse>> {
    let criteria = ChartFilterCriteria::from_query_pairs(&pairs)?;
    let cancel = state.shutdown.child_token();
    let chart = state
        .salaries
        .historical_chart(&criteria, &cancel, Utc::now())
        .await?;
    Ok(Json(chart))
}

/// GET /api/salaries
pub async fn list(State(state): State<AppState>, query: QueryPairs) -> AppResult<Json<Pageable<UserSalaryDto>>> {
    let criteria = ChartFilterCriteria::from_query_pairs(&query.0)?;
    let page = query.page_request()?;
    let cancel = state.shutdown.child_token();
    let salaries = state.salaries.list(&criteria, page, &cancel, Utc::now()).await?;
    Ok(Json(salaries))
}

/// POST /api/salaries
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    JsonBody(request): JsonBody<AddSalaryRequest>,
) -> AppResult<Json<CreateOrEditSalaryRecordResponse>> {
    let response = state.salaries.add(&user, &request, Utc::now()).await?;
    Ok(Json(response))
}

/// POST /api/salaries/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
    JsonBody(edit): JsonBody<EditSalaryRequest>,
) -> AppResult<Json<CreateOrEditSalaryRecordResponse>> {
    let response = state.salaries.update(id, &user, &edit).await?;
    Ok(Json(response))
}

/// POST /api/salaries/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserSalaryAdminDto>> {
    Ok(Json(state.salaries.approve(id, &user).await?))
}

/// POST /api/salaries/{id}/exclude-from-stats
pub async fn exclude_from_stats(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserSalaryAdminDto>> {
    Ok(Json(state.salaries.exclude_from_stats(id, &user).await?))
}

/// DELETE /api/salaries/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    state.salaries.delete(id, &user).await?;
    Ok(Json(json!({ "id": id })))
}

/// GET /api/salaries/all
pub async fn all(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    query: QueryPairs,
) -> AppResult<Json<Pageable<UserSalaryAdminDto>>> {
    Ok(Json(state.salaries.all(&user, query.page_request()?).await?))
}

/// GET /api/salaries/not-in-stats
pub async fn not_in_stats(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    query: QueryPairs,
) -> AppResult<Json<Pageable<UserSalaryAdminDto>>> {
    Ok(Json(state.salaries.not_in_stats(&user, query.page_request()?).await?))
}

/// GET /api/salaries/select-box-items
pub async fn select_box_items(State(state): State<AppState>) -> AppResult<Json<SelectBoxItems>> {
    let cancel = state.shutdown.child_token();
    Ok(Json(state.professions.select_box_items(&cancel).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyReplyRequest {
    pub usefulness_rating: Option<i32>,
}

/// POST /api/salaries/survey-reply
pub async fn survey_reply(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    JsonBody(request): JsonBody<SurveyReplyRequest>,
) -> AppResult<StatusCode> {
    state
        .salaries
        .add_survey_reply(&user, request.usefulness_rating, Utc::now())
        .await?;
    Ok(StatusCode::CREATED)
}
