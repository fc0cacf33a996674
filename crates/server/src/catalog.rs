//! Catalog API endpoints: membership types and point levels.

use api_types::catalog::{
    MembershipTypeUpsert, MembershipTypeView, PointLevelUpsert, PointLevelView,
    TypeKind as ApiKind,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn kind_to_api(kind: engine::TypeKind) -> ApiKind {
    match kind {
        engine::TypeKind::Stored => ApiKind::Stored,
        engine::TypeKind::Year => ApiKind::Year,
        engine::TypeKind::Season => ApiKind::Season,
        engine::TypeKind::Month => ApiKind::Month,
        engine::TypeKind::Times => ApiKind::Times,
        engine::TypeKind::Custom => ApiKind::Custom,
    }
}

fn kind_from_api(kind: ApiKind) -> engine::TypeKind {
    match kind {
        ApiKind::Stored => engine::TypeKind::Stored,
        ApiKind::Year => engine::TypeKind::Year,
        ApiKind::Season => engine::TypeKind::Season,
        ApiKind::Month => engine::TypeKind::Month,
        ApiKind::Times => engine::TypeKind::Times,
        ApiKind::Custom => engine::TypeKind::Custom,
    }
}

fn type_view(membership_type: engine::MembershipType) -> MembershipTypeView {
    MembershipTypeView {
        id: membership_type.id,
        name: membership_type.name,
        kind: kind_to_api(membership_type.kind),
        duration_days: membership_type.duration_days,
        total_times: membership_type.total_times,
        price_minor: membership_type.price_minor,
        description: membership_type.description,
    }
}

pub(crate) fn level_view(level: engine::PointLevel) -> PointLevelView {
    PointLevelView {
        id: level.id,
        name: level.name,
        min_points: level.min_points,
        max_points: level.max_points,
        discount: level.discount,
    }
}

pub async fn list_types(
    State(state): State<ServerState>,
) -> Result<Json<Vec<MembershipTypeView>>, ServerError> {
    let types = state.engine.list_membership_types().await?;
    Ok(Json(types.into_iter().map(type_view).collect()))
}

pub async fn create_type(
    State(state): State<ServerState>,
    Json(payload): Json<MembershipTypeUpsert>,
) -> Result<(StatusCode, Json<MembershipTypeView>), ServerError> {
    let created = state
        .engine
        .create_membership_type(
            &payload.name,
            kind_from_api(payload.kind),
            payload.duration_days,
            payload.total_times,
            payload.price_minor,
            payload.description,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(type_view(created))))
}

pub async fn update_type(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MembershipTypeUpsert>,
) -> Result<Json<MembershipTypeView>, ServerError> {
    let updated = state
        .engine
        .update_membership_type(
            id,
            &payload.name,
            kind_from_api(payload.kind),
            payload.duration_days,
            payload.total_times,
            payload.price_minor,
            payload.description,
        )
        .await?;
    Ok(Json(type_view(updated)))
}

pub async fn delete_type(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_membership_type(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_levels(
    State(state): State<ServerState>,
) -> Result<Json<Vec<PointLevelView>>, ServerError> {
    let levels = state.engine.list_point_levels().await?;
    Ok(Json(levels.into_iter().map(level_view).collect()))
}

pub async fn create_level(
    State(state): State<ServerState>,
    Json(payload): Json<PointLevelUpsert>,
) -> Result<(StatusCode, Json<PointLevelView>), ServerError> {
    let created = state
        .engine
        .create_point_level(
            &payload.name,
            payload.min_points,
            payload.max_points,
            payload.discount,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(level_view(created))))
}

pub async fn update_level(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PointLevelUpsert>,
) -> Result<Json<PointLevelView>, ServerError> {
    let updated = state
        .engine
        .update_point_level(
            id,
            &payload.name,
            payload.min_points,
            payload.max_points,
            payload.discount,
        )
        .await?;
    Ok(Json(level_view(updated)))
}

pub async fn delete_level(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_point_level(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
