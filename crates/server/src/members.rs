//! Member API endpoints

use api_types::member::{EntitlementView, MemberDetail, MemberNew, MemberUpdate, MemberView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{ServerError, catalog, server::ServerState};
use engine::EnrollMemberCmd;

pub(crate) fn member_detail(profile: engine::MemberProfile) -> MemberDetail {
    let now = Utc::now();
    let entitlements = profile
        .entitlements
        .into_iter()
        .map(|(entitlement, membership_type)| EntitlementView {
            id: entitlement.id,
            type_id: membership_type.id,
            type_name: membership_type.name,
            kind: catalog::kind_to_api(membership_type.kind),
            start_date: entitlement.start_date,
            end_date: entitlement.end_date,
            remaining_uses: entitlement.remaining_uses,
            valid: entitlement.is_valid(now),
        })
        .collect();

    let member = profile.member;
    MemberDetail {
        id: member.id,
        total_balance_minor: member.total_balance_minor(),
        name: member.name,
        phone: member.phone,
        stored_balance_minor: member.stored_balance_minor,
        bonus_balance_minor: member.bonus_balance_minor,
        points: member.points,
        created_at: member.created_at,
        entitlements,
        level: profile.level.map(catalog::level_view),
    }
}

pub async fn enroll(
    State(state): State<ServerState>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<MemberDetail>), ServerError> {
    let mut cmd = EnrollMemberCmd::new(payload.name, payload.phone);
    if let Some(amount_minor) = payload.initial_stored_minor {
        cmd = cmd.initial_stored_minor(amount_minor);
    }
    if let Some(amount_minor) = payload.initial_bonus_minor {
        cmd = cmd.initial_bonus_minor(amount_minor);
    }
    for type_id in payload.membership_type_ids.unwrap_or_default() {
        cmd = cmd.grant_type(type_id);
    }

    let member = state.engine.enroll_member(cmd).await?;
    let profile = state.engine.member(member.id).await?;
    Ok((StatusCode::CREATED, Json(member_detail(profile))))
}

pub async fn list(
    State(state): State<ServerState>,
) -> Result<Json<Vec<MemberView>>, ServerError> {
    let overviews = state.engine.list_members().await?;
    let views = overviews
        .into_iter()
        .map(|overview| {
            let member = overview.member;
            MemberView {
                id: member.id,
                name: member.name,
                phone: member.phone,
                stored_balance_minor: member.stored_balance_minor,
                bonus_balance_minor: member.bonus_balance_minor,
                total_balance_minor: overview.total_balance_minor,
                points: member.points,
                created_at: member.created_at,
                membership_types: overview.membership_type_names,
                level: overview.level.map(catalog::level_view),
            }
        })
        .collect();
    Ok(Json(views))
}

pub async fn detail(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MemberDetail>, ServerError> {
    let profile = state.engine.member(id).await?;
    Ok(Json(member_detail(profile)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MemberUpdate>,
) -> Result<Json<MemberDetail>, ServerError> {
    state
        .engine
        .update_member(id, &payload.name, &payload.phone)
        .await?;
    let profile = state.engine.member(id).await?;
    Ok(Json(member_detail(profile)))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.remove_member(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
