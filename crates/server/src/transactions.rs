//! Transactions API endpoints

use api_types::member::MemberDetail;
use api_types::transaction::{TransactionKind as ApiKind, TransactionNew, TransactionView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, members, server::ServerState};
use engine::{BonusCmd, ConsumeCmd, RechargeCmd};

pub(crate) fn tx_view(tx: engine::Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        member_id: tx.member_id,
        kind: match tx.kind {
            engine::TransactionKind::Recharge => ApiKind::Recharge,
            engine::TransactionKind::Bonus => ApiKind::Bonus,
            engine::TransactionKind::Consume => ApiKind::Consume,
        },
        amount_minor: tx.amount_minor,
        description: tx.description,
        created_at: tx.created_at,
    }
}

/// Posts one transaction and returns the member as it stands afterwards.
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<MemberDetail>), ServerError> {
    let member = match payload.kind {
        ApiKind::Recharge => {
            let mut cmd = RechargeCmd::new(payload.member_id, payload.amount_minor);
            if let Some(description) = payload.description {
                cmd = cmd.description(description);
            }
            if let Some(type_id) = payload.membership_type_id {
                cmd = cmd.membership_type_id(type_id);
            }
            state.engine.recharge(cmd).await?
        }
        ApiKind::Bonus => {
            if payload.membership_type_id.is_some() {
                return Err(ServerError::Generic(
                    "bonus cannot target a membership type".to_string(),
                ));
            }
            let mut cmd = BonusCmd::new(payload.member_id, payload.amount_minor);
            if let Some(description) = payload.description {
                cmd = cmd.description(description);
            }
            state.engine.bonus(cmd).await?
        }
        ApiKind::Consume => {
            let mut cmd = ConsumeCmd::new(payload.member_id, payload.amount_minor);
            if let Some(description) = payload.description {
                cmd = cmd.description(description);
            }
            if let Some(type_id) = payload.membership_type_id {
                cmd = cmd.membership_type_id(type_id);
            }
            state.engine.consume(cmd).await?
        }
    };

    let profile = state.engine.member(member.id).await?;
    Ok((StatusCode::CREATED, Json(members::member_detail(profile))))
}

/// A member's ledger, newest first.
pub async fn list(
    State(state): State<ServerState>,
    Path(member_id): Path<Uuid>,
) -> Result<Json<Vec<TransactionView>>, ServerError> {
    let ledger = state.engine.list_transactions(member_id).await?;
    Ok(Json(ledger.into_iter().map(tx_view).collect()))
}
