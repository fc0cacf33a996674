//! Entitlement operations: granting, listing and drawing uses.
//!
//! These run inside the caller's transaction where noted; the engine never
//! mutates an entitlement counter outside one.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{EngineError, Entitlement, MembershipType, ResultEngine, entitlements};

use super::Engine;

impl Engine {
    /// Grants a membership type to a member inside `conn`. Duration kinds get
    /// a fresh validity window starting now; count kinds top up the existing
    /// (member, type) row additively rather than inserting a second one.
    ///
    /// `extra_times` overrides the type's `total_times` for count kinds, used
    /// when a recharge buys a specific number of uses.
    pub(super) async fn grant_entitlement(
        &self,
        conn: &impl ConnectionTrait,
        member_id: Uuid,
        type_id: Uuid,
        extra_times: Option<i64>,
    ) -> ResultEngine<Entitlement> {
        let membership_type = self.require_membership_type(conn, type_id).await?;
        let now = Utc::now();

        if membership_type.kind.is_count() {
            let granted = extra_times.or(membership_type.total_times).unwrap_or(0);
            if granted <= 0 {
                return Err(EngineError::InvalidAmount(
                    "count grant must be positive".to_string(),
                ));
            }
            if let Some(existing) = self.find_entitlement(conn, member_id, type_id).await? {
                let uses = existing.remaining_uses.unwrap_or(0) + granted;
                let mut active: entitlements::ActiveModel = existing.into();
                active.remaining_uses = ActiveValue::Set(Some(uses));
                let updated = active.update(conn).await?;
                return Entitlement::try_from(updated);
            }
            let entitlement = Entitlement {
                id: Uuid::new_v4(),
                member_id,
                type_id,
                start_date: now,
                end_date: None,
                remaining_uses: Some(granted),
            };
            entitlements::ActiveModel::from(&entitlement)
                .insert(conn)
                .await?;
            return Ok(entitlement);
        }

        let end_date = membership_type
            .duration_days
            .filter(|_| membership_type.kind.is_duration())
            .map(|days| now + Duration::days(days));
        let entitlement = Entitlement {
            id: Uuid::new_v4(),
            member_id,
            type_id,
            start_date: now,
            end_date,
            remaining_uses: None,
        };
        entitlements::ActiveModel::from(&entitlement)
            .insert(conn)
            .await?;
        Ok(entitlement)
    }

    /// Draws one use from a member's count card inside `conn`. The row is
    /// re-read here so the decrement sees the committed counter, not a stale
    /// snapshot.
    pub(super) async fn consume_entitlement_use(
        &self,
        conn: &impl ConnectionTrait,
        member_id: Uuid,
        membership_type: &MembershipType,
        now: DateTime<Utc>,
    ) -> ResultEngine<Entitlement> {
        let model = self
            .find_entitlement(conn, member_id, membership_type.id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("entitlement not exists".to_string()))?;
        let entitlement = Entitlement::try_from(model.clone())?;

        if !entitlement.window_open(now) {
            return Err(EngineError::EntitlementExpired(membership_type.name.clone()));
        }
        let Some(uses) = entitlement.remaining_uses else {
            return Err(EngineError::InvalidAmount(
                "membership type has no use counter".to_string(),
            ));
        };
        if uses <= 0 {
            return Err(EngineError::EntitlementExhausted(membership_type.name.clone()));
        }

        let mut active: entitlements::ActiveModel = model.into();
        active.remaining_uses = ActiveValue::Set(Some(uses - 1));
        let updated = active.update(conn).await?;
        Entitlement::try_from(updated)
    }

    /// Requires that the member holds an entitlement for `membership_type`
    /// whose validity window is still open.
    pub(super) async fn require_window_open(
        &self,
        conn: &impl ConnectionTrait,
        member_id: Uuid,
        membership_type: &MembershipType,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        let model = self
            .find_entitlement(conn, member_id, membership_type.id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("entitlement not exists".to_string()))?;
        let entitlement = Entitlement::try_from(model)?;
        if !entitlement.window_open(now) {
            return Err(EngineError::EntitlementExpired(membership_type.name.clone()));
        }
        Ok(())
    }

    /// A member's entitlements with resolved type definitions.
    pub async fn list_member_entitlements(
        &self,
        member_id: Uuid,
    ) -> ResultEngine<Vec<(Entitlement, MembershipType)>> {
        self.require_member(&self.database, member_id).await?;
        self.member_entitlements(&self.database, member_id).await
    }

    /// All of a member's entitlements with their catalog definitions.
    pub(super) async fn member_entitlements(
        &self,
        conn: &impl ConnectionTrait,
        member_id: Uuid,
    ) -> ResultEngine<Vec<(Entitlement, MembershipType)>> {
        let rows = entitlements::Entity::find()
            .filter(entitlements::Column::MemberId.eq(member_id.to_string()))
            .find_also_related(crate::membership_types::Entity)
            .all(conn)
            .await?;

        let mut resolved = Vec::with_capacity(rows.len());
        for (entitlement_model, type_model) in rows {
            let type_model = type_model.ok_or_else(|| {
                EngineError::KeyNotFound("membership type not exists".to_string())
            })?;
            resolved.push((
                Entitlement::try_from(entitlement_model)?,
                MembershipType::try_from(type_model)?,
            ));
        }
        Ok(resolved)
    }

    async fn find_entitlement(
        &self,
        conn: &impl ConnectionTrait,
        member_id: Uuid,
        type_id: Uuid,
    ) -> ResultEngine<Option<entitlements::Model>> {
        Ok(entitlements::Entity::find()
            .filter(entitlements::Column::MemberId.eq(member_id.to_string()))
            .filter(entitlements::Column::TypeId.eq(type_id.to_string()))
            .one(conn)
            .await?)
    }
}
