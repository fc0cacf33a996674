//! Member store operations: enrollment, lookup, update, removal.

use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, EnrollMemberCmd, Member, MemberOverview, MemberProfile, ResultEngine, Transaction,
    TransactionKind, entitlements, members, resolve_level, transactions,
    util::{points_for_recharge, validate_phone},
};

use super::{Engine, with_tx};

impl Engine {
    pub(super) async fn require_member(
        &self,
        conn: &impl ConnectionTrait,
        member_id: Uuid,
    ) -> ResultEngine<members::Model> {
        members::Entity::find_by_id(member_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))
    }

    async fn phone_taken(
        &self,
        conn: &impl ConnectionTrait,
        phone: &str,
        exclude: Option<Uuid>,
    ) -> ResultEngine<bool> {
        let mut query = members::Entity::find().filter(members::Column::Phone.eq(phone));
        if let Some(member_id) = exclude {
            query = query.filter(members::Column::Id.ne(member_id.to_string()));
        }
        Ok(query.one(conn).await?.is_some())
    }

    /// Enrolls a new member as one atomic unit: member row, initial type
    /// grants, and the ledger entries for any initial funding. Points accrue
    /// on the initial stored amount at the standard recharge rate.
    pub async fn enroll_member(&self, cmd: EnrollMemberCmd) -> ResultEngine<Member> {
        validate_phone(&cmd.phone)?;
        if cmd.initial_stored_minor < 0 || cmd.initial_bonus_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "initial balances must not be negative".to_string(),
            ));
        }
        let name = cmd.name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidAmount(
                "member name must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            if self.phone_taken(&db_tx, &cmd.phone, None).await? {
                return Err(EngineError::ExistingKey(cmd.phone.clone()));
            }

            let now = Utc::now();
            let member = Member {
                id: Uuid::new_v4(),
                name: name.to_string(),
                phone: cmd.phone.clone(),
                stored_balance_minor: cmd.initial_stored_minor,
                bonus_balance_minor: cmd.initial_bonus_minor,
                points: points_for_recharge(cmd.initial_stored_minor),
                created_at: now,
            };
            members::ActiveModel::from(&member).insert(&db_tx).await?;

            for type_id in &cmd.initial_type_ids {
                self.grant_entitlement(&db_tx, member.id, *type_id, None)
                    .await?;
            }

            if cmd.initial_stored_minor > 0 {
                let tx = Transaction::new(
                    member.id,
                    TransactionKind::Recharge,
                    cmd.initial_stored_minor,
                    Some("initial stored value on enrollment".to_string()),
                    now,
                )?;
                transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            }
            if cmd.initial_bonus_minor > 0 {
                let tx = Transaction::new(
                    member.id,
                    TransactionKind::Bonus,
                    cmd.initial_bonus_minor,
                    Some("initial bonus on enrollment".to_string()),
                    now,
                )?;
                transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            }

            tracing::info!(member_id = %member.id, "member enrolled");
            Ok(member)
        })
    }

    /// Returns one member with entitlements (resolved against the catalog)
    /// and the applicable point level.
    pub async fn member(&self, member_id: Uuid) -> ResultEngine<MemberProfile> {
        let model = self.require_member(&self.database, member_id).await?;
        let member = Member::try_from(model)?;

        let entitlements = self
            .member_entitlements(&self.database, member_id)
            .await?;
        let levels = self.list_point_levels().await?;
        let level = resolve_level(member.points, &levels).cloned();

        Ok(MemberProfile {
            member,
            entitlements,
            level,
        })
    }

    /// Lists every member with computed totals and resolved reference data.
    pub async fn list_members(&self) -> ResultEngine<Vec<MemberOverview>> {
        let models = members::Entity::find().all(&self.database).await?;
        let levels = self.list_point_levels().await?;

        let mut overviews = Vec::with_capacity(models.len());
        for model in models {
            let member = Member::try_from(model)?;
            let membership_type_names = self
                .member_entitlements(&self.database, member.id)
                .await?
                .into_iter()
                .map(|(_, membership_type)| membership_type.name)
                .collect();
            let level = resolve_level(member.points, &levels).cloned();
            overviews.push(MemberOverview {
                total_balance_minor: member.total_balance_minor(),
                membership_type_names,
                level,
                member,
            });
        }
        Ok(overviews)
    }

    /// Updates a member's identity fields. Balances are untouched; those
    /// change only through transactions.
    pub async fn update_member(
        &self,
        member_id: Uuid,
        name: &str,
        phone: &str,
    ) -> ResultEngine<Member> {
        validate_phone(phone)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidAmount(
                "member name must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let model = self.require_member(&db_tx, member_id).await?;
            if self.phone_taken(&db_tx, phone, Some(member_id)).await? {
                return Err(EngineError::ExistingKey(phone.to_string()));
            }

            let mut active: members::ActiveModel = model.into();
            active.name = ActiveValue::Set(name.to_string());
            active.phone = ActiveValue::Set(phone.to_string());
            let updated = active.update(&db_tx).await?;
            Member::try_from(updated)
        })
    }

    /// Removes a member together with their ledger entries and entitlements,
    /// in one transaction.
    pub async fn remove_member(&self, member_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_member(&db_tx, member_id).await?;

            transactions::Entity::delete_many()
                .filter(transactions::Column::MemberId.eq(member_id.to_string()))
                .exec(&db_tx)
                .await?;
            entitlements::Entity::delete_many()
                .filter(entitlements::Column::MemberId.eq(member_id.to_string()))
                .exec(&db_tx)
                .await?;
            members::Entity::delete_by_id(member_id.to_string())
                .exec(&db_tx)
                .await?;

            tracing::info!(member_id = %member_id, "member removed");
            Ok(())
        })
    }
}
