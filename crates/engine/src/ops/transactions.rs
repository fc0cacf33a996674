//! Balance-affecting operations and the ledger behind them.
//!
//! Every operation here is one atomic unit: resolve, validate, apply,
//! record. The ledger gets exactly one row per applied mutation and rows are
//! never updated afterwards.

use chrono::Utc;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BonusCmd, ConsumeCmd, EngineError, Member, PointLevel, RechargeCmd, ResultEngine, Transaction,
    TransactionKind, members, point_levels, resolve_level, transactions,
    util::{discounted_minor, points_for_recharge},
};

use super::{Engine, with_tx};

impl Engine {
    /// Adds stored value to a member's account, accruing points at the
    /// standard rate, and appends the `recharge` ledger row.
    ///
    /// When `membership_type_id` names a count-based type the amount is a
    /// unit count instead: the member's card is topped up by that many uses,
    /// balances are untouched, no points accrue, and the ledger records the
    /// count. Naming any other type grants a fresh entitlement alongside the
    /// monetary recharge (a card purchase).
    pub async fn recharge(&self, cmd: RechargeCmd) -> ResultEngine<Member> {
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "recharge amount must be positive".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let model = self.require_member(&db_tx, cmd.member_id).await?;
            let member = Member::try_from(model.clone())?;
            let now = Utc::now();

            let count_type = match cmd.membership_type_id {
                Some(type_id) => {
                    let membership_type = self.require_membership_type(&db_tx, type_id).await?;
                    if membership_type.kind.is_count() {
                        Some(type_id)
                    } else {
                        // A card purchase: grant the entitlement, the amount
                        // paid lands on the stored balance below.
                        self.grant_entitlement(&db_tx, member.id, type_id, None)
                            .await?;
                        None
                    }
                }
                None => None,
            };

            let updated = if let Some(type_id) = count_type {
                self.grant_entitlement(&db_tx, member.id, type_id, Some(cmd.amount_minor))
                    .await?;
                tracing::info!(
                    member_id = %member.id,
                    type_id = %type_id,
                    uses = cmd.amount_minor,
                    "count card topped up"
                );
                model
            } else {
                let mut active: members::ActiveModel = model.into();
                active.stored_balance_minor =
                    ActiveValue::Set(member.stored_balance_minor + cmd.amount_minor);
                active.points =
                    ActiveValue::Set(member.points + points_for_recharge(cmd.amount_minor));
                let updated = active.update(&db_tx).await?;
                tracing::info!(
                    member_id = %member.id,
                    amount_minor = cmd.amount_minor,
                    "recharge applied"
                );
                updated
            };

            let tx = Transaction::new(
                member.id,
                TransactionKind::Recharge,
                cmd.amount_minor,
                cmd.description,
                now,
            )?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

            Member::try_from(updated)
        })
    }

    /// Grants promotional balance. No points accrue on bonus money.
    pub async fn bonus(&self, cmd: BonusCmd) -> ResultEngine<Member> {
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "bonus amount must be positive".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let model = self.require_member(&db_tx, cmd.member_id).await?;
            let member = Member::try_from(model.clone())?;
            let now = Utc::now();

            let mut active: members::ActiveModel = model.into();
            active.bonus_balance_minor =
                ActiveValue::Set(member.bonus_balance_minor + cmd.amount_minor);
            let updated = active.update(&db_tx).await?;

            let tx = Transaction::new(
                member.id,
                TransactionKind::Bonus,
                cmd.amount_minor,
                cmd.description,
                now,
            )?;
            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

            tracing::info!(
                member_id = %member.id,
                amount_minor = cmd.amount_minor,
                "bonus granted"
            );
            Member::try_from(updated)
        })
    }

    /// Charges a consumption against the member.
    ///
    /// Monetary path: the point-level discount applies first, then bonus
    /// balance is depleted before stored balance; any stored shortfall is
    /// `InsufficientFunds` and nothing is applied. The ledger records the
    /// discounted amount actually charged.
    ///
    /// When `membership_type_id` names a count-based type one use is drawn
    /// from the card instead; balances are untouched and the ledger amount
    /// is 0.
    pub async fn consume(&self, cmd: ConsumeCmd) -> ResultEngine<Member> {
        with_tx!(self, |db_tx| {
            let model = self.require_member(&db_tx, cmd.member_id).await?;
            let member = Member::try_from(model.clone())?;
            let now = Utc::now();

            let membership_type = match cmd.membership_type_id {
                Some(type_id) => Some(self.require_membership_type(&db_tx, type_id).await?),
                None => None,
            };

            if let Some(membership_type) = membership_type
                .as_ref()
                .filter(|membership_type| membership_type.kind.is_count())
            {
                self.consume_entitlement_use(&db_tx, member.id, membership_type, now)
                    .await?;
                let description = cmd
                    .description
                    .or_else(|| Some(format!("count card draw: {}", membership_type.name)));
                let tx =
                    Transaction::new(member.id, TransactionKind::Consume, 0, description, now)?;
                transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

                tracing::info!(member_id = %member.id, type_id = %membership_type.id, "use drawn");
                Ok(member)
            } else {
                if cmd.amount_minor <= 0 {
                    return Err(EngineError::InvalidAmount(
                        "consume amount must be positive".to_string(),
                    ));
                }
                // A duration card presented at the counter must still be in
                // its window, even though payment comes from balances.
                if let Some(membership_type) = membership_type
                    .as_ref()
                    .filter(|membership_type| membership_type.kind.is_duration())
                {
                    self.require_window_open(&db_tx, member.id, membership_type, now)
                        .await?;
                }

                let levels = self.point_levels_in(&db_tx).await?;
                let discount = resolve_level(member.points, &levels).map(|level| level.discount);
                let due = discounted_minor(cmd.amount_minor, discount);

                let bonus_draw = due.min(member.bonus_balance_minor);
                let stored_draw = due - bonus_draw;
                if stored_draw > member.stored_balance_minor {
                    return Err(EngineError::InsufficientFunds(format!(
                        "due {due}, available {}",
                        member.total_balance_minor()
                    )));
                }

                let mut active: members::ActiveModel = model.into();
                active.bonus_balance_minor =
                    ActiveValue::Set(member.bonus_balance_minor - bonus_draw);
                active.stored_balance_minor =
                    ActiveValue::Set(member.stored_balance_minor - stored_draw);
                let updated = active.update(&db_tx).await?;

                let tx = Transaction::new(
                    member.id,
                    TransactionKind::Consume,
                    due,
                    cmd.description,
                    now,
                )?;
                transactions::ActiveModel::from(&tx).insert(&db_tx).await?;

                tracing::info!(
                    member_id = %member.id,
                    due_minor = due,
                    bonus_minor = bonus_draw,
                    stored_minor = stored_draw,
                    "consume applied"
                );
                Member::try_from(updated)
            }
        })
    }

    /// A member's ledger, newest first.
    pub async fn list_transactions(&self, member_id: Uuid) -> ResultEngine<Vec<Transaction>> {
        self.require_member(&self.database, member_id).await?;
        let models = transactions::Entity::find()
            .filter(transactions::Column::MemberId.eq(member_id.to_string()))
            .order_by_desc(transactions::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Transaction::try_from).collect()
    }

    /// Point levels read through the caller's transaction, sorted the way
    /// [`resolve_level`] expects.
    async fn point_levels_in(&self, conn: &impl ConnectionTrait) -> ResultEngine<Vec<PointLevel>> {
        let models = point_levels::Entity::find()
            .order_by_asc(point_levels::Column::MinPoints)
            .all(conn)
            .await?;
        models.into_iter().map(PointLevel::try_from).collect()
    }
}
