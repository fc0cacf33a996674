//! Monthly reporting over the ledger.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use sea_orm::{QueryFilter, QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    EngineError, Member, ResultEngine, Transaction, TransactionKind, members, transactions,
};

use super::Engine;

/// One ledger row of the report month, with the member it belongs to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub transaction: Transaction,
    pub member_name: String,
}

/// Aggregates over one calendar month of ledger activity, UTC-bounded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub total_recharge_minor: i64,
    pub total_consume_minor: i64,
    pub total_bonus_minor: i64,
    pub recharge_count: u64,
    pub consume_count: u64,
    /// Members with at least one ledger row in the month.
    pub active_member_count: u64,
    pub total_members: u64,
    /// Members whose combined balance is positive right now.
    pub valid_member_count: u64,
    /// The month's ledger, newest first.
    pub transactions: Vec<ReportEntry>,
}

impl Engine {
    /// Builds the report for `[month start, next month start)` in UTC.
    /// Aggregates are computed from the ledger rows themselves, so the
    /// report always matches what a member statement would show.
    pub async fn monthly_report(&self, year: i32, month: u32) -> ResultEngine<MonthlyReport> {
        let start = month_start(year, month)?;
        let end = if month == 12 {
            month_start(year + 1, 1)?
        } else {
            month_start(year, month + 1)?
        };

        let rows = transactions::Entity::find()
            .filter(transactions::Column::CreatedAt.gte(start))
            .filter(transactions::Column::CreatedAt.lt(end))
            .order_by_desc(transactions::Column::CreatedAt)
            .find_also_related(members::Entity)
            .all(&self.database)
            .await?;

        let mut report = MonthlyReport {
            year,
            month,
            total_recharge_minor: 0,
            total_consume_minor: 0,
            total_bonus_minor: 0,
            recharge_count: 0,
            consume_count: 0,
            active_member_count: 0,
            total_members: 0,
            valid_member_count: 0,
            transactions: Vec::with_capacity(rows.len()),
        };

        let mut active_members = HashSet::new();
        for (tx_model, member_model) in rows {
            let transaction = Transaction::try_from(tx_model)?;
            let member_name = member_model
                .ok_or_else(|| EngineError::KeyNotFound("member not exists".to_string()))?
                .name;

            match transaction.kind {
                TransactionKind::Recharge => {
                    report.total_recharge_minor += transaction.amount_minor;
                    report.recharge_count += 1;
                }
                TransactionKind::Consume => {
                    report.total_consume_minor += transaction.amount_minor;
                    report.consume_count += 1;
                }
                TransactionKind::Bonus => {
                    report.total_bonus_minor += transaction.amount_minor;
                }
            }
            active_members.insert(transaction.member_id);
            report.transactions.push(ReportEntry {
                transaction,
                member_name,
            });
        }
        report.active_member_count = active_members.len() as u64;

        for model in members::Entity::find().all(&self.database).await? {
            let member = Member::try_from(model)?;
            report.total_members += 1;
            if member.total_balance_minor() > 0 {
                report.valid_member_count += 1;
            }
        }

        Ok(report)
    }
}

fn month_start(year: i32, month: u32) -> ResultEngine<chrono::DateTime<chrono::Utc>> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| EngineError::InvalidAmount(format!("invalid report month {year}-{month}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_bounds_are_utc_midnights() {
        let start = month_start(2025, 2).unwrap();
        assert_eq!(start.to_rfc3339(), "2025-02-01T00:00:00+00:00");
        assert!(month_start(2025, 13).is_err());
        assert!(month_start(2025, 0).is_err());
    }
}
