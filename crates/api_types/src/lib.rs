//! Wire types shared between the HTTP server and its clients.
//!
//! Amounts are integer minor units (cents). Timestamps are UTC.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod member {
    use super::*;

    /// Request body for enrolling a member.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberNew {
        pub name: String,
        pub phone: String,
        pub initial_stored_minor: Option<i64>,
        pub initial_bonus_minor: Option<i64>,
        /// Membership types granted at enrollment.
        pub membership_type_ids: Option<Vec<Uuid>>,
    }

    /// Request body for updating a member's identity fields.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberUpdate {
        pub name: String,
        pub phone: String,
    }

    /// One member in the list view.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberView {
        pub id: Uuid,
        pub name: String,
        pub phone: String,
        pub stored_balance_minor: i64,
        pub bonus_balance_minor: i64,
        pub total_balance_minor: i64,
        pub points: i64,
        pub created_at: DateTime<Utc>,
        pub membership_types: Vec<String>,
        pub level: Option<super::catalog::PointLevelView>,
    }

    /// A single member with resolved entitlements.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MemberDetail {
        pub id: Uuid,
        pub name: String,
        pub phone: String,
        pub stored_balance_minor: i64,
        pub bonus_balance_minor: i64,
        pub total_balance_minor: i64,
        pub points: i64,
        pub created_at: DateTime<Utc>,
        pub entitlements: Vec<EntitlementView>,
        pub level: Option<super::catalog::PointLevelView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct EntitlementView {
        pub id: Uuid,
        pub type_id: Uuid,
        pub type_name: String,
        pub kind: super::catalog::TypeKind,
        pub start_date: DateTime<Utc>,
        pub end_date: Option<DateTime<Utc>>,
        pub remaining_uses: Option<i64>,
        /// Usable right now.
        pub valid: bool,
    }
}

pub mod catalog {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TypeKind {
        Stored,
        Year,
        Season,
        Month,
        Times,
        Custom,
    }

    /// Request body for creating or updating a membership type.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembershipTypeUpsert {
        pub name: String,
        pub kind: TypeKind,
        pub duration_days: Option<i64>,
        pub total_times: Option<i64>,
        pub price_minor: Option<i64>,
        pub description: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MembershipTypeView {
        pub id: Uuid,
        pub name: String,
        pub kind: TypeKind,
        pub duration_days: Option<i64>,
        pub total_times: Option<i64>,
        pub price_minor: Option<i64>,
        pub description: Option<String>,
    }

    /// Request body for creating or updating a point level.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PointLevelUpsert {
        pub name: String,
        pub min_points: i64,
        pub max_points: Option<i64>,
        /// Multiplier in (0, 1]; 0.9 means 10% off.
        pub discount: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PointLevelView {
        pub id: Uuid,
        pub name: String,
        pub min_points: i64,
        pub max_points: Option<i64>,
        pub discount: f64,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionKind {
        Recharge,
        Bonus,
        Consume,
    }

    /// Request body for posting a transaction.
    ///
    /// For a count-based `membership_type_id`, `amount_minor` is a unit
    /// count on recharge and ignored on consume.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub member_id: Uuid,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub membership_type_id: Option<Uuid>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub member_id: Uuid,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
    }
}

pub mod report {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReportEntryView {
        pub member_name: String,
        #[serde(flatten)]
        pub transaction: super::transaction::TransactionView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MonthlyReportView {
        pub year: i32,
        pub month: u32,
        pub total_recharge_minor: i64,
        pub total_consume_minor: i64,
        pub total_bonus_minor: i64,
        pub recharge_count: u64,
        pub consume_count: u64,
        pub active_member_count: u64,
        pub total_members: u64,
        pub valid_member_count: u64,
        pub transactions: Vec<ReportEntryView>,
    }
}
