//! Member ledger and transaction engine.
//!
//! The engine owns every balance-affecting rule of the membership store:
//! enrollment, recharges, bonus grants, consumption (with point-level
//! discounts and entitlement draws) and the append-only ledger behind them.
//! It is the only writer of member balances and entitlement counters; the
//! HTTP layer and CLI only call into it.

pub use commands::{BonusCmd, ConsumeCmd, EnrollMemberCmd, RechargeCmd};
pub use entitlements::Entitlement;
pub use error::EngineError;
pub use members::{Member, MemberOverview, MemberProfile};
pub use membership_types::{MembershipType, TypeKind};
pub use ops::{Engine, EngineBuilder, MonthlyReport, ReportEntry};
pub use point_levels::{PointLevel, resolve_level};
pub use transactions::{Transaction, TransactionKind};

pub mod admins;
mod commands;
mod entitlements;
mod error;
mod members;
mod membership_types;
mod ops;
mod point_levels;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
