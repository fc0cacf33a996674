//! Member records.
//!
//! A member holds two separately-tracked monetary balances (stored value and
//! a non-withdrawable bonus) plus an accumulated points total. Balances and
//! points are mutated exclusively by the engine's transaction operations;
//! the rows here never self-mutate.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Entitlement, MembershipType, PointLevel};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    /// Unique 11-digit phone number, validated before any store mutation.
    pub phone: String,
    /// Withdrawable stored value, in minor units (cents). Never negative.
    pub stored_balance_minor: i64,
    /// Promotional balance, in minor units. Drawn before stored value.
    pub bonus_balance_minor: i64,
    /// Accumulated points; accrue on monetary recharges, never decremented.
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

impl Member {
    pub fn total_balance_minor(&self) -> i64 {
        self.stored_balance_minor + self.bonus_balance_minor
    }
}

/// A member row plus the resolved reference data a list view needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberOverview {
    pub member: Member,
    pub total_balance_minor: i64,
    /// Names of the membership types the member currently holds.
    pub membership_type_names: Vec<String>,
    pub level: Option<PointLevel>,
}

/// Full detail for a single member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub member: Member,
    pub entitlements: Vec<(Entitlement, MembershipType)>,
    pub level: Option<PointLevel>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub phone: String,
    pub stored_balance_minor: i64,
    pub bonus_balance_minor: i64,
    pub points: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::entitlements::Entity")]
    Entitlements,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::entitlements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entitlements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Member> for ActiveModel {
    fn from(member: &Member) -> Self {
        Self {
            id: ActiveValue::Set(member.id.to_string()),
            name: ActiveValue::Set(member.name.clone()),
            phone: ActiveValue::Set(member.phone.clone()),
            stored_balance_minor: ActiveValue::Set(member.stored_balance_minor),
            bonus_balance_minor: ActiveValue::Set(member.bonus_balance_minor),
            points: ActiveValue::Set(member.points),
            created_at: ActiveValue::Set(member.created_at),
        }
    }
}

impl TryFrom<Model> for Member {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            name: model.name,
            phone: model.phone,
            stored_balance_minor: model.stored_balance_minor,
            bonus_balance_minor: model.bonus_balance_minor,
            points: model.points,
            created_at: model.created_at,
        })
    }
}
