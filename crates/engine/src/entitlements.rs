//! Per-member membership-type instances.
//!
//! An entitlement tracks one member's grant of a catalog type: a validity
//! window for duration cards, a remaining-use counter for count cards.
//! Expired rows are kept for history; they are simply no longer usable.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub id: Uuid,
    pub member_id: Uuid,
    pub type_id: Uuid,
    pub start_date: DateTime<Utc>,
    /// Present iff the type is duration-based.
    pub end_date: Option<DateTime<Utc>>,
    /// Present iff the type is count-based. Never goes below 0.
    pub remaining_uses: Option<i64>,
}

impl Entitlement {
    /// Whether the validity window (if any) is still open. The end date is
    /// inclusive.
    pub fn window_open(&self, now: DateTime<Utc>) -> bool {
        self.end_date.is_none_or(|end| now <= end)
    }

    /// Usable right now: window open and, for count cards, uses left.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.window_open(now) && self.remaining_uses.is_none_or(|uses| uses > 0)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "entitlements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub member_id: String,
    pub type_id: String,
    pub start_date: DateTimeUtc,
    pub end_date: Option<DateTimeUtc>,
    pub remaining_uses: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Members,
    #[sea_orm(
        belongs_to = "super::membership_types::Entity",
        from = "Column::TypeId",
        to = "super::membership_types::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    MembershipTypes,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::membership_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MembershipTypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Entitlement> for ActiveModel {
    fn from(entitlement: &Entitlement) -> Self {
        Self {
            id: ActiveValue::Set(entitlement.id.to_string()),
            member_id: ActiveValue::Set(entitlement.member_id.to_string()),
            type_id: ActiveValue::Set(entitlement.type_id.to_string()),
            start_date: ActiveValue::Set(entitlement.start_date),
            end_date: ActiveValue::Set(entitlement.end_date),
            remaining_uses: ActiveValue::Set(entitlement.remaining_uses),
        }
    }
}

impl TryFrom<Model> for Entitlement {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let parse = |value: &str| {
            Uuid::parse_str(value)
                .map_err(|_| EngineError::KeyNotFound("entitlement not exists".to_string()))
        };
        Ok(Self {
            id: parse(&model.id)?,
            member_id: parse(&model.member_id)?,
            type_id: parse(&model.type_id)?,
            start_date: model.start_date,
            end_date: model.end_date,
            remaining_uses: model.remaining_uses,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entitlement(end: Option<DateTime<Utc>>, uses: Option<i64>) -> Entitlement {
        Entitlement {
            id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            type_id: Uuid::new_v4(),
            start_date: Utc::now() - Duration::days(10),
            end_date: end,
            remaining_uses: uses,
        }
    }

    #[test]
    fn open_window_without_count_is_valid() {
        let now = Utc::now();
        assert!(entitlement(Some(now + Duration::days(1)), None).is_valid(now));
        assert!(entitlement(None, None).is_valid(now));
    }

    #[test]
    fn end_date_is_inclusive() {
        let now = Utc::now();
        assert!(entitlement(Some(now), None).is_valid(now));
        assert!(!entitlement(Some(now - Duration::seconds(1)), None).is_valid(now));
    }

    #[test]
    fn exhausted_count_card_is_invalid() {
        let now = Utc::now();
        assert!(entitlement(None, Some(1)).is_valid(now));
        assert!(!entitlement(None, Some(0)).is_valid(now));
    }
}
