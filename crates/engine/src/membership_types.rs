//! Membership type catalog entries.
//!
//! A type is a purchasable entitlement template: plain stored value, a
//! duration card (year/season/month), a count card consumed by unit, or a
//! custom arrangement. Edits apply retroactively to the definition only;
//! recorded ledger rows are never revised.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

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

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::Year => "year",
            Self::Season => "season",
            Self::Month => "month",
            Self::Times => "times",
            Self::Custom => "custom",
        }
    }

    /// True for kinds bounded by a validity window.
    pub fn is_duration(self) -> bool {
        matches!(self, Self::Year | Self::Season | Self::Month)
    }

    /// True for kinds consumed by unit count rather than currency.
    pub fn is_count(self) -> bool {
        matches!(self, Self::Times)
    }
}

impl TryFrom<&str> for TypeKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "stored" => Ok(Self::Stored),
            "year" => Ok(Self::Year),
            "season" => Ok(Self::Season),
            "month" => Ok(Self::Month),
            "times" => Ok(Self::Times),
            "custom" => Ok(Self::Custom),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid membership type kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MembershipType {
    pub id: Uuid,
    pub name: String,
    pub kind: TypeKind,
    /// Validity window length; present iff the kind is duration-based.
    pub duration_days: Option<i64>,
    /// Total uses granted on purchase; present iff the kind is count-based.
    pub total_times: Option<i64>,
    pub price_minor: Option<i64>,
    pub description: Option<String>,
}

impl MembershipType {
    pub fn new(
        name: String,
        kind: TypeKind,
        duration_days: Option<i64>,
        total_times: Option<i64>,
        price_minor: Option<i64>,
        description: Option<String>,
    ) -> ResultEngine<Self> {
        validate_kind_fields(kind, duration_days, total_times)?;
        if let Some(price) = price_minor
            && price < 0
        {
            return Err(EngineError::InvalidAmount(
                "price must not be negative".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            kind,
            // Only carry the field relevant for the kind.
            duration_days: duration_days.filter(|_| kind.is_duration()),
            total_times: total_times.filter(|_| kind.is_count()),
            price_minor,
            description,
        })
    }
}

/// Enforce the kind/field pairing invariant for the catalog.
pub(crate) fn validate_kind_fields(
    kind: TypeKind,
    duration_days: Option<i64>,
    total_times: Option<i64>,
) -> ResultEngine<()> {
    if kind.is_duration() {
        match duration_days {
            Some(days) if days > 0 => {}
            _ => {
                return Err(EngineError::InvalidAmount(
                    "duration kinds require duration_days > 0".to_string(),
                ));
            }
        }
    }
    if kind.is_count() {
        match total_times {
            Some(times) if times > 0 => {}
            _ => {
                return Err(EngineError::InvalidAmount(
                    "count kinds require total_times > 0".to_string(),
                ));
            }
        }
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "membership_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub kind: String,
    pub duration_days: Option<i64>,
    pub total_times: Option<i64>,
    pub price_minor: Option<i64>,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::entitlements::Entity")]
    Entitlements,
}

impl Related<super::entitlements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entitlements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&MembershipType> for ActiveModel {
    fn from(membership_type: &MembershipType) -> Self {
        Self {
            id: ActiveValue::Set(membership_type.id.to_string()),
            name: ActiveValue::Set(membership_type.name.clone()),
            kind: ActiveValue::Set(membership_type.kind.as_str().to_string()),
            duration_days: ActiveValue::Set(membership_type.duration_days),
            total_times: ActiveValue::Set(membership_type.total_times),
            price_minor: ActiveValue::Set(membership_type.price_minor),
            description: ActiveValue::Set(membership_type.description.clone()),
        }
    }
}

impl TryFrom<Model> for MembershipType {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("membership type not exists".to_string()))?,
            name: model.name,
            kind: TypeKind::try_from(model.kind.as_str())?,
            duration_days: model.duration_days,
            total_times: model.total_times,
            price_minor: model.price_minor,
            description: model.description,
        })
    }
}
