//! Ledger primitives.
//!
//! A `Transaction` is an immutable, append-only record of one committed
//! balance or counter mutation. Rows are never updated; they are deleted
//! only as part of whole-member removal.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Recharge,
    Bonus,
    Consume,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recharge => "recharge",
            Self::Bonus => "bonus",
            Self::Consume => "consume",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "recharge" => Ok(Self::Recharge),
            "bonus" => Ok(Self::Bonus),
            "consume" => Ok(Self::Consume),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub member_id: Uuid,
    pub kind: TransactionKind,
    /// The amount actually applied: post-discount for balance consumption,
    /// 0 for a count-card draw, the unit count for a count-card top-up.
    pub amount_minor: i64,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        member_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor < 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must not be negative".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            member_id,
            kind,
            amount_minor,
            description,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub member_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
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
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            member_id: ActiveValue::Set(tx.member_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            description: ActiveValue::Set(tx.description.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("transaction not exists".to_string()))?,
            member_id: Uuid::parse_str(&model.member_id)
                .map_err(|_| EngineError::KeyNotFound("member not exists".to_string()))?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            description: model.description,
            created_at: model.created_at,
        })
    }
}
