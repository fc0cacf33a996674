//! Point-level discount tiers.
//!
//! Tiers are keyed by an inclusive `min_points` lower bound; the top tier
//! may be open-ended (`max_points` absent). Tiers must not overlap. The
//! applicable tier for a member is the greatest `min_points` that does not
//! exceed the member's points.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointLevel {
    pub id: Uuid,
    pub name: String,
    pub min_points: i64,
    pub max_points: Option<i64>,
    /// Discount multiplier in `(0, 1]`; 1 means no discount.
    pub discount: f64,
}

impl PointLevel {
    pub fn new(
        name: String,
        min_points: i64,
        max_points: Option<i64>,
        discount: f64,
    ) -> ResultEngine<Self> {
        validate_level_fields(min_points, max_points, discount)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            min_points,
            max_points,
            discount,
        })
    }
}

pub(crate) fn validate_level_fields(
    min_points: i64,
    max_points: Option<i64>,
    discount: f64,
) -> ResultEngine<()> {
    if min_points < 0 {
        return Err(EngineError::InvalidAmount(
            "min_points must not be negative".to_string(),
        ));
    }
    if let Some(max) = max_points
        && max <= min_points
    {
        return Err(EngineError::InvalidAmount(
            "max_points must be greater than min_points".to_string(),
        ));
    }
    if !(discount > 0.0 && discount <= 1.0) {
        return Err(EngineError::InvalidAmount(
            "discount must be in (0, 1]".to_string(),
        ));
    }
    Ok(())
}

/// Resolves the tier applicable to `points`: the level with the greatest
/// `min_points` not exceeding it. `levels` must be sorted by `min_points`
/// ascending, as returned by the catalog.
pub fn resolve_level(points: i64, levels: &[PointLevel]) -> Option<&PointLevel> {
    levels
        .iter()
        .take_while(|level| level.min_points <= points)
        .last()
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "point_levels")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub min_points: i64,
    pub max_points: Option<i64>,
    pub discount: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&PointLevel> for ActiveModel {
    fn from(level: &PointLevel) -> Self {
        Self {
            id: ActiveValue::Set(level.id.to_string()),
            name: ActiveValue::Set(level.name.clone()),
            min_points: ActiveValue::Set(level.min_points),
            max_points: ActiveValue::Set(level.max_points),
            discount: ActiveValue::Set(level.discount),
        }
    }
}

impl TryFrom<Model> for PointLevel {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("point level not exists".to_string()))?,
            name: model.name,
            min_points: model.min_points,
            max_points: model.max_points,
            discount: model.discount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(name: &str, min: i64, max: Option<i64>, discount: f64) -> PointLevel {
        PointLevel {
            id: Uuid::new_v4(),
            name: name.to_string(),
            min_points: min,
            max_points: max,
            discount,
        }
    }

    #[test]
    fn resolves_greatest_lower_bound() {
        let levels = vec![
            level("silver", 0, Some(999), 0.95),
            level("gold", 1000, Some(4999), 0.9),
            level("platinum", 5000, None, 0.85),
        ];

        assert_eq!(resolve_level(0, &levels).map(|l| l.name.as_str()), Some("silver"));
        assert_eq!(resolve_level(999, &levels).map(|l| l.name.as_str()), Some("silver"));
        assert_eq!(resolve_level(1000, &levels).map(|l| l.name.as_str()), Some("gold"));
        assert_eq!(resolve_level(120_000, &levels).map(|l| l.name.as_str()), Some("platinum"));
    }

    #[test]
    fn no_tier_below_the_first_bound() {
        let levels = vec![level("gold", 1000, None, 0.9)];
        assert!(resolve_level(999, &levels).is_none());
        assert!(resolve_level(0, &[]).is_none());
    }

    #[test]
    fn validation_rejects_bad_fields() {
        assert!(PointLevel::new("x".into(), -1, None, 0.9).is_err());
        assert!(PointLevel::new("x".into(), 0, Some(0), 0.9).is_err());
        assert!(PointLevel::new("x".into(), 0, None, 0.0).is_err());
        assert!(PointLevel::new("x".into(), 0, None, 1.2).is_err());
        assert!(PointLevel::new("x".into(), 0, None, 1.0).is_ok());
    }
}
