//! Catalog operations: membership types and point-level discount tiers.
//!
//! Reference data for the transaction engine. Read-mostly; the engine
//! fetches it fresh per transaction, so no caching layer exists here.

use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, MembershipType, PointLevel, ResultEngine, TypeKind, entitlements,
    membership_types::{self, validate_kind_fields},
    point_levels::{self, validate_level_fields},
};

use super::{Engine, with_tx};

impl Engine {
    pub(super) async fn require_membership_type(
        &self,
        conn: &impl ConnectionTrait,
        type_id: Uuid,
    ) -> ResultEngine<MembershipType> {
        let model = membership_types::Entity::find_by_id(type_id.to_string())
            .one(conn)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("membership type not exists".to_string()))?;
        MembershipType::try_from(model)
    }

    pub async fn list_membership_types(&self) -> ResultEngine<Vec<MembershipType>> {
        let models = membership_types::Entity::find()
            .order_by_asc(membership_types::Column::Name)
            .all(&self.database)
            .await?;
        models.into_iter().map(MembershipType::try_from).collect()
    }

    pub async fn membership_type(&self, type_id: Uuid) -> ResultEngine<MembershipType> {
        self.require_membership_type(&self.database, type_id).await
    }

    pub async fn create_membership_type(
        &self,
        name: &str,
        kind: TypeKind,
        duration_days: Option<i64>,
        total_times: Option<i64>,
        price_minor: Option<i64>,
        description: Option<String>,
    ) -> ResultEngine<MembershipType> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidAmount(
                "membership type name must not be empty".to_string(),
            ));
        }
        let membership_type = MembershipType::new(
            name.to_string(),
            kind,
            duration_days,
            total_times,
            price_minor,
            description,
        )?;

        with_tx!(self, |db_tx| {
            let clash = membership_types::Entity::find()
                .filter(membership_types::Column::Name.eq(name))
                .one(&db_tx)
                .await?;
            if clash.is_some() {
                return Err(EngineError::ExistingKey(name.to_string()));
            }
            membership_types::ActiveModel::from(&membership_type)
                .insert(&db_tx)
                .await?;
            Ok(membership_type)
        })
    }

    /// Administrative correction of a catalog entry. Applies retroactively to
    /// the definition only; recorded ledger rows keep their amounts.
    pub async fn update_membership_type(
        &self,
        type_id: Uuid,
        name: &str,
        kind: TypeKind,
        duration_days: Option<i64>,
        total_times: Option<i64>,
        price_minor: Option<i64>,
        description: Option<String>,
    ) -> ResultEngine<MembershipType> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidAmount(
                "membership type name must not be empty".to_string(),
            ));
        }
        validate_kind_fields(kind, duration_days, total_times)?;

        with_tx!(self, |db_tx| {
            let model = membership_types::Entity::find_by_id(type_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound("membership type not exists".to_string())
                })?;
            let clash = membership_types::Entity::find()
                .filter(membership_types::Column::Name.eq(name))
                .filter(membership_types::Column::Id.ne(type_id.to_string()))
                .one(&db_tx)
                .await?;
            if clash.is_some() {
                return Err(EngineError::ExistingKey(name.to_string()));
            }

            let mut active: membership_types::ActiveModel = model.into();
            active.name = ActiveValue::Set(name.to_string());
            active.kind = ActiveValue::Set(kind.as_str().to_string());
            active.duration_days = ActiveValue::Set(duration_days.filter(|_| kind.is_duration()));
            active.total_times = ActiveValue::Set(total_times.filter(|_| kind.is_count()));
            active.price_minor = ActiveValue::Set(price_minor);
            active.description = ActiveValue::Set(description);
            let updated = active.update(&db_tx).await?;
            MembershipType::try_from(updated)
        })
    }

    /// Deletes a catalog entry. Refused while entitlements still reference
    /// it; history stays intact.
    pub async fn delete_membership_type(&self, type_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let membership_type = self.require_membership_type(&db_tx, type_id).await?;
            let referenced = entitlements::Entity::find()
                .filter(entitlements::Column::TypeId.eq(type_id.to_string()))
                .one(&db_tx)
                .await?;
            if referenced.is_some() {
                return Err(EngineError::Referenced(membership_type.name));
            }
            membership_types::Entity::delete_by_id(type_id.to_string())
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }

    /// Point levels ordered by `min_points` ascending, the shape
    /// [`crate::resolve_level`] expects.
    pub async fn list_point_levels(&self) -> ResultEngine<Vec<PointLevel>> {
        let models = point_levels::Entity::find()
            .order_by_asc(point_levels::Column::MinPoints)
            .all(&self.database)
            .await?;
        models.into_iter().map(PointLevel::try_from).collect()
    }

    pub async fn create_point_level(
        &self,
        name: &str,
        min_points: i64,
        max_points: Option<i64>,
        discount: f64,
    ) -> ResultEngine<PointLevel> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidAmount(
                "point level name must not be empty".to_string(),
            ));
        }
        let level = PointLevel::new(name.to_string(), min_points, max_points, discount)?;

        with_tx!(self, |db_tx| {
            self.ensure_tier_fits(&db_tx, &level, None).await?;
            point_levels::ActiveModel::from(&level).insert(&db_tx).await?;
            Ok(level)
        })
    }

    pub async fn update_point_level(
        &self,
        level_id: Uuid,
        name: &str,
        min_points: i64,
        max_points: Option<i64>,
        discount: f64,
    ) -> ResultEngine<PointLevel> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EngineError::InvalidAmount(
                "point level name must not be empty".to_string(),
            ));
        }
        validate_level_fields(min_points, max_points, discount)?;

        with_tx!(self, |db_tx| {
            let model = point_levels::Entity::find_by_id(level_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("point level not exists".to_string()))?;
            let level = PointLevel {
                id: level_id,
                name: name.to_string(),
                min_points,
                max_points,
                discount,
            };
            self.ensure_tier_fits(&db_tx, &level, Some(level_id)).await?;

            let mut active: point_levels::ActiveModel = model.into();
            active.name = ActiveValue::Set(level.name.clone());
            active.min_points = ActiveValue::Set(min_points);
            active.max_points = ActiveValue::Set(max_points);
            active.discount = ActiveValue::Set(discount);
            active.update(&db_tx).await?;
            Ok(level)
        })
    }

    pub async fn delete_point_level(&self, level_id: Uuid) -> ResultEngine<()> {
        let deleted = point_levels::Entity::delete_by_id(level_id.to_string())
            .exec(&self.database)
            .await?;
        if deleted.rows_affected == 0 {
            return Err(EngineError::KeyNotFound("point level not exists".to_string()));
        }
        Ok(())
    }

    /// Tiers must not overlap: `[min, max]` intervals (open-ended when `max`
    /// is absent) are checked pairwise against the stored set.
    async fn ensure_tier_fits(
        &self,
        conn: &impl ConnectionTrait,
        candidate: &PointLevel,
        exclude: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = point_levels::Entity::find();
        if let Some(level_id) = exclude {
            query = query.filter(point_levels::Column::Id.ne(level_id.to_string()));
        }
        for model in query.all(conn).await? {
            let other = PointLevel::try_from(model)?;
            let candidate_below = candidate
                .max_points
                .is_some_and(|max| max < other.min_points);
            let other_below = other
                .max_points
                .is_some_and(|max| max < candidate.min_points);
            if !candidate_below && !other_below {
                return Err(EngineError::InvalidAmount(format!(
                    "point level overlaps existing tier \"{}\"",
                    other.name
                )));
            }
        }
        Ok(())
    }
}
