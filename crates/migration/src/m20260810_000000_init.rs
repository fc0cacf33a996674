//! Initial schema migration - creates all tables from scratch.
//!
//! The complete schema for Tessera:
//!
//! - `admins`: back-office authentication
//! - `members`: member accounts with balances and points
//! - `membership_types`: purchasable entitlement templates
//! - `entitlements`: per-member grants of a type (window or use counter)
//! - `point_levels`: discount tiers keyed on accumulated points
//! - `transactions`: the append-only ledger

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Admins {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum Members {
    Table,
    Id,
    Name,
    Phone,
    StoredBalanceMinor,
    BonusBalanceMinor,
    Points,
    CreatedAt,
}

#[derive(Iden)]
enum MembershipTypes {
    Table,
    Id,
    Name,
    Kind,
    DurationDays,
    TotalTimes,
    PriceMinor,
    Description,
}

#[derive(Iden)]
enum Entitlements {
    Table,
    Id,
    MemberId,
    TypeId,
    StartDate,
    EndDate,
    RemainingUses,
}

#[derive(Iden)]
enum PointLevels {
    Table,
    Id,
    Name,
    MinPoints,
    MaxPoints,
    Discount,
}

#[derive(Iden)]
enum Transactions {
    Table,
    Id,
    MemberId,
    Kind,
    AmountMinor,
    Description,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Admins
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Admins::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Admins::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Admins::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Members
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Members::Name).string().not_null())
                    .col(ColumnDef::new(Members::Phone).string().not_null())
                    .col(
                        ColumnDef::new(Members::StoredBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Members::BonusBalanceMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Members::Points).big_integer().not_null())
                    .col(ColumnDef::new(Members::CreatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-members-phone-unique")
                    .table(Members::Table)
                    .col(Members::Phone)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Membership types
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(MembershipTypes::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MembershipTypes::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MembershipTypes::Name).string().not_null())
                    .col(ColumnDef::new(MembershipTypes::Kind).string().not_null())
                    .col(ColumnDef::new(MembershipTypes::DurationDays).big_integer())
                    .col(ColumnDef::new(MembershipTypes::TotalTimes).big_integer())
                    .col(ColumnDef::new(MembershipTypes::PriceMinor).big_integer())
                    .col(ColumnDef::new(MembershipTypes::Description).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-membership_types-name-unique")
                    .table(MembershipTypes::Table)
                    .col(MembershipTypes::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Entitlements
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Entitlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Entitlements::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Entitlements::MemberId).string().not_null())
                    .col(ColumnDef::new(Entitlements::TypeId).string().not_null())
                    .col(
                        ColumnDef::new(Entitlements::StartDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Entitlements::EndDate).timestamp())
                    .col(ColumnDef::new(Entitlements::RemainingUses).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entitlements-member_id")
                            .from(Entitlements::Table, Entitlements::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-entitlements-type_id")
                            .from(Entitlements::Table, Entitlements::TypeId)
                            .to(MembershipTypes::Table, MembershipTypes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-entitlements-member_id-type_id")
                    .table(Entitlements::Table)
                    .col(Entitlements::MemberId)
                    .col(Entitlements::TypeId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Point levels
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PointLevels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PointLevels::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PointLevels::Name).string().not_null())
                    .col(
                        ColumnDef::new(PointLevels::MinPoints)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PointLevels::MaxPoints).big_integer())
                    .col(ColumnDef::new(PointLevels::Discount).double().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-point_levels-min_points")
                    .table(PointLevels::Table)
                    .col(PointLevels::MinPoints)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Transactions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::MemberId).string().not_null())
                    .col(ColumnDef::new(Transactions::Kind).string().not_null())
                    .col(
                        ColumnDef::new(Transactions::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Description).string())
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transactions-member_id")
                            .from(Transactions::Table, Transactions::MemberId)
                            .to(Members::Table, Members::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-member_id-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::MemberId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transactions-created_at")
                    .table(Transactions::Table)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PointLevels::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Entitlements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(MembershipTypes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Admins::Table).to_owned())
            .await?;
        Ok(())
    }
}
