use chrono::{Datelike, Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    BonusCmd, ConsumeCmd, Engine, EngineError, EnrollMemberCmd, RechargeCmd, TransactionKind,
    TypeKind,
};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

#[tokio::test]
async fn recharge_adds_stored_value_points_and_ledger() {
    let (engine, _db) = engine_with_db().await;
    let member = engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001"))
        .await
        .unwrap();

    let member = engine
        .recharge(RechargeCmd::new(member.id, 10_000).description("counter top-up"))
        .await
        .unwrap();

    assert_eq!(member.stored_balance_minor, 10_000);
    assert_eq!(member.bonus_balance_minor, 0);
    assert_eq!(member.points, 1_000);

    let ledger = engine.list_transactions(member.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, TransactionKind::Recharge);
    assert_eq!(ledger[0].amount_minor, 10_000);
    assert_eq!(ledger[0].description.as_deref(), Some("counter top-up"));
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    let member = engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001"))
        .await
        .unwrap();

    for amount in [0, -500] {
        assert!(matches!(
            engine.recharge(RechargeCmd::new(member.id, amount)).await,
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.bonus(BonusCmd::new(member.id, amount)).await,
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.consume(ConsumeCmd::new(member.id, amount)).await,
            Err(EngineError::InvalidAmount(_))
        ));
    }
    assert!(engine.list_transactions(member.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn consume_depletes_bonus_before_stored() {
    let (engine, _db) = engine_with_db().await;
    let member = engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001"))
        .await
        .unwrap();
    engine
        .recharge(RechargeCmd::new(member.id, 10_000))
        .await
        .unwrap();
    engine.bonus(BonusCmd::new(member.id, 2_000)).await.unwrap();

    let member = engine
        .consume(ConsumeCmd::new(member.id, 3_000))
        .await
        .unwrap();

    assert_eq!(member.bonus_balance_minor, 0);
    assert_eq!(member.stored_balance_minor, 9_000);

    let ledger = engine.list_transactions(member.id).await.unwrap();
    assert_eq!(ledger[0].kind, TransactionKind::Consume);
    assert_eq!(ledger[0].amount_minor, 3_000);
}

#[tokio::test]
async fn small_consumption_leaves_stored_balance_untouched() {
    let (engine, _db) = engine_with_db().await;
    let member = engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001"))
        .await
        .unwrap();
    engine
        .recharge(RechargeCmd::new(member.id, 10_000))
        .await
        .unwrap();
    engine.bonus(BonusCmd::new(member.id, 5_000)).await.unwrap();

    // The charge fits entirely within the bonus balance.
    let member = engine
        .consume(ConsumeCmd::new(member.id, 3_000))
        .await
        .unwrap();

    assert_eq!(member.bonus_balance_minor, 2_000);
    assert_eq!(member.stored_balance_minor, 10_000);
}

#[tokio::test]
async fn consume_beyond_total_balance_changes_nothing() {
    let (engine, _db) = engine_with_db().await;
    let member = engine
        .enroll_member(
            EnrollMemberCmd::new("Ada", "13800000001")
                .initial_stored_minor(1_000)
                .initial_bonus_minor(500),
        )
        .await
        .unwrap();

    let err = engine
        .consume(ConsumeCmd::new(member.id, 2_000))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    let profile = engine.member(member.id).await.unwrap();
    assert_eq!(profile.member.stored_balance_minor, 1_000);
    assert_eq!(profile.member.bonus_balance_minor, 500);
    // Only the two enrollment rows exist.
    assert_eq!(engine.list_transactions(member.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn enrollment_funding_is_ledgered_and_earns_points() {
    let (engine, _db) = engine_with_db().await;
    let member = engine
        .enroll_member(
            EnrollMemberCmd::new("Ada", "13800000001")
                .initial_stored_minor(20_000)
                .initial_bonus_minor(5_000),
        )
        .await
        .unwrap();

    assert_eq!(member.stored_balance_minor, 20_000);
    assert_eq!(member.bonus_balance_minor, 5_000);
    assert_eq!(member.points, 2_000);

    let ledger = engine.list_transactions(member.id).await.unwrap();
    assert_eq!(ledger.len(), 2);
    assert!(
        ledger
            .iter()
            .any(|tx| tx.kind == TransactionKind::Recharge && tx.amount_minor == 20_000)
    );
    assert!(
        ledger
            .iter()
            .any(|tx| tx.kind == TransactionKind::Bonus && tx.amount_minor == 5_000)
    );
}

#[tokio::test]
async fn duplicate_phone_enrollment_rolls_back_entirely() {
    let (engine, _db) = engine_with_db().await;
    engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001"))
        .await
        .unwrap();
    let year_card = engine
        .create_membership_type("Year card", TypeKind::Year, Some(365), None, None, None)
        .await
        .unwrap();

    let err = engine
        .enroll_member(
            EnrollMemberCmd::new("Eve", "13800000001")
                .initial_stored_minor(5_000)
                .grant_type(year_card.id),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));
    assert_eq!(engine.list_members().await.unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_phone_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    for phone in ["1380000000", "138000000012", "1380000000a"] {
        assert!(matches!(
            engine
                .enroll_member(EnrollMemberCmd::new("Ada", phone))
                .await,
            Err(EngineError::InvalidPhone(_))
        ));
    }
}

#[tokio::test]
async fn count_card_draws_until_exhausted() {
    let (engine, _db) = engine_with_db().await;
    let punch_card = engine
        .create_membership_type("Punch card", TypeKind::Times, None, Some(2), None, None)
        .await
        .unwrap();
    let member = engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001").grant_type(punch_card.id))
        .await
        .unwrap();

    let member = engine
        .consume(ConsumeCmd::new(member.id, 0).membership_type_id(punch_card.id))
        .await
        .unwrap();
    assert_eq!(member.stored_balance_minor, 0);

    let profile = engine.member(member.id).await.unwrap();
    assert_eq!(profile.entitlements[0].0.remaining_uses, Some(1));
    let ledger = engine.list_transactions(member.id).await.unwrap();
    assert_eq!(ledger[0].kind, TransactionKind::Consume);
    assert_eq!(ledger[0].amount_minor, 0);

    engine
        .consume(ConsumeCmd::new(member.id, 0).membership_type_id(punch_card.id))
        .await
        .unwrap();
    let err = engine
        .consume(ConsumeCmd::new(member.id, 0).membership_type_id(punch_card.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EntitlementExhausted(_)));
}

#[tokio::test]
async fn count_card_topup_adds_uses_without_touching_money() {
    let (engine, _db) = engine_with_db().await;
    let punch_card = engine
        .create_membership_type("Punch card", TypeKind::Times, None, Some(5), None, None)
        .await
        .unwrap();
    let member = engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001").grant_type(punch_card.id))
        .await
        .unwrap();

    let member = engine
        .recharge(RechargeCmd::new(member.id, 3).membership_type_id(punch_card.id))
        .await
        .unwrap();

    assert_eq!(member.stored_balance_minor, 0);
    assert_eq!(member.points, 0);
    let profile = engine.member(member.id).await.unwrap();
    assert_eq!(profile.entitlements[0].0.remaining_uses, Some(8));

    let ledger = engine.list_transactions(member.id).await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].kind, TransactionKind::Recharge);
    assert_eq!(ledger[0].amount_minor, 3);
}

#[tokio::test]
async fn expired_card_cannot_be_drawn() {
    let (engine, db) = engine_with_db().await;
    let punch_card = engine
        .create_membership_type("Punch card", TypeKind::Times, None, Some(5), None, None)
        .await
        .unwrap();
    let member = engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001").grant_type(punch_card.id))
        .await
        .unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE entitlements SET end_date = ? WHERE member_id = ?",
        vec![(Utc::now() - Duration::days(1)).into(), member.id.to_string().into()],
    ))
    .await
    .unwrap();

    let err = engine
        .consume(ConsumeCmd::new(member.id, 0).membership_type_id(punch_card.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EntitlementExpired(_)));
}

#[tokio::test]
async fn lapsed_duration_card_blocks_monetary_consumption() {
    let (engine, db) = engine_with_db().await;
    let year_card = engine
        .create_membership_type("Year card", TypeKind::Year, Some(365), None, None, None)
        .await
        .unwrap();
    let member = engine
        .enroll_member(
            EnrollMemberCmd::new("Ada", "13800000001")
                .initial_stored_minor(10_000)
                .grant_type(year_card.id),
        )
        .await
        .unwrap();

    // A consumption presented against the still-open card goes through.
    engine
        .consume(ConsumeCmd::new(member.id, 1_000).membership_type_id(year_card.id))
        .await
        .unwrap();

    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "UPDATE entitlements SET end_date = ? WHERE member_id = ?",
        vec![(Utc::now() - Duration::days(1)).into(), member.id.to_string().into()],
    ))
    .await
    .unwrap();

    let err = engine
        .consume(ConsumeCmd::new(member.id, 1_000).membership_type_id(year_card.id))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EntitlementExpired(_)));

    // Balances are untouched by the refused draw.
    let profile = engine.member(member.id).await.unwrap();
    assert_eq!(profile.member.stored_balance_minor, 9_000);
}

#[tokio::test]
async fn point_level_discount_applies_to_consumption() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_point_level("Gold", 1_000, None, 0.9)
        .await
        .unwrap();
    let member = engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001"))
        .await
        .unwrap();
    engine
        .recharge(RechargeCmd::new(member.id, 10_000))
        .await
        .unwrap();

    // 1000 points put the member on the Gold tier.
    let member = engine
        .consume(ConsumeCmd::new(member.id, 3_000))
        .await
        .unwrap();

    assert_eq!(member.stored_balance_minor, 7_300);
    let ledger = engine.list_transactions(member.id).await.unwrap();
    assert_eq!(ledger[0].amount_minor, 2_700);

    let profile = engine.member(member.id).await.unwrap();
    assert_eq!(profile.level.unwrap().name, "Gold");
}

#[tokio::test]
async fn consumption_below_any_tier_pays_full_price() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_point_level("Gold", 1_000, None, 0.9)
        .await
        .unwrap();
    let member = engine
        .enroll_member(
            EnrollMemberCmd::new("Ada", "13800000001").initial_stored_minor(5_000),
        )
        .await
        .unwrap();

    // 500 points, below the Gold threshold.
    let member = engine
        .consume(ConsumeCmd::new(member.id, 3_000))
        .await
        .unwrap();
    assert_eq!(member.stored_balance_minor, 2_000);
}

#[tokio::test]
async fn overlapping_point_tiers_are_rejected() {
    let (engine, _db) = engine_with_db().await;
    engine
        .create_point_level("Silver", 0, Some(999), 0.95)
        .await
        .unwrap();
    let err = engine
        .create_point_level("Gold", 500, None, 0.9)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    engine
        .create_point_level("Gold", 1_000, None, 0.9)
        .await
        .unwrap();
    let levels = engine.list_point_levels().await.unwrap();
    assert_eq!(levels.len(), 2);
    assert_eq!(levels[0].name, "Silver");
}

#[tokio::test]
async fn referenced_type_cannot_be_deleted() {
    let (engine, _db) = engine_with_db().await;
    let punch_card = engine
        .create_membership_type("Punch card", TypeKind::Times, None, Some(5), None, None)
        .await
        .unwrap();
    let member = engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001").grant_type(punch_card.id))
        .await
        .unwrap();

    let err = engine
        .delete_membership_type(punch_card.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Referenced(_)));

    engine.remove_member(member.id).await.unwrap();
    engine.delete_membership_type(punch_card.id).await.unwrap();
    assert!(engine.list_membership_types().await.unwrap().is_empty());
}

#[tokio::test]
async fn member_update_keeps_phone_unique() {
    let (engine, _db) = engine_with_db().await;
    let ada = engine
        .enroll_member(EnrollMemberCmd::new("Ada", "13800000001"))
        .await
        .unwrap();
    engine
        .enroll_member(EnrollMemberCmd::new("Eve", "13800000002"))
        .await
        .unwrap();

    let err = engine
        .update_member(ada.id, "Ada", "13800000002")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ExistingKey(_)));

    let updated = engine
        .update_member(ada.id, "Ada Lovelace", "13800000003")
        .await
        .unwrap();
    assert_eq!(updated.name, "Ada Lovelace");
    assert_eq!(updated.phone, "13800000003");
}

#[tokio::test]
async fn remove_member_cascades_ledger_and_entitlements() {
    let (engine, _db) = engine_with_db().await;
    let punch_card = engine
        .create_membership_type("Punch card", TypeKind::Times, None, Some(5), None, None)
        .await
        .unwrap();
    let member = engine
        .enroll_member(
            EnrollMemberCmd::new("Ada", "13800000001")
                .initial_stored_minor(1_000)
                .grant_type(punch_card.id),
        )
        .await
        .unwrap();

    engine.remove_member(member.id).await.unwrap();

    assert!(matches!(
        engine.member(member.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
    assert!(matches!(
        engine.list_transactions(member.id).await,
        Err(EngineError::KeyNotFound(_))
    ));
}

#[tokio::test]
async fn monthly_report_aggregates_the_ledger() {
    let (engine, _db) = engine_with_db().await;
    let ada = engine
        .enroll_member(
            EnrollMemberCmd::new("Ada", "13800000001").initial_stored_minor(10_000),
        )
        .await
        .unwrap();
    engine
        .enroll_member(EnrollMemberCmd::new("Eve", "13800000002"))
        .await
        .unwrap();
    engine.bonus(BonusCmd::new(ada.id, 2_000)).await.unwrap();
    engine
        .consume(ConsumeCmd::new(ada.id, 3_000))
        .await
        .unwrap();

    let now = Utc::now();
    let report = engine
        .monthly_report(now.year(), now.month())
        .await
        .unwrap();

    assert_eq!(report.total_recharge_minor, 10_000);
    assert_eq!(report.total_bonus_minor, 2_000);
    assert_eq!(report.total_consume_minor, 3_000);
    assert_eq!(report.recharge_count, 1);
    assert_eq!(report.consume_count, 1);
    assert_eq!(report.active_member_count, 1);
    assert_eq!(report.total_members, 2);
    assert_eq!(report.valid_member_count, 1);
    assert_eq!(report.transactions.len(), 3);
    assert!(
        report
            .transactions
            .iter()
            .all(|entry| entry.member_name == "Ada")
    );

    assert!(matches!(
        engine.monthly_report(now.year(), 13).await,
        Err(EngineError::InvalidAmount(_))
    ));
}
