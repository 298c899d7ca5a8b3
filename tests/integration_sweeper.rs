//! Integration tests for the pending-transaction sweep.
//!
//! The sweep claims rows globally, so the whole lifecycle runs inside one
//! test function to keep the assertions deterministic.

use rust_decimal_macros::dec;

use cambio::domain::{PendingStatus, TransactionIntent, TransactionKind};
use cambio::jobs::{PendingSweeper, SweeperConfig};
use cambio::services::{PendingOutcome, TransactionOutcome};

mod common;

#[tokio::test]
async fn test_pending_sweep_lifecycle() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let engine = common::build_engine(&pool);
    let user = engine
        .users
        .get_or_create(&common::unique_external_id(), None)
        .await
        .unwrap();

    let account_currency = common::unique_currency('Q');
    let foreign_currency = common::unique_currency('X');

    // Give the account a position so the foreign-currency expense needs a
    // conversion, then queue it while the rate is unavailable.
    let account = engine
        .accounts
        .get_or_create_account(&user, "Sueldo", cambio::domain::AccountKind::Bank)
        .await
        .unwrap();
    engine
        .accounts
        .add_to_balance(&user, account.id, &account_currency, dec!(500000))
        .await
        .unwrap();

    let expense =
        TransactionIntent::new(TransactionKind::Expense, dec!(100), foreign_currency.clone())
            .with_account_from("Sueldo");
    let outcome = engine.transactions.create(&user, expense).await.unwrap();
    let pending_id = match outcome {
        TransactionOutcome::Queued { pending_id, .. } => pending_id,
        other => panic!("expected queued expense, got {:?}", other),
    };

    // --- Retry while the rate is still missing: the row stays, counted. ---
    let sweeper = PendingSweeper::with_config(
        engine.transactions.clone(),
        engine.pending.clone(),
        SweeperConfig {
            sweep_interval: std::time::Duration::from_secs(3600),
            max_retries: 3,
        },
    );

    sweeper.run_once().await;
    let row = engine.pending.get(pending_id).await.unwrap().expect("row survives");
    assert_eq!(row.retry_count, 1);
    assert_eq!(row.status, PendingStatus::Waiting);
    assert!(row
        .last_error
        .as_deref()
        .unwrap_or_default()
        .contains(&format!("{}/{}", foreign_currency, account_currency)));

    // --- The rate becomes available: the sweep applies the row exactly
    //     the way the immediate path would have. ---
    engine
        .rates
        .insert(
            &format!("{}/{}", foreign_currency, account_currency),
            dec!(1000),
            "seeded",
            chrono::Utc::now(),
        )
        .await
        .unwrap();

    let report = sweeper.run_once().await;
    assert!(report.applied >= 1);

    assert!(engine.pending.get(pending_id).await.unwrap().is_none());
    let balance = engine
        .balances
        .get(account.id, &account_currency)
        .await
        .unwrap()
        .expect("balance row");
    // 100 foreign at 1000 = 100,000 subtracted from 500,000.
    assert_eq!(balance.balance, dec!(400000));

    let start = chrono::Utc::now() - chrono::Duration::days(2);
    let end = chrono::Utc::now() + chrono::Duration::days(2);
    let total = engine
        .transactions
        .total_by_kind(&user, start, end, TransactionKind::Expense, Some(&foreign_currency))
        .await
        .unwrap();
    assert_eq!(total, dec!(100));

    // --- Retry budget: a row that never resolves caps at max_retries and
    //     parks in the exhausted state, never claimed again. ---
    let doomed_currency = common::unique_currency('X');
    let doomed = engine
        .transactions
        .create(
            &user,
            TransactionIntent::new(TransactionKind::Expense, dec!(5), doomed_currency)
                .with_account_from("Sueldo"),
        )
        .await
        .unwrap();
    let doomed_id = match doomed {
        TransactionOutcome::Queued { pending_id, .. } => pending_id,
        other => panic!("expected queued expense, got {:?}", other),
    };

    for _ in 0..5 {
        sweeper.run_once().await;
    }

    let row = engine.pending.get(doomed_id).await.unwrap().expect("row kept for review");
    assert_eq!(row.retry_count, 3, "retry budget is a hard cap");
    assert_eq!(row.status, PendingStatus::Exhausted);

    // --- Queue-then-resolve equivalence for a single row, via the same
    //     application path the sweeper uses. ---
    let eq_currency = common::unique_currency('X');
    let queued = engine
        .transactions
        .create(
            &user,
            TransactionIntent::new(TransactionKind::Income, dec!(7), eq_currency.clone())
                .with_account_to("Sueldo"),
        )
        .await
        .unwrap();
    let eq_id = match queued {
        TransactionOutcome::Queued { pending_id, .. } => pending_id,
        other => panic!("expected queued income, got {:?}", other),
    };

    engine
        .rates
        .insert(
            &format!("{}/{}", eq_currency, account_currency),
            dec!(2),
            "seeded",
            chrono::Utc::now(),
        )
        .await
        .unwrap();

    let row = engine.pending.get(eq_id).await.unwrap().expect("queued row");
    let outcome = engine.transactions.apply_pending(&row).await.unwrap();
    match outcome {
        PendingOutcome::Applied(record) => {
            assert_eq!(record.amount, dec!(7));
            assert_eq!(record.kind, TransactionKind::Income);
        }
        PendingOutcome::StillUnavailable { reason } => {
            panic!("rate was seeded but still unavailable: {}", reason)
        }
    }
    assert!(engine.pending.get(eq_id).await.unwrap().is_none());

    let balance = engine
        .balances
        .get(account.id, &account_currency)
        .await
        .unwrap()
        .expect("balance row");
    // 400,000 + 7 * 2
    assert_eq!(balance.balance, dec!(400014));
}
