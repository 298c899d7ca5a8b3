//! Common test utilities
//!
//! Integration tests need a Postgres database with the migrations applied
//! (`DATABASE_URL`). When the variable is unset the tests skip instead of
//! failing, so the suite stays runnable without infrastructure.
//!
//! Isolation comes from per-test users and generated currency codes, not
//! truncation, so the tests can run in parallel against one database.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use cambio::fx::{ArsSource, FxService};
use cambio::services::{AccountService, TransactionService};
use cambio::store::{
    AccountStore, BalanceStore, PendingStore, RateStore, TransactionStore, UserPrefsStore,
    UserStore,
};

pub async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("skipping: DATABASE_URL not set");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    Some(pool)
}

/// The full service graph over one pool.
pub struct Engine {
    pub users: UserStore,
    pub accounts: AccountService,
    pub transactions: TransactionService,
    pub balances: BalanceStore,
    pub pending: PendingStore,
    pub rates: RateStore,
    pub prefs: UserPrefsStore,
}

pub fn build_engine(pool: &PgPool) -> Engine {
    let users = UserStore::new(pool.clone());
    let balances = BalanceStore::new(pool.clone());
    let accounts = AccountService::new(AccountStore::new(pool.clone()), balances.clone());
    let pending = PendingStore::new(pool.clone());
    let rates = RateStore::new(pool.clone());
    let fx = FxService::new(rates.clone(), ArsSource::Blue, Duration::from_secs(2));
    let transactions = TransactionService::new(
        pool.clone(),
        users.clone(),
        accounts.clone(),
        TransactionStore::new(pool.clone()),
        pending.clone(),
        fx,
    );

    Engine {
        users,
        accounts,
        transactions,
        balances,
        pending,
        rates,
        prefs: UserPrefsStore::new(pool.clone()),
    }
}

/// A currency code no provider covers and no other test shares, so rate
/// lookups are deterministic (and offline) until a row is seeded.
pub fn unique_currency(prefix: char) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}{}", prefix, &id[..6].to_uppercase())
}

pub fn unique_external_id() -> String {
    format!("test-{}", Uuid::new_v4())
}
