//! Transaction service
//!
//! Orchestrates the four transaction kinds on top of the account service
//! and the rate resolver. Validation failures reject synchronously before
//! any mutation; pricing unavailability is never fatal for
//! income/expense/transfer — the request queues as a pending transaction
//! and the sweep retries it later.

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::money::{normalize_currency_code, quantize_storage};
use crate::domain::{
    is_generic_symbol, resolve_currency_symbol, AccountKind, DomainError, SymbolResolution,
    TransactionIntent, TransactionKind,
};
use crate::error::{AppError, AppResult};
use crate::fx::{pair_key, FxService};
use crate::store::{
    Account, AccountBalance, BalanceStore, NewPending, NewTransaction, PendingStore,
    PendingTransaction, TransactionQuery, TransactionRecord, TransactionStore, User, UserStore,
};

use super::accounts::AccountService;

/// Result of an accepted transaction request: applied now, or queued for
/// the pending sweep. Rejections are `Err` on the service call itself.
#[derive(Debug, Clone)]
pub enum TransactionOutcome {
    Completed(TransactionRecord),
    Queued { pending_id: Uuid, reason: String },
}

/// Result of retrying one pending row.
#[derive(Debug, Clone)]
pub enum PendingOutcome {
    Applied(TransactionRecord),
    StillUnavailable { reason: String },
}

/// One side of a transaction's balance effect, after currency resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LegResolution {
    Resolved { currency: String, amount: Decimal },
    Unresolved { pair: String },
}

#[derive(Clone)]
pub struct TransactionService {
    pool: PgPool,
    users: UserStore,
    accounts: AccountService,
    transactions: TransactionStore,
    pending: PendingStore,
    fx: FxService,
}

impl TransactionService {
    pub fn new(
        pool: PgPool,
        users: UserStore,
        accounts: AccountService,
        transactions: TransactionStore,
        pending: PendingStore,
        fx: FxService,
    ) -> Self {
        Self {
            pool,
            users,
            accounts,
            transactions,
            pending,
            fx,
        }
    }

    /// Create a transaction from a validated intent.
    ///
    /// Returns `Completed` when balances were mutated and the record
    /// written, `Queued` when a required rate was unavailable, and `Err`
    /// for validation or policy failures (nothing mutated).
    pub async fn create(
        &self,
        user: &User,
        intent: TransactionIntent,
    ) -> AppResult<TransactionOutcome> {
        intent.validate()?;

        let currency = self.resolve_symbol_field(user, &intent, &intent.currency).await?;
        let currency_to = match &intent.currency_to {
            Some(raw) => Some(self.resolve_symbol_field(user, &intent, raw).await?),
            None => None,
        };

        // Symbols may have resolved both sides of a conversion to one code.
        if intent.kind == TransactionKind::Conversion
            && currency_to.as_deref() == Some(currency.as_str())
        {
            return Err(DomainError::SameCurrencyConversion.into());
        }

        let date = intent.date.unwrap_or_else(default_transaction_date);

        match intent.kind {
            TransactionKind::Income => {
                let account_to = self
                    .account_for(user, intent.account_to.as_deref())
                    .await?;
                self.process_income(user, &intent, &currency, date, &account_to)
                    .await
            }
            TransactionKind::Expense => {
                let account_from = self
                    .account_for(user, intent.account_from.as_deref())
                    .await?;
                self.process_expense(user, &intent, &currency, date, &account_from)
                    .await
            }
            TransactionKind::Transfer => {
                let account_from = self
                    .account_for(user, intent.account_from.as_deref())
                    .await?;
                let account_to = self
                    .account_for(user, intent.account_to.as_deref())
                    .await?;
                self.process_transfer(
                    user,
                    &intent,
                    &currency,
                    currency_to.as_deref(),
                    date,
                    &account_from,
                    &account_to,
                )
                .await
            }
            TransactionKind::Conversion => {
                let account_from = self
                    .account_for(user, intent.account_from.as_deref())
                    .await?;
                let account_to = match intent.account_to.as_deref() {
                    Some(name) => self.account_for(user, Some(name)).await?,
                    // Same-account exchange when no destination is named.
                    None => account_from.clone(),
                };
                let currency_to = currency_to
                    .ok_or(DomainError::MissingConversionCurrency)?;
                self.process_conversion(
                    user,
                    &intent,
                    &currency,
                    &currency_to,
                    date,
                    &account_from,
                    &account_to,
                )
                .await
            }
        }
    }

    // =========================================================================
    // Per-kind processing
    // =========================================================================

    async fn process_income(
        &self,
        user: &User,
        intent: &TransactionIntent,
        currency: &str,
        date: DateTime<Utc>,
        account_to: &Account,
    ) -> AppResult<TransactionOutcome> {
        let leg = self.resolve_leg(account_to.id, currency, intent.amount).await?;

        let (leg_currency, converted) = match leg {
            LegResolution::Resolved { currency, amount } => (currency, amount),
            LegResolution::Unresolved { pair } => {
                let reason = unavailable_reason(&pair);
                let pending = self
                    .pending
                    .insert(NewPending {
                        user_id: user.id,
                        kind: TransactionKind::Income,
                        account_from_id: None,
                        account_to_id: Some(account_to.id),
                        currency: currency.to_string(),
                        amount: intent.amount,
                        currency_to: None,
                        amount_to: None,
                        exchange_rate: None,
                        description: intent.description.clone(),
                        date,
                        last_error: reason.clone(),
                    })
                    .await?;
                return Ok(queued(pending.id, reason));
            }
        };

        let mut db_tx = self.pool.begin().await?;
        if self.accounts.should_track_balance(user, account_to) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                account_to.id,
                &leg_currency,
                converted,
                user_enforces_floor(user),
            )
            .await?;
        }
        let record = TransactionStore::insert_in(
            &mut db_tx,
            NewTransaction {
                user_id: user.id,
                kind: TransactionKind::Income,
                account_from_id: None,
                account_to_id: Some(account_to.id),
                currency: currency.to_string(),
                amount: intent.amount,
                currency_to: None,
                amount_to: None,
                exchange_rate: None,
                description: intent.description.clone(),
                date,
            },
        )
        .await?;
        db_tx.commit().await?;

        Ok(TransactionOutcome::Completed(record))
    }

    async fn process_expense(
        &self,
        user: &User,
        intent: &TransactionIntent,
        currency: &str,
        date: DateTime<Utc>,
        account_from: &Account,
    ) -> AppResult<TransactionOutcome> {
        let leg = self
            .resolve_leg(account_from.id, currency, intent.amount)
            .await?;

        let (leg_currency, converted) = match leg {
            LegResolution::Resolved { currency, amount } => (currency, amount),
            LegResolution::Unresolved { pair } => {
                let reason = unavailable_reason(&pair);
                let pending = self
                    .pending
                    .insert(NewPending {
                        user_id: user.id,
                        kind: TransactionKind::Expense,
                        account_from_id: Some(account_from.id),
                        account_to_id: None,
                        currency: currency.to_string(),
                        amount: intent.amount,
                        currency_to: None,
                        amount_to: None,
                        exchange_rate: None,
                        description: intent.description.clone(),
                        date,
                        last_error: reason.clone(),
                    })
                    .await?;
                return Ok(queued(pending.id, reason));
            }
        };

        let mut db_tx = self.pool.begin().await?;
        if self.accounts.should_track_balance(user, account_from) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                account_from.id,
                &leg_currency,
                -converted,
                user_enforces_floor(user),
            )
            .await?;
        }
        let record = TransactionStore::insert_in(
            &mut db_tx,
            NewTransaction {
                user_id: user.id,
                kind: TransactionKind::Expense,
                account_from_id: Some(account_from.id),
                account_to_id: None,
                currency: currency.to_string(),
                amount: intent.amount,
                currency_to: None,
                amount_to: None,
                exchange_rate: None,
                description: intent.description.clone(),
                date,
            },
        )
        .await?;
        db_tx.commit().await?;

        Ok(TransactionOutcome::Completed(record))
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_transfer(
        &self,
        user: &User,
        intent: &TransactionIntent,
        currency: &str,
        currency_to: Option<&str>,
        date: DateTime<Utc>,
        account_from: &Account,
        account_to: &Account,
    ) -> AppResult<TransactionOutcome> {
        // Fee-bearing transfers state the destination side explicitly.
        let dest_currency = currency_to.unwrap_or(currency).to_string();
        let dest_amount = intent.amount_to.unwrap_or(intent.amount);

        let from_leg = self
            .resolve_leg(account_from.id, currency, intent.amount)
            .await?;
        let to_leg = self
            .resolve_leg(account_to.id, &dest_currency, dest_amount)
            .await?;

        let mut failed_pairs = Vec::new();
        if let LegResolution::Unresolved { pair } = &from_leg {
            failed_pairs.push(pair.clone());
        }
        if let LegResolution::Unresolved { pair } = &to_leg {
            failed_pairs.push(pair.clone());
        }

        if !failed_pairs.is_empty() {
            let reason = unavailable_reason(&failed_pairs.join(" and "));
            let pending = self
                .pending
                .insert(NewPending {
                    user_id: user.id,
                    kind: TransactionKind::Transfer,
                    account_from_id: Some(account_from.id),
                    account_to_id: Some(account_to.id),
                    currency: currency.to_string(),
                    amount: intent.amount,
                    currency_to: Some(dest_currency),
                    amount_to: Some(dest_amount),
                    exchange_rate: intent.exchange_rate,
                    description: intent.description.clone(),
                    date,
                    last_error: reason.clone(),
                })
                .await?;
            return Ok(queued(pending.id, reason));
        }

        let (from_currency, from_converted) = match from_leg {
            LegResolution::Resolved { currency, amount } => (currency, amount),
            LegResolution::Unresolved { .. } => unreachable!("checked above"),
        };
        let (to_currency, to_converted) = match to_leg {
            LegResolution::Resolved { currency, amount } => (currency, amount),
            LegResolution::Unresolved { .. } => unreachable!("checked above"),
        };

        // Both legs land in one transaction: the source debit, the
        // destination credit and the record commit or roll back together.
        let mut db_tx = self.pool.begin().await?;
        if self.accounts.should_track_balance(user, account_from) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                account_from.id,
                &from_currency,
                -from_converted,
                user_enforces_floor(user),
            )
            .await?;
        }
        if self.accounts.should_track_balance(user, account_to) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                account_to.id,
                &to_currency,
                to_converted,
                user_enforces_floor(user),
            )
            .await?;
        }
        let record = TransactionStore::insert_in(
            &mut db_tx,
            NewTransaction {
                user_id: user.id,
                kind: TransactionKind::Transfer,
                account_from_id: Some(account_from.id),
                account_to_id: Some(account_to.id),
                currency: currency.to_string(),
                amount: intent.amount,
                currency_to: (dest_currency != currency).then(|| dest_currency.clone()),
                amount_to: (dest_amount != intent.amount).then_some(dest_amount),
                exchange_rate: intent.exchange_rate,
                description: intent.description.clone(),
                date,
            },
        )
        .await?;
        db_tx.commit().await?;

        Ok(TransactionOutcome::Completed(record))
    }

    #[allow(clippy::too_many_arguments)]
    async fn process_conversion(
        &self,
        user: &User,
        intent: &TransactionIntent,
        currency: &str,
        currency_to: &str,
        date: DateTime<Utc>,
        account_from: &Account,
        account_to: &Account,
    ) -> AppResult<TransactionOutcome> {
        // The caller normally supplies amount_to. Only the auto-fetch path
        // can fail on a missing rate, and it fails hard: a conversion asks
        // for an exchange at a rate the user sees now, so deferring it to
        // an unknown future rate would be wrong.
        let (amount_to, exchange_rate) = match intent.amount_to {
            Some(amount_to) => (amount_to, intent.exchange_rate),
            None => {
                let rate = self.convert_rate(currency, currency_to).await.ok_or(
                    AppError::RateUnavailable {
                        pair: pair_key(currency, currency_to),
                    },
                )?;
                (quantize_storage(intent.amount * rate), Some(rate))
            }
        };

        let mut db_tx = self.pool.begin().await?;
        if self.accounts.should_track_balance(user, account_from) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                account_from.id,
                currency,
                -intent.amount,
                user_enforces_floor(user),
            )
            .await?;
        }
        if self.accounts.should_track_balance(user, account_to) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                account_to.id,
                currency_to,
                amount_to,
                user_enforces_floor(user),
            )
            .await?;
        }
        let record = TransactionStore::insert_in(
            &mut db_tx,
            NewTransaction {
                user_id: user.id,
                kind: TransactionKind::Conversion,
                account_from_id: Some(account_from.id),
                account_to_id: Some(account_to.id),
                currency: currency.to_string(),
                amount: intent.amount,
                currency_to: Some(currency_to.to_string()),
                amount_to: Some(amount_to),
                exchange_rate,
                description: intent.description.clone(),
                date,
            },
        )
        .await?;
        db_tx.commit().await?;

        Ok(TransactionOutcome::Completed(record))
    }

    // =========================================================================
    // Pending retry (shared with the sweeper)
    // =========================================================================

    /// Re-run a queued row with current rates. `Applied` means the same
    /// balance mutations and record the immediate path would have produced
    /// were committed and the pending row deleted, all in one transaction.
    pub async fn apply_pending(&self, row: &PendingTransaction) -> AppResult<PendingOutcome> {
        let user = self.users.get(row.user_id).await?;

        match row.kind {
            TransactionKind::Income | TransactionKind::Expense => {
                self.apply_pending_simple(&user, row).await
            }
            TransactionKind::Transfer => self.apply_pending_transfer(&user, row).await,
            TransactionKind::Conversion => self.apply_pending_conversion(&user, row).await,
        }
    }

    async fn apply_pending_simple(
        &self,
        user: &User,
        row: &PendingTransaction,
    ) -> AppResult<PendingOutcome> {
        let is_income = row.kind == TransactionKind::Income;
        let account_id = if is_income {
            row.account_to_id
        } else {
            row.account_from_id
        };
        let Some(account_id) = account_id else {
            return Err(AppError::Internal(format!(
                "pending {} row {} has no account",
                row.kind, row.id
            )));
        };
        let account = self.accounts.get_account(account_id).await?;

        let leg = self.resolve_leg(account_id, &row.currency, row.amount).await?;
        let (leg_currency, converted) = match leg {
            LegResolution::Resolved { currency, amount } => (currency, amount),
            LegResolution::Unresolved { pair } => {
                return Ok(PendingOutcome::StillUnavailable {
                    reason: unavailable_reason(&pair),
                });
            }
        };

        let delta = if is_income { converted } else { -converted };

        let mut db_tx = self.pool.begin().await?;
        if self.accounts.should_track_balance(user, &account) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                account_id,
                &leg_currency,
                delta,
                user_enforces_floor(user),
            )
            .await?;
        }
        let record = TransactionStore::insert_in(&mut db_tx, new_transaction_from_pending(row))
            .await?;
        PendingStore::delete_in(&mut db_tx, row.id).await?;
        db_tx.commit().await?;

        Ok(PendingOutcome::Applied(record))
    }

    async fn apply_pending_transfer(
        &self,
        user: &User,
        row: &PendingTransaction,
    ) -> AppResult<PendingOutcome> {
        let (Some(from_id), Some(to_id)) = (row.account_from_id, row.account_to_id) else {
            return Err(AppError::Internal(format!(
                "pending transfer row {} is missing an account",
                row.id
            )));
        };
        let account_from = self.accounts.get_account(from_id).await?;
        let account_to = self.accounts.get_account(to_id).await?;

        let dest_currency = row.currency_to.clone().unwrap_or_else(|| row.currency.clone());
        let dest_amount = row.amount_to.unwrap_or(row.amount);

        let from_leg = self.resolve_leg(from_id, &row.currency, row.amount).await?;
        let to_leg = self.resolve_leg(to_id, &dest_currency, dest_amount).await?;

        let mut failed_pairs = Vec::new();
        if let LegResolution::Unresolved { pair } = &from_leg {
            failed_pairs.push(pair.clone());
        }
        if let LegResolution::Unresolved { pair } = &to_leg {
            failed_pairs.push(pair.clone());
        }
        if !failed_pairs.is_empty() {
            return Ok(PendingOutcome::StillUnavailable {
                reason: unavailable_reason(&failed_pairs.join(" and ")),
            });
        }

        let (from_currency, from_converted) = match from_leg {
            LegResolution::Resolved { currency, amount } => (currency, amount),
            LegResolution::Unresolved { .. } => unreachable!("checked above"),
        };
        let (to_currency, to_converted) = match to_leg {
            LegResolution::Resolved { currency, amount } => (currency, amount),
            LegResolution::Unresolved { .. } => unreachable!("checked above"),
        };

        let mut db_tx = self.pool.begin().await?;
        if self.accounts.should_track_balance(user, &account_from) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                from_id,
                &from_currency,
                -from_converted,
                user_enforces_floor(user),
            )
            .await?;
        }
        if self.accounts.should_track_balance(user, &account_to) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                to_id,
                &to_currency,
                to_converted,
                user_enforces_floor(user),
            )
            .await?;
        }
        let record = TransactionStore::insert_in(&mut db_tx, new_transaction_from_pending(row))
            .await?;
        PendingStore::delete_in(&mut db_tx, row.id).await?;
        db_tx.commit().await?;

        Ok(PendingOutcome::Applied(record))
    }

    async fn apply_pending_conversion(
        &self,
        user: &User,
        row: &PendingTransaction,
    ) -> AppResult<PendingOutcome> {
        let (Some(from_id), Some(currency_to), Some(amount_to)) =
            (row.account_from_id, row.currency_to.as_deref(), row.amount_to)
        else {
            return Err(AppError::Internal(format!(
                "pending conversion row {} is missing required fields",
                row.id
            )));
        };
        let to_id = row.account_to_id.unwrap_or(from_id);
        let account_from = self.accounts.get_account(from_id).await?;
        let account_to = self.accounts.get_account(to_id).await?;

        let exchange_rate = match row.exchange_rate {
            Some(rate) => Some(rate),
            None => match self.convert_rate(&row.currency, currency_to).await {
                Some(rate) => Some(rate),
                None => {
                    return Ok(PendingOutcome::StillUnavailable {
                        reason: unavailable_reason(&pair_key(&row.currency, currency_to)),
                    });
                }
            },
        };

        let mut db_tx = self.pool.begin().await?;
        if self.accounts.should_track_balance(user, &account_from) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                from_id,
                &row.currency,
                -row.amount,
                user_enforces_floor(user),
            )
            .await?;
        }
        if self.accounts.should_track_balance(user, &account_to) {
            BalanceStore::apply_delta_in(
                &mut db_tx,
                to_id,
                currency_to,
                amount_to,
                user_enforces_floor(user),
            )
            .await?;
        }
        let mut new_tx = new_transaction_from_pending(row);
        new_tx.account_to_id = Some(to_id);
        new_tx.exchange_rate = exchange_rate;
        let record = TransactionStore::insert_in(&mut db_tx, new_tx).await?;
        PendingStore::delete_in(&mut db_tx, row.id).await?;
        db_tx.commit().await?;

        Ok(PendingOutcome::Applied(record))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn list_transactions(
        &self,
        user: &User,
        query: TransactionQuery,
    ) -> AppResult<Vec<TransactionRecord>> {
        validate_date_range(query.start, query.end)?;
        Ok(self.transactions.list_by_date_range(user.id, &query).await?)
    }

    pub async fn total_by_kind(
        &self,
        user: &User,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        kind: TransactionKind,
        currency: Option<&str>,
    ) -> AppResult<Decimal> {
        validate_date_range(start, end)?;
        Ok(self
            .transactions
            .total_by_kind(user.id, start, end, kind, currency)
            .await?)
    }

    pub async fn largest_in_period(
        &self,
        user: &User,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        kind: Option<TransactionKind>,
    ) -> AppResult<Option<TransactionRecord>> {
        validate_date_range(start, end)?;
        Ok(self
            .transactions
            .largest_in_period(user.id, start, end, kind)
            .await?)
    }

    // =========================================================================
    // Leg resolution
    // =========================================================================

    /// Resolve one leg against the account's currency position.
    async fn resolve_leg(
        &self,
        account_id: Uuid,
        currency: &str,
        amount: Decimal,
    ) -> AppResult<LegResolution> {
        let balances = self.accounts.list_balances(account_id).await?;

        let Some(primary) = primary_currency(&balances) else {
            // Fresh account: it operates in whatever currency arrives first.
            return Ok(LegResolution::Resolved {
                currency: currency.to_string(),
                amount,
            });
        };

        if primary == currency {
            return Ok(LegResolution::Resolved {
                currency: primary,
                amount,
            });
        }

        match self.convert_rate(currency, &primary).await {
            Some(rate) => Ok(LegResolution::Resolved {
                amount: quantize_storage(amount * rate),
                currency: primary,
            }),
            None => Ok(LegResolution::Unresolved {
                pair: pair_key(currency, &primary),
            }),
        }
    }

    /// Rate for `base -> quote`, falling back to the inverted reverse pair.
    async fn convert_rate(&self, base: &str, quote: &str) -> Option<Decimal> {
        if let Some(quote_rate) = self.fx.get_rate(base, quote).await {
            return Some(quote_rate.rate);
        }
        let inverse = self.fx.get_rate(quote, base).await?;
        if inverse.rate.is_zero() {
            None
        } else {
            Some(Decimal::ONE / inverse.rate)
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn account_for(&self, user: &User, name: Option<&str>) -> AppResult<Account> {
        let name = name.ok_or_else(|| {
            AppError::Internal("validated intent lost its account name".to_string())
        })?;
        self.accounts
            .get_or_create_account(user, name, AccountKind::Other)
            .await
    }

    /// Resolve a possibly-generic currency field against the governing
    /// account's holdings. A mismatch is a first-class rejection.
    async fn resolve_symbol_field(
        &self,
        user: &User,
        intent: &TransactionIntent,
        raw: &str,
    ) -> AppResult<String> {
        let balances = if is_generic_symbol(raw) {
            // Expenses and transfers are governed by the source account,
            // income by the destination. Read-only: no account is created
            // just to resolve a symbol.
            let governing = intent.account_from.as_deref().or(intent.account_to.as_deref());
            match governing {
                Some(name) => match self.accounts.get_account_by_name(user, name).await? {
                    Some(account) => self
                        .accounts
                        .list_balances(account.id)
                        .await?
                        .into_iter()
                        .map(|row| (row.currency, row.balance))
                        .collect(),
                    None => Vec::new(),
                },
                None => Vec::new(),
            }
        } else {
            Vec::new()
        };

        match resolve_currency_symbol(raw, &balances) {
            SymbolResolution::Resolved(code) => normalize_currency_code(&code)
                .ok_or_else(|| DomainError::InvalidCurrency(raw.to_string()).into()),
            SymbolResolution::Mismatch {
                symbol,
                account_currencies,
            } => Err(DomainError::symbol_mismatch(symbol, account_currencies).into()),
        }
    }
}

/// Currency of the largest-magnitude balance row, if any rows exist.
fn primary_currency(balances: &[AccountBalance]) -> Option<String> {
    balances
        .iter()
        .max_by(|a, b| a.balance.abs().cmp(&b.balance.abs()))
        .map(|row| row.currency.clone())
}

fn user_enforces_floor(user: &User) -> bool {
    user.tracking_mode == crate::domain::TrackingMode::Strict
}

fn unavailable_reason(pair: &str) -> String {
    format!("exchange rate unavailable for {}", pair)
}

fn queued(pending_id: Uuid, reason: String) -> TransactionOutcome {
    TransactionOutcome::Queued { pending_id, reason }
}

/// Noon UTC keeps "today" stable across user timezones.
fn default_transaction_date() -> DateTime<Utc> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
    Utc::now().date_naive().and_time(noon).and_utc()
}

fn validate_date_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), DomainError> {
    if start > end {
        return Err(DomainError::InvalidDateRange);
    }
    Ok(())
}

fn new_transaction_from_pending(row: &PendingTransaction) -> NewTransaction {
    NewTransaction {
        user_id: row.user_id,
        kind: row.kind,
        account_from_id: row.account_from_id,
        account_to_id: row.account_to_id,
        currency: row.currency.clone(),
        amount: row.amount,
        currency_to: row.currency_to.clone(),
        amount_to: row.amount_to,
        exchange_rate: row.exchange_rate,
        description: row.description.clone(),
        date: row.date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn balance(currency: &str, amount: Decimal) -> AccountBalance {
        AccountBalance {
            account_id: Uuid::new_v4(),
            currency: currency.to_string(),
            balance: amount,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_primary_currency_is_largest_magnitude() {
        let balances = vec![balance("USD", dec!(50)), balance("ARS", dec!(200000))];
        assert_eq!(primary_currency(&balances), Some("ARS".to_string()));
    }

    #[test]
    fn test_primary_currency_uses_magnitude_not_sign() {
        // A LOGGING-mode account deep in the red still operates in ARS.
        let balances = vec![balance("USD", dec!(50)), balance("ARS", dec!(-200000))];
        assert_eq!(primary_currency(&balances), Some("ARS".to_string()));
    }

    #[test]
    fn test_primary_currency_empty() {
        assert_eq!(primary_currency(&[]), None);
    }

    #[test]
    fn test_unavailable_reason_joins_pairs() {
        let pairs = ["USD/ARS".to_string(), "BTC/ARS".to_string()].join(" and ");
        assert_eq!(
            unavailable_reason(&pairs),
            "exchange rate unavailable for USD/ARS and BTC/ARS"
        );
    }

    #[test]
    fn test_default_transaction_date_is_noon_utc() {
        let date = default_transaction_date();
        assert_eq!(date.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn test_date_range_validation() {
        let now = Utc::now();
        assert!(validate_date_range(now - chrono::Duration::days(7), now).is_ok());
        assert_eq!(
            validate_date_range(now, now - chrono::Duration::days(1)),
            Err(DomainError::InvalidDateRange)
        );
    }
}
