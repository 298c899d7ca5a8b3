//! Account service
//!
//! Account lifecycle, the balance-tracking policy, and balance reads and
//! mutations. Balance mutation delegates to the store's guarded atomic
//! delta; this layer decides whether the non-negativity floor applies.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::{AccountKind, TrackBalance, TrackingMode};
use crate::error::AppResult;
use crate::store::{Account, AccountBalance, AccountStore, BalanceStore, User};

/// One account's balance view: real rows when the account is tracked, an
/// explicit marker when it is not. The two cases are never merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceView {
    Tracked(Vec<BalanceEntry>),
    NotTracked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceEntry {
    pub currency: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone)]
pub struct AccountBalances {
    pub account: Account,
    pub view: BalanceView,
}

#[derive(Debug, Clone)]
pub struct AccountService {
    accounts: AccountStore,
    balances: BalanceStore,
}

impl AccountService {
    pub fn new(accounts: AccountStore, balances: BalanceStore) -> Self {
        Self { accounts, balances }
    }

    pub async fn get_or_create_account(
        &self,
        user: &User,
        name: &str,
        kind: AccountKind,
    ) -> AppResult<Account> {
        Ok(self.accounts.get_or_create(user.id, name, kind).await?)
    }

    pub async fn get_account_by_name(
        &self,
        user: &User,
        name: &str,
    ) -> AppResult<Option<Account>> {
        Ok(self.accounts.get_by_name(user.id, name).await?)
    }

    pub async fn get_account(&self, id: Uuid) -> AppResult<Account> {
        Ok(self.accounts.get(id).await?)
    }

    pub async fn set_track_balance(&self, id: Uuid, track: TrackBalance) -> AppResult<()> {
        Ok(self.accounts.set_track_balance(id, track).await?)
    }

    /// Effective tracking policy: the account override wins, otherwise the
    /// user's mode decides.
    pub fn should_track_balance(&self, user: &User, account: &Account) -> bool {
        account.track_balance.resolve(user.tracking_mode)
    }

    /// Add `delta` (negative to subtract) to the account's balance in
    /// `currency`. The non-negativity floor applies only in STRICT mode.
    pub async fn add_to_balance(
        &self,
        user: &User,
        account_id: Uuid,
        currency: &str,
        delta: Decimal,
    ) -> AppResult<Decimal> {
        let enforce_floor = user.tracking_mode == TrackingMode::Strict;
        Ok(self
            .balances
            .apply_delta(account_id, currency, delta, enforce_floor)
            .await?)
    }

    pub async fn list_balances(&self, account_id: Uuid) -> AppResult<Vec<AccountBalance>> {
        Ok(self.balances.list_for_account(account_id).await?)
    }

    /// Balances across the user's accounts (or one named account).
    /// Untracked accounts come back with the explicit `NotTracked` marker.
    pub async fn get_all_balances(
        &self,
        user: &User,
        account_name: Option<&str>,
    ) -> AppResult<Vec<AccountBalances>> {
        let accounts = match account_name {
            Some(name) => match self.accounts.get_by_name(user.id, name).await? {
                Some(account) => vec![account],
                None => return Ok(Vec::new()),
            },
            None => self.accounts.list_for_user(user.id).await?,
        };

        let mut out = Vec::with_capacity(accounts.len());
        for account in accounts {
            let view = if self.should_track_balance(user, &account) {
                let entries = self
                    .balances
                    .list_for_account(account.id)
                    .await?
                    .into_iter()
                    .filter(|row| !row.balance.is_zero())
                    .map(|row| BalanceEntry {
                        currency: row.currency,
                        amount: row.balance,
                    })
                    .collect();
                BalanceView::Tracked(entries)
            } else {
                BalanceView::NotTracked
            };
            out.push(AccountBalances { account, view });
        }

        Ok(out)
    }
}
