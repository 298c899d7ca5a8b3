//! Core ledger enums
//!
//! Mapped to the Postgres enum types declared in `migrations/001_init.sql`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four money movements the ledger understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
    Conversion,
}

impl TransactionKind {
    /// Parse a user-facing string ("income", "Expense", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            "transfer" => Some(Self::Transfer),
            "conversion" => Some(Self::Conversion),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
            Self::Conversion => "conversion",
        };
        write!(f, "{}", s)
    }
}

/// Informational account classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Bank,
    Wallet,
    Cash,
    Other,
}

impl Default for AccountKind {
    fn default() -> Self {
        Self::Other
    }
}

/// A user's default balance-tracking policy.
///
/// STRICT keeps balances and refuses to let them go negative; LOGGING
/// records transactions without balance constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tracking_mode", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TrackingMode {
    Strict,
    Logging,
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Logging => write!(f, "logging"),
        }
    }
}

/// Per-account tracking override. Stored as a nullable boolean but handled
/// as a tagged value so the inheritance rule is exhaustively matchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackBalance {
    Inherit,
    ForceOn,
    ForceOff,
}

impl TrackBalance {
    pub fn from_column(value: Option<bool>) -> Self {
        match value {
            None => Self::Inherit,
            Some(true) => Self::ForceOn,
            Some(false) => Self::ForceOff,
        }
    }

    pub fn to_column(self) -> Option<bool> {
        match self {
            Self::Inherit => None,
            Self::ForceOn => Some(true),
            Self::ForceOff => Some(false),
        }
    }

    /// Resolve the effective policy: the override wins, otherwise the
    /// user's mode decides.
    pub fn resolve(self, mode: TrackingMode) -> bool {
        match self {
            Self::ForceOn => true,
            Self::ForceOff => false,
            Self::Inherit => mode == TrackingMode::Strict,
        }
    }
}

/// Lifecycle of a queued transaction.
///
/// `Waiting` rows are eligible for the sweep; `Processing` rows are claimed
/// by a running sweep; `Exhausted` rows hit the retry budget and wait for
/// manual review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "pending_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    Waiting,
    Processing,
    Exhausted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_roundtrip() {
        for s in ["income", "expense", "transfer", "conversion"] {
            let kind = TransactionKind::parse(s).unwrap();
            assert_eq!(kind.to_string(), s);
        }
        assert_eq!(TransactionKind::parse("Expense"), Some(TransactionKind::Expense));
        assert_eq!(TransactionKind::parse("withdrawal"), None);
    }

    #[test]
    fn test_track_balance_resolution() {
        assert!(TrackBalance::ForceOn.resolve(TrackingMode::Logging));
        assert!(!TrackBalance::ForceOff.resolve(TrackingMode::Strict));
        assert!(TrackBalance::Inherit.resolve(TrackingMode::Strict));
        assert!(!TrackBalance::Inherit.resolve(TrackingMode::Logging));
    }

    #[test]
    fn test_track_balance_column_mapping() {
        assert_eq!(TrackBalance::from_column(None), TrackBalance::Inherit);
        assert_eq!(TrackBalance::from_column(Some(true)), TrackBalance::ForceOn);
        assert_eq!(TrackBalance::ForceOff.to_column(), Some(false));
        assert_eq!(TrackBalance::Inherit.to_column(), None);
    }
}
