use thiserror::Error;

use crate::domain::{Balance, ValidationError, WalletId};
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    #[error("Insufficient funds in wallet {wallet_id}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        wallet_id: WalletId,
        balance: Balance,
        requested: Balance,
    },

    #[error(
        "Deposit of {amount} into wallet {wallet_id} would exceed the maximum balance of {limit} (balance {balance})"
    )]
    ExceedsMaxBalance {
        wallet_id: WalletId,
        balance: Balance,
        amount: Balance,
        limit: Balance,
    },

    #[error("Invalid operation type: {0:?}")]
    InvalidOperationType(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(ValidationError),

    #[error(transparent)]
    Store(StoreError),
}

/// Coarse classification of a [`WalletError`], for callers that map errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InsufficientFunds,
    ExceedsMaxBalance,
    InvalidOperationType,
    InvalidRequest,
    /// Infrastructure failure: connection, transaction or query fault.
    Internal,
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::WalletNotFound(_) => ErrorKind::NotFound,
            WalletError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            WalletError::ExceedsMaxBalance { .. } => ErrorKind::ExceedsMaxBalance,
            WalletError::InvalidOperationType(_) => ErrorKind::InvalidOperationType,
            WalletError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            WalletError::Store(_) => ErrorKind::Internal,
        }
    }

    /// True for terminal business outcomes; false for infrastructure failures.
    pub fn is_business_rejection(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }
}

impl From<StoreError> for WalletError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(wallet_id) => WalletError::WalletNotFound(wallet_id),
            other => WalletError::Store(other),
        }
    }
}

impl From<ValidationError> for WalletError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::InvalidOperationType(op) => WalletError::InvalidOperationType(op),
            other => WalletError::InvalidRequest(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_store_not_found_maps_to_wallet_not_found() {
        let id = Uuid::new_v4();
        let err = WalletError::from(StoreError::NotFound(id));
        assert!(matches!(err, WalletError::WalletNotFound(missing) if missing == id));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_other_store_errors_pass_through() {
        let err = WalletError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        assert!(matches!(
            err,
            WalletError::Store(StoreError::Database(sqlx::Error::PoolTimedOut))
        ));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_business_rejection());
    }

    #[test]
    fn test_validation_errors() {
        let err = WalletError::from(ValidationError::InvalidOperationType("TRANSFER".into()));
        assert_eq!(err.kind(), ErrorKind::InvalidOperationType);

        let err = WalletError::from(ValidationError::NonPositiveAmount(0));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
        assert!(err.is_business_rejection());
    }
}
