use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::{Balance, MAX_SINGLE_OPERATION_AMOUNT, WalletId};

/// Kind of balance change requested for a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationType {
    Deposit,
    Withdraw,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "DEPOSIT",
            OperationType::Withdraw => "WITHDRAW",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = ValidationError;

    // Matches the wire format exactly; "deposit" is not a valid operation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(OperationType::Deposit),
            "WITHDRAW" => Ok(OperationType::Withdraw),
            other => Err(ValidationError::InvalidOperationType(other.to_string())),
        }
    }
}

/// Structural problems with an update request, detected before any store access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid wallet ID: nil UUID")]
    NilWalletId,

    #[error("amount must be greater than 0, got {0}")]
    NonPositiveAmount(Balance),

    #[error("amount {amount} exceeds the maximum of {limit} per operation")]
    AmountTooLarge { amount: Balance, limit: Balance },

    #[error("invalid operation type: {0:?}")]
    InvalidOperationType(String),
}

/// Undecoded update request as it arrives on the wire.
///
/// The operation type is still a free-form string here; converting into a
/// [`WalletUpdateRequest`] parses and validates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletUpdatePayload {
    pub wallet_id: Uuid,
    pub operation_type: String,
    pub amount: Balance,
}

/// A validated request to deposit into or withdraw from a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletUpdateRequest {
    pub wallet_id: WalletId,
    pub operation: OperationType,
    pub amount: Balance,
}

impl WalletUpdateRequest {
    /// Build and validate a request.
    pub fn new(
        wallet_id: WalletId,
        operation: OperationType,
        amount: Balance,
    ) -> Result<Self, ValidationError> {
        let request = Self {
            wallet_id,
            operation,
            amount,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn deposit(wallet_id: WalletId, amount: Balance) -> Result<Self, ValidationError> {
        Self::new(wallet_id, OperationType::Deposit, amount)
    }

    pub fn withdraw(wallet_id: WalletId, amount: Balance) -> Result<Self, ValidationError> {
        Self::new(wallet_id, OperationType::Withdraw, amount)
    }

    /// Check the request invariants: non-nil wallet, amount in `1..=MAX_SINGLE_OPERATION_AMOUNT`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_fields(self.wallet_id, self.amount)
    }
}

fn check_fields(wallet_id: WalletId, amount: Balance) -> Result<(), ValidationError> {
    if wallet_id.is_nil() {
        return Err(ValidationError::NilWalletId);
    }
    if amount <= 0 {
        return Err(ValidationError::NonPositiveAmount(amount));
    }
    if amount > MAX_SINGLE_OPERATION_AMOUNT {
        return Err(ValidationError::AmountTooLarge {
            amount,
            limit: MAX_SINGLE_OPERATION_AMOUNT,
        });
    }
    Ok(())
}

impl TryFrom<WalletUpdatePayload> for WalletUpdateRequest {
    type Error = ValidationError;

    // Wallet id and amount are checked before the operation type is parsed.
    fn try_from(payload: WalletUpdatePayload) -> Result<Self, Self::Error> {
        check_fields(payload.wallet_id, payload.amount)?;
        Ok(Self {
            wallet_id: payload.wallet_id,
            operation: payload.operation_type.parse()?,
            amount: payload.amount,
        })
    }
}
