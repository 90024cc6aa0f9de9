use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type WalletId = Uuid;

/// Balance is an integer amount of currency minor units (e.g. cents).
pub type Balance = i64;

/// Upper bound for a wallet balance at rest.
pub const MAX_BALANCE: Balance = 10_000_000;

/// Upper bound for the amount of a single deposit or withdrawal.
pub const MAX_SINGLE_OPERATION_AMOUNT: Balance = 1_000_000;

/// Returns true if `balance` respects the at-rest bounds `0..=MAX_BALANCE`.
pub fn is_valid_balance(balance: Balance) -> bool {
    (0..=MAX_BALANCE).contains(&balance)
}

/// Current-balance view of a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub balance: Balance,
}

impl Wallet {
    pub fn new(id: WalletId, balance: Balance) -> Self {
        Self { id, balance }
    }
}
