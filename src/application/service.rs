use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::cache::{BalanceCache, CACHE_TTL, CacheError};
use crate::domain::{
    Balance, MAX_BALANCE, OperationType, ValidationError, Wallet, WalletId, WalletUpdateRequest,
};
use crate::storage::BalanceStore;

use super::WalletError;

/// Wallet service: the only component that knows the business rules.
///
/// Reads go through the cache and fall back to the store. Mutations always
/// decide on the balance read from the store under the wallet's row lock, then
/// refresh the cache with the committed value. Cache failures never fail an
/// operation.
pub struct WalletService<S, C> {
    store: S,
    cache: C,
    cache_ttl: Duration,
}

impl<S, C> WalletService<S, C>
where
    S: BalanceStore,
    C: BalanceCache,
{
    /// Create a new wallet service over the given store and cache.
    pub fn new(store: S, cache: C) -> Self {
        Self {
            store,
            cache,
            cache_ttl: CACHE_TTL,
        }
    }

    /// Override the TTL used for cache refreshes.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Get the balance of a wallet.
    ///
    /// A cached value is returned as is and may be up to one TTL stale.
    pub async fn get_balance(&self, wallet_id: WalletId) -> Result<Balance, WalletError> {
        debug!(%wallet_id, "getting balance");

        match self.cache.get(wallet_id).await {
            Ok(balance) => {
                debug!(%wallet_id, balance, "cache hit");
                return Ok(balance);
            }
            Err(CacheError::Miss(_)) => debug!(%wallet_id, "cache miss"),
            Err(e) => warn!(%wallet_id, "cache read failed: {}", e),
        }

        let balance = self.store.get_balance(wallet_id).await.map_err(|e| {
            let err = WalletError::from(e);
            if err.is_business_rejection() {
                debug!(%wallet_id, "{}", err);
            } else {
                error!(%wallet_id, "failed to read balance: {}", err);
            }
            err
        })?;

        self.refresh_cache(wallet_id, balance).await;
        Ok(balance)
    }

    /// Get the current-balance view of a wallet.
    pub async fn get_wallet(&self, wallet_id: WalletId) -> Result<Wallet, WalletError> {
        let balance = self.get_balance(wallet_id).await?;
        Ok(Wallet::new(wallet_id, balance))
    }

    /// Apply a deposit or withdrawal and return the committed balance.
    ///
    /// The wallet id and the sign of the amount are checked again before the
    /// store is touched; the per-operation cap is left to request construction.
    /// A rejected operation leaves both the store and the cache untouched.
    pub async fn apply_operation(
        &self,
        request: &WalletUpdateRequest,
    ) -> Result<Balance, WalletError> {
        let wallet_id = request.wallet_id;
        debug!(
            %wallet_id,
            operation = %request.operation,
            amount = request.amount,
            "applying operation"
        );

        ensure_well_formed(request)?;

        let request = *request;
        let new_balance = self
            .store
            .update_balance(wallet_id, move |current| next_balance(&request, current))
            .await
            .inspect_err(|err| {
                if err.is_business_rejection() {
                    warn!(%wallet_id, "operation rejected: {}", err);
                } else {
                    error!(%wallet_id, "operation failed: {}", err);
                }
            })?;

        info!(
            %wallet_id,
            operation = %request.operation,
            amount = request.amount,
            new_balance,
            "wallet updated"
        );

        self.refresh_cache(wallet_id, new_balance).await;
        Ok(new_balance)
    }

    async fn refresh_cache(&self, wallet_id: WalletId, balance: Balance) {
        if let Err(e) = self.cache.set(wallet_id, balance, self.cache_ttl).await {
            warn!(%wallet_id, "failed to refresh cached balance: {}", e);
        }
    }
}

fn ensure_well_formed(request: &WalletUpdateRequest) -> Result<(), ValidationError> {
    if request.wallet_id.is_nil() {
        return Err(ValidationError::NilWalletId);
    }
    // A negative deposit would be an unchecked withdrawal
    if request.amount <= 0 {
        return Err(ValidationError::NonPositiveAmount(request.amount));
    }
    Ok(())
}

/// Compute the balance that results from applying `request` to `current`.
///
/// Enforces `0 <= balance <= MAX_BALANCE` on the result.
pub fn next_balance(request: &WalletUpdateRequest, current: Balance) -> Result<Balance, WalletError> {
    match request.operation {
        OperationType::Deposit => current
            .checked_add(request.amount)
            .filter(|updated| *updated <= MAX_BALANCE)
            .ok_or(WalletError::ExceedsMaxBalance {
                wallet_id: request.wallet_id,
                balance: current,
                amount: request.amount,
                limit: MAX_BALANCE,
            }),
        OperationType::Withdraw => {
            if request.amount > current {
                return Err(WalletError::InsufficientFunds {
                    wallet_id: request.wallet_id,
                    balance: current,
                    requested: request.amount,
                });
            }
            Ok(current - request.amount)
        }
    }
}
