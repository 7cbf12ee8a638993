use crate::{
    error::{
        Error,
        Result,
    },
    waves::RawWave,
};
use futures::{
    future::BoxFuture,
    stream::BoxStream,
};
use std::{
    fmt,
    future::Future,
    sync::Arc,
};
use tracing::info;

/// Upper bound on gas accepted for a single `wave` transaction.
pub const WAVE_GAS_LIMIT: u64 = 300_000;

/// Sent instead of an empty message.
pub const DEFAULT_WAVE_MESSAGE: &str = "User waved";

pub type WaveStream = BoxStream<'static, Result<RawWave>>;

/// A submitted `wave` transaction that has not been confirmed yet.
pub struct PendingWave {
    hash: String,
    confirmation: BoxFuture<'static, Result<()>>,
}

impl PendingWave {
    pub fn new(hash: impl Into<String>, confirmation: BoxFuture<'static, Result<()>>) -> Self {
        Self {
            hash: hash.into(),
            confirmation,
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Resolves once the network mined the transaction successfully.
    pub async fn confirmed(self) -> Result<String> {
        self.confirmation.await?;
        Ok(self.hash)
    }
}

impl fmt::Debug for PendingWave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingWave")
            .field("hash", &self.hash)
            .finish_non_exhaustive()
    }
}

/// Remote half of the wave portal contract.
pub trait WaveContract: Send + Sync + 'static {
    fn wave(
        &self,
        message: String,
        gas_limit: u64,
    ) -> impl Future<Output = Result<PendingWave>> + Send;

    fn total_waves(&self) -> impl Future<Output = Result<u64>> + Send;

    /// All recorded waves, oldest first.
    fn all_waves(&self) -> impl Future<Output = Result<Vec<RawWave>>> + Send;

    /// `NewWave` events emitted from now on.
    fn new_waves(&self) -> impl Future<Output = Result<WaveStream>> + Send;
}

/// Handle to the contract, present only when a wallet provider is.
pub struct ContractClient<C> {
    contract: Option<Arc<C>>,
}

impl<C> Clone for ContractClient<C> {
    fn clone(&self) -> Self {
        Self {
            contract: self.contract.clone(),
        }
    }
}

impl<C> ContractClient<C> {
    pub fn new(contract: Option<C>) -> Self {
        Self {
            contract: contract.map(Arc::new),
        }
    }

    pub fn is_available(&self) -> bool {
        self.contract.is_some()
    }

    fn contract(&self) -> Result<&C> {
        self.contract
            .as_deref()
            .ok_or_else(|| Error::contract_call("no wallet provider"))
    }
}

impl<C: WaveContract> ContractClient<C> {
    pub async fn submit_wave(&self, message: &str) -> Result<PendingWave> {
        let contract = self.contract()?;
        let message = if message.is_empty() {
            DEFAULT_WAVE_MESSAGE.to_owned()
        } else {
            message.to_owned()
        };
        let pending = contract.wave(message, WAVE_GAS_LIMIT).await?;
        info!(hash = pending.hash(), "mining");
        Ok(pending)
    }

    pub async fn total_wave_count(&self) -> Result<u64> {
        let count = self.contract()?.total_waves().await?;
        info!(count, "retrieved total wave count");
        Ok(count)
    }

    pub async fn all_waves(&self) -> Result<Vec<RawWave>> {
        self.contract()?.all_waves().await
    }

    pub async fn new_waves(&self) -> Result<WaveStream> {
        self.contract()?.new_waves().await
    }
}
