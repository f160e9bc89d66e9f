use async_trait::async_trait;
use tessera_core::{Duty, PubKey, SignedData};
use tessera_fetcher::{AggSigDb, AwaitError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::promise::AwaitMap;

/// In-memory store of aggregated signed data, keyed by duty and validator.
#[derive(Default)]
pub struct MemAggSigDb {
    entries: AwaitMap<(Duty, PubKey), SignedData>,
}

impl MemAggSigDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, duty: Duty, pubkey: PubKey, data: SignedData) -> Result<(), AwaitError> {
        debug!(
            slot = duty.slot,
            duty = %duty.duty_type,
            pubkey = %pubkey,
            kind = data.kind(),
            "Storing aggregated signed data"
        );
        self.entries.store((duty, pubkey), data)
    }

    pub fn store_set(
        &self,
        duty: Duty,
        set: impl IntoIterator<Item = (PubKey, SignedData)>,
    ) -> Result<(), AwaitError> {
        for (pubkey, data) in set {
            self.store(duty, pubkey, data)?;
        }
        Ok(())
    }

    /// Drops every entry of a slot before `slot`.
    pub fn trim_before(&self, slot: u64) {
        self.entries.trim(|(duty, _)| duty.slot < slot);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl AggSigDb for MemAggSigDb {
    async fn await_signed(
        &self,
        cancel: &CancellationToken,
        duty: Duty,
        pubkey: PubKey,
    ) -> Result<SignedData, AwaitError> {
        self.entries.await_value(cancel, (duty, pubkey)).await
    }
}
