use async_trait::async_trait;
use tessera_core::containers::AttestationData;
use tessera_fetcher::{AwaitAttData, AwaitError};
use tokio_util::sync::CancellationToken;

use crate::promise::AwaitMap;

/// Attestation data agreed for each (slot, committee index).
#[derive(Default)]
pub struct AttestationDataStore {
    entries: AwaitMap<(u64, u64), AttestationData>,
}

impl AttestationDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, data: AttestationData) -> Result<(), AwaitError> {
        self.entries.store((data.slot, data.index), data)
    }

    pub fn trim_before(&self, slot: u64) {
        self.entries.trim(|(data_slot, _)| *data_slot < slot);
    }
}

#[async_trait]
impl AwaitAttData for AttestationDataStore {
    async fn await_attestation_data(
        &self,
        cancel: &CancellationToken,
        slot: u64,
        committee_index: u64,
    ) -> Result<AttestationData, AwaitError> {
        self.entries
            .await_value(cancel, (slot, committee_index))
            .await
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;

    use super::*;

    #[tokio::test]
    async fn test_keyed_by_slot_and_committee() -> anyhow::Result<()> {
        let store = AttestationDataStore::new();
        let data = AttestationData {
            slot: 10,
            index: 2,
            beacon_block_root: B256::repeat_byte(1),
            ..Default::default()
        };
        store.store(data)?;

        let cancel = CancellationToken::new();
        assert_eq!(store.await_attestation_data(&cancel, 10, 2).await?, data);

        let pending = CancellationToken::new();
        pending.cancel();
        assert!(matches!(
            store.await_attestation_data(&pending, 10, 3).await,
            Err(AwaitError::Cancelled)
        ));
        assert_eq!(store.entries.len(), 1);

        store.trim_before(11);
        assert!(store.entries.is_empty());
        Ok(())
    }
}
