use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use alloy_primitives::{Address, B256, FixedBytes};
use anyhow::anyhow;
use async_trait::async_trait;
use ssz_types::{BitList, BitVector, typenum::U2048};
use tessera_core::{
    constants::SLOTS_PER_EPOCH,
    containers::{
        Attestation, AttestationData, BLSSignature, BeaconBlock, BeaconBlockBody,
        BlindedBeaconBlock, BlindedBeaconBlockBody, Checkpoint, ExecutionPayload,
        ExecutionPayloadHeader, SyncCommitteeContribution,
    },
};
use tessera_fetcher::ConsensusProvider;

type AttestationDataHook = Arc<dyn Fn(u64, u64) -> anyhow::Result<AttestationData> + Send + Sync>;
type AggregateHook = Arc<dyn Fn(u64, B256) -> anyhow::Result<Option<Attestation>> + Send + Sync>;
type ContributionHook =
    Arc<dyn Fn(u64, u64, B256) -> anyhow::Result<SyncCommitteeContribution> + Send + Sync>;

/// Number of calls the mock served, per endpoint.
#[derive(Debug, Default)]
pub struct CallCounters {
    pub attestation_data: AtomicUsize,
    pub aggregate_attestation: AtomicUsize,
    pub beacon_block_proposal: AtomicUsize,
    pub blinded_beacon_block_proposal: AtomicUsize,
    pub sync_committee_contribution: AtomicUsize,
}

/// A deterministic [`ConsensusProvider`] for tests.
///
/// Every endpoint answers with data derived from its arguments. Individual endpoints can be
/// replaced with hooks to inject failures or custom payloads.
#[derive(Default)]
pub struct BeaconMock {
    attestation_data_hook: Option<AttestationDataHook>,
    aggregate_hook: Option<AggregateHook>,
    contribution_hook: Option<ContributionHook>,
    pub calls: CallCounters,
}

impl BeaconMock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attestation_data(
        mut self,
        hook: impl Fn(u64, u64) -> anyhow::Result<AttestationData> + Send + Sync + 'static,
    ) -> Self {
        self.attestation_data_hook = Some(Arc::new(hook));
        self
    }

    pub fn with_aggregate_attestation(
        mut self,
        hook: impl Fn(u64, B256) -> anyhow::Result<Option<Attestation>> + Send + Sync + 'static,
    ) -> Self {
        self.aggregate_hook = Some(Arc::new(hook));
        self
    }

    pub fn with_sync_committee_contribution(
        mut self,
        hook: impl Fn(u64, u64, B256) -> anyhow::Result<SyncCommitteeContribution>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.contribution_hook = Some(Arc::new(hook));
        self
    }

    pub fn attestation_data_calls(&self) -> usize {
        self.calls.attestation_data.load(Ordering::SeqCst)
    }

    pub fn aggregate_attestation_calls(&self) -> usize {
        self.calls.aggregate_attestation.load(Ordering::SeqCst)
    }

    pub fn sync_committee_contribution_calls(&self) -> usize {
        self.calls.sync_committee_contribution.load(Ordering::SeqCst)
    }
}

/// Attestation data the mock serves by default for `(slot, committee_index)`.
pub fn mock_attestation_data(slot: u64, committee_index: u64) -> AttestationData {
    let epoch = slot / SLOTS_PER_EPOCH;
    AttestationData {
        slot,
        index: committee_index,
        beacon_block_root: root_from(slot),
        source: Checkpoint {
            epoch: epoch.saturating_sub(1),
            root: root_from(epoch.saturating_sub(1) * SLOTS_PER_EPOCH),
        },
        target: Checkpoint {
            epoch,
            root: root_from(epoch * SLOTS_PER_EPOCH),
        },
    }
}

/// Aggregate the mock serves by default for an attestation data root.
pub fn mock_aggregate(slot: u64, attestation_data_root: B256) -> anyhow::Result<Attestation> {
    let mut aggregation_bits: BitList<U2048> =
        BitList::with_capacity(8).map_err(|err| anyhow!("aggregation bits: {err:?}"))?;
    aggregation_bits
        .set(0, true)
        .map_err(|err| anyhow!("aggregation bits: {err:?}"))?;

    Ok(Attestation {
        aggregation_bits,
        data: AttestationData {
            slot,
            beacon_block_root: attestation_data_root,
            ..Default::default()
        },
        signature: signature_from(attestation_data_root),
    })
}

/// Contribution the mock serves by default for `(slot, subcommittee_index, root)`.
pub fn mock_contribution(
    slot: u64,
    subcommittee_index: u64,
    beacon_block_root: B256,
) -> SyncCommitteeContribution {
    SyncCommitteeContribution {
        slot,
        beacon_block_root,
        subcommittee_index,
        aggregation_bits: BitVector::new(),
        signature: signature_from(beacon_block_root),
    }
}

fn root_from(value: u64) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&value.to_le_bytes());
    B256::from(bytes)
}

fn signature_from(root: B256) -> BLSSignature {
    let mut bytes = [0u8; 96];
    bytes[..32].copy_from_slice(root.as_slice());
    FixedBytes::from(bytes)
}

fn execution_payload(slot: u64, fee_recipient: Address) -> ExecutionPayload {
    ExecutionPayload {
        parent_hash: root_from(slot.saturating_sub(1)),
        fee_recipient,
        block_number: slot,
        gas_limit: 30_000_000,
        timestamp: slot * 12,
        block_hash: root_from(slot),
        ..Default::default()
    }
}

#[async_trait]
impl ConsensusProvider for BeaconMock {
    async fn attestation_data(
        &self,
        slot: u64,
        committee_index: u64,
    ) -> anyhow::Result<AttestationData> {
        self.calls.attestation_data.fetch_add(1, Ordering::SeqCst);
        match &self.attestation_data_hook {
            Some(hook) => hook(slot, committee_index),
            None => Ok(mock_attestation_data(slot, committee_index)),
        }
    }

    async fn aggregate_attestation(
        &self,
        slot: u64,
        attestation_data_root: B256,
    ) -> anyhow::Result<Option<Attestation>> {
        self.calls.aggregate_attestation.fetch_add(1, Ordering::SeqCst);
        match &self.aggregate_hook {
            Some(hook) => hook(slot, attestation_data_root),
            None => mock_aggregate(slot, attestation_data_root).map(Some),
        }
    }

    async fn beacon_block_proposal(
        &self,
        slot: u64,
        randao_reveal: BLSSignature,
        graffiti: B256,
        fee_recipient: Address,
    ) -> anyhow::Result<BeaconBlock> {
        self.calls.beacon_block_proposal.fetch_add(1, Ordering::SeqCst);
        Ok(BeaconBlock {
            slot,
            proposer_index: slot % 64,
            parent_root: root_from(slot.saturating_sub(1)),
            state_root: root_from(slot),
            body: BeaconBlockBody {
                randao_reveal,
                graffiti,
                execution_payload: execution_payload(slot, fee_recipient),
            },
        })
    }

    async fn blinded_beacon_block_proposal(
        &self,
        slot: u64,
        randao_reveal: BLSSignature,
        graffiti: B256,
        fee_recipient: Address,
    ) -> anyhow::Result<BlindedBeaconBlock> {
        self.calls
            .blinded_beacon_block_proposal
            .fetch_add(1, Ordering::SeqCst);
        let payload = execution_payload(slot, fee_recipient);
        Ok(BlindedBeaconBlock {
            slot,
            proposer_index: slot % 64,
            parent_root: root_from(slot.saturating_sub(1)),
            state_root: root_from(slot),
            body: BlindedBeaconBlockBody {
                randao_reveal,
                graffiti,
                execution_payload_header: ExecutionPayloadHeader {
                    parent_hash: payload.parent_hash,
                    fee_recipient: payload.fee_recipient,
                    state_root: payload.state_root,
                    block_number: payload.block_number,
                    gas_limit: payload.gas_limit,
                    timestamp: payload.timestamp,
                    block_hash: payload.block_hash,
                    transactions_root: B256::ZERO,
                },
            },
        })
    }

    async fn sync_committee_contribution(
        &self,
        slot: u64,
        subcommittee_index: u64,
        beacon_block_root: B256,
    ) -> anyhow::Result<SyncCommitteeContribution> {
        self.calls
            .sync_committee_contribution
            .fetch_add(1, Ordering::SeqCst);
        match &self.contribution_hook {
            Some(hook) => hook(slot, subcommittee_index, beacon_block_root),
            None => Ok(mock_contribution(slot, subcommittee_index, beacon_block_root)),
        }
    }
}
