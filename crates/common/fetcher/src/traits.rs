use std::sync::Arc;

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use tessera_core::{
    Duty, PubKey, SignedData,
    containers::{
        Attestation, AttestationData, BLSSignature, BeaconBlock, BlindedBeaconBlock,
        SyncCommitteeContribution,
    },
};
use tokio_util::sync::CancellationToken;

use crate::errors::AwaitError;

/// The consensus-layer data source duties are fetched from.
#[async_trait]
pub trait ConsensusProvider: Send + Sync {
    async fn attestation_data(
        &self,
        slot: u64,
        committee_index: u64,
    ) -> anyhow::Result<AttestationData>;

    /// Returns `None` when the provider has no aggregate for the attestation data root yet.
    async fn aggregate_attestation(
        &self,
        slot: u64,
        attestation_data_root: B256,
    ) -> anyhow::Result<Option<Attestation>>;

    async fn beacon_block_proposal(
        &self,
        slot: u64,
        randao_reveal: BLSSignature,
        graffiti: B256,
        fee_recipient: Address,
    ) -> anyhow::Result<BeaconBlock>;

    async fn blinded_beacon_block_proposal(
        &self,
        slot: u64,
        randao_reveal: BLSSignature,
        graffiti: B256,
        fee_recipient: Address,
    ) -> anyhow::Result<BlindedBeaconBlock>;

    async fn sync_committee_contribution(
        &self,
        slot: u64,
        subcommittee_index: u64,
        beacon_block_root: B256,
    ) -> anyhow::Result<SyncCommitteeContribution>;
}

/// Blocks until the signed artifact of `duty` for `pubkey` has been aggregated.
#[async_trait]
pub trait AggSigDb: Send + Sync {
    async fn await_signed(
        &self,
        cancel: &CancellationToken,
        duty: Duty,
        pubkey: PubKey,
    ) -> Result<SignedData, AwaitError>;
}

/// Blocks until the attestation data of a committee is known.
#[async_trait]
pub trait AwaitAttData: Send + Sync {
    async fn await_attestation_data(
        &self,
        cancel: &CancellationToken,
        slot: u64,
        committee_index: u64,
    ) -> Result<AttestationData, AwaitError>;
}

/// Resolves the fee recipient configured for a validator.
pub type FeeRecipientFn = Arc<dyn Fn(&PubKey) -> Address + Send + Sync>;
