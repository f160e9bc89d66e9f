pub mod attestation;
pub mod block;
pub mod duties;
pub mod selection;
pub mod sync_committee;

use alloy_primitives::FixedBytes;

pub type BLSSignature = FixedBytes<96>;

pub use attestation::{Attestation, AttestationData, Checkpoint};
pub use block::{
    BeaconBlock, BeaconBlockBody, BlindedBeaconBlock, BlindedBeaconBlockBody, ExecutionPayload,
    ExecutionPayloadHeader,
};
pub use duties::{AttesterDuty, ProposerDuty, SyncCommitteeDuty};
pub use selection::{BeaconCommitteeSelection, SignedRandao, SyncCommitteeSelection};
pub use sync_committee::{SyncCommitteeContribution, SyncCommitteeMessage};
