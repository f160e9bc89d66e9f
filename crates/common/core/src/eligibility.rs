use sha2::{Digest, Sha256};

use crate::{
    constants::{
        NON_AGGREGATOR_COMMITTEE_LENGTH, SYNC_COMMITTEE_SIZE, SYNC_COMMITTEE_SUBNET_COUNT,
        TARGET_AGGREGATORS_PER_COMMITTEE, TARGET_AGGREGATORS_PER_SYNC_SUBCOMMITTEE,
    },
    containers::BLSSignature,
};

fn selected_by_proof(selection_proof: &BLSSignature, modulo: u64) -> bool {
    let hash = Sha256::digest(selection_proof.as_slice());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(prefix) % modulo == 0
}

/// Whether a validator with this selection proof aggregates for its committee.
pub fn is_attestation_aggregator(committee_length: u64, selection_proof: &BLSSignature) -> bool {
    if committee_length == NON_AGGREGATOR_COMMITTEE_LENGTH {
        return false;
    }
    let modulo = (committee_length / TARGET_AGGREGATORS_PER_COMMITTEE).max(1);
    selected_by_proof(selection_proof, modulo)
}

/// Whether a validator with this selection proof aggregates for its sync subcommittee.
pub fn is_sync_committee_aggregator(selection_proof: &BLSSignature) -> bool {
    let modulo = (SYNC_COMMITTEE_SIZE
        / SYNC_COMMITTEE_SUBNET_COUNT
        / TARGET_AGGREGATORS_PER_SYNC_SUBCOMMITTEE)
        .max(1);
    selected_by_proof(selection_proof, modulo)
}
