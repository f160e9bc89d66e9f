pub const SLOTS_PER_EPOCH: u64 = 32;

pub const TARGET_AGGREGATORS_PER_COMMITTEE: u64 = 16;

pub const SYNC_COMMITTEE_SIZE: u64 = 512;
pub const SYNC_COMMITTEE_SUBNET_COUNT: u64 = 4;
pub const TARGET_AGGREGATORS_PER_SYNC_SUBCOMMITTEE: u64 = 16;

/// Committee length that always selects the validator as an aggregator, whatever its proof.
pub const AGGREGATOR_COMMITTEE_LENGTH: u64 = 0;

/// Reserved committee length marking a validator that never aggregates.
pub const NON_AGGREGATOR_COMMITTEE_LENGTH: u64 = u64::MAX;

pub const PUBKEY_LENGTH: usize = 48;
