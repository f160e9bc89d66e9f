use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// The kind of work a cluster agrees on for a slot.
///
/// The discriminants are stable: they feed leader election, so every node must agree on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DutyType {
    Proposer = 1,
    Attester = 2,
    BuilderProposer = 3,
    Randao = 4,
    PrepareAggregator = 5,
    Aggregator = 6,
    SyncMessage = 7,
    PrepareSyncContribution = 8,
    SyncContribution = 9,
}

impl DutyType {
    pub const ALL: [DutyType; 9] = [
        DutyType::Proposer,
        DutyType::Attester,
        DutyType::BuilderProposer,
        DutyType::Randao,
        DutyType::PrepareAggregator,
        DutyType::Aggregator,
        DutyType::SyncMessage,
        DutyType::PrepareSyncContribution,
        DutyType::SyncContribution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DutyType::Proposer => "proposer",
            DutyType::Attester => "attester",
            DutyType::BuilderProposer => "builder_proposer",
            DutyType::Randao => "randao",
            DutyType::PrepareAggregator => "prepare_aggregator",
            DutyType::Aggregator => "aggregator",
            DutyType::SyncMessage => "sync_message",
            DutyType::PrepareSyncContribution => "prepare_sync_contribution",
            DutyType::SyncContribution => "sync_contribution",
        }
    }

    pub fn discriminant(&self) -> u64 {
        *self as u64
    }
}

impl fmt::Display for DutyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DutyType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DutyType::ALL
            .into_iter()
            .find(|duty_type| duty_type.as_str() == s)
            .ok_or_else(|| CoreError::UnknownDutyType(s.to_string()))
    }
}

/// One agreement round: a duty type at a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Duty {
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    #[serde(rename = "type")]
    pub duty_type: DutyType,
}

impl Duty {
    pub fn new(slot: u64, duty_type: DutyType) -> Self {
        Self { slot, duty_type }
    }

    pub fn proposer(slot: u64) -> Self {
        Self::new(slot, DutyType::Proposer)
    }

    pub fn attester(slot: u64) -> Self {
        Self::new(slot, DutyType::Attester)
    }

    pub fn builder_proposer(slot: u64) -> Self {
        Self::new(slot, DutyType::BuilderProposer)
    }

    pub fn randao(slot: u64) -> Self {
        Self::new(slot, DutyType::Randao)
    }

    pub fn prepare_aggregator(slot: u64) -> Self {
        Self::new(slot, DutyType::PrepareAggregator)
    }

    pub fn aggregator(slot: u64) -> Self {
        Self::new(slot, DutyType::Aggregator)
    }

    pub fn sync_message(slot: u64) -> Self {
        Self::new(slot, DutyType::SyncMessage)
    }

    pub fn prepare_sync_contribution(slot: u64) -> Self {
        Self::new(slot, DutyType::PrepareSyncContribution)
    }

    pub fn sync_contribution(slot: u64) -> Self {
        Self::new(slot, DutyType::SyncContribution)
    }
}

impl fmt::Display for Duty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.slot, self.duty_type)
    }
}
