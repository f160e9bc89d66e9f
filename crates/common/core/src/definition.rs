use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    containers::{AttesterDuty, ProposerDuty, SyncCommitteeDuty},
    pubkey::PubKey,
};

/// The committee assignment a validator needs to fetch one duty.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "duty", rename_all = "snake_case")]
pub enum DutyDefinition {
    Attester(AttesterDuty),
    Proposer(ProposerDuty),
    SyncCommittee(SyncCommitteeDuty),
}

impl DutyDefinition {
    pub fn as_attester(&self) -> Option<&AttesterDuty> {
        match self {
            DutyDefinition::Attester(duty) => Some(duty),
            _ => None,
        }
    }

    pub fn as_proposer(&self) -> Option<&ProposerDuty> {
        match self {
            DutyDefinition::Proposer(duty) => Some(duty),
            _ => None,
        }
    }

    pub fn as_sync_committee(&self) -> Option<&SyncCommitteeDuty> {
        match self {
            DutyDefinition::SyncCommittee(duty) => Some(duty),
            _ => None,
        }
    }
}

impl From<AttesterDuty> for DutyDefinition {
    fn from(duty: AttesterDuty) -> Self {
        DutyDefinition::Attester(duty)
    }
}

impl From<ProposerDuty> for DutyDefinition {
    fn from(duty: ProposerDuty) -> Self {
        DutyDefinition::Proposer(duty)
    }
}

impl From<SyncCommitteeDuty> for DutyDefinition {
    fn from(duty: SyncCommitteeDuty) -> Self {
        DutyDefinition::SyncCommittee(duty)
    }
}

/// Definitions of one duty, keyed by validator.
pub type DutyDefinitionSet = HashMap<PubKey, DutyDefinition>;
