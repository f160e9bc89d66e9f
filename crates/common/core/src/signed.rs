use crate::containers::{
    Attestation, BeaconCommitteeSelection, SignedRandao, SyncCommitteeMessage,
    SyncCommitteeSelection,
};

/// A previously agreed and signed artifact, consumed when another duty depends on it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SignedData {
    Randao(SignedRandao),
    BeaconCommitteeSelection(BeaconCommitteeSelection),
    SyncCommitteeSelection(SyncCommitteeSelection),
    SyncMessage(SyncCommitteeMessage),
    Attestation(Attestation),
}

impl SignedData {
    pub fn kind(&self) -> &'static str {
        match self {
            SignedData::Randao(_) => "randao",
            SignedData::BeaconCommitteeSelection(_) => "beacon_committee_selection",
            SignedData::SyncCommitteeSelection(_) => "sync_committee_selection",
            SignedData::SyncMessage(_) => "sync_message",
            SignedData::Attestation(_) => "attestation",
        }
    }
}

impl From<SignedRandao> for SignedData {
    fn from(randao: SignedRandao) -> Self {
        SignedData::Randao(randao)
    }
}

impl From<BeaconCommitteeSelection> for SignedData {
    fn from(selection: BeaconCommitteeSelection) -> Self {
        SignedData::BeaconCommitteeSelection(selection)
    }
}

impl From<SyncCommitteeSelection> for SignedData {
    fn from(selection: SyncCommitteeSelection) -> Self {
        SignedData::SyncCommitteeSelection(selection)
    }
}

impl From<SyncCommitteeMessage> for SignedData {
    fn from(message: SyncCommitteeMessage) -> Self {
        SignedData::SyncMessage(message)
    }
}

impl From<Attestation> for SignedData {
    fn from(attestation: Attestation) -> Self {
        SignedData::Attestation(attestation)
    }
}
