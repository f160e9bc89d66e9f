use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    containers::{
        Attestation, AttestationData, AttesterDuty, BeaconBlock, BlindedBeaconBlock,
        SyncCommitteeContribution,
    },
    duty::{Duty, DutyType},
    errors::CoreError,
    pubkey::PubKey,
};

/// Attestation data together with the assignment of the validator that will sign it.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct AttesterData {
    pub data: AttestationData,
    pub duty: AttesterDuty,
}

/// The payload a cluster agrees on before signing.
///
/// The variant is implied by the duty type, so it is serialized untagged and decoded through
/// [`UnsignedData::from_json`] with the duty type as the tag.
#[derive(Debug, PartialEq, Eq, Clone, Serialize)]
#[serde(untagged)]
pub enum UnsignedData {
    Attestation(AttesterData),
    Proposal(BeaconBlock),
    BlindedProposal(BlindedBeaconBlock),
    AggregatedAttestation(Attestation),
    SyncContribution(SyncCommitteeContribution),
}

type Decoder = fn(Value) -> Result<UnsignedData, serde_json::Error>;

fn decode_attestation(value: Value) -> Result<UnsignedData, serde_json::Error> {
    serde_json::from_value(value).map(UnsignedData::Attestation)
}

fn decode_proposal(value: Value) -> Result<UnsignedData, serde_json::Error> {
    serde_json::from_value(value).map(UnsignedData::Proposal)
}

fn decode_blinded_proposal(value: Value) -> Result<UnsignedData, serde_json::Error> {
    serde_json::from_value(value).map(UnsignedData::BlindedProposal)
}

fn decode_aggregated_attestation(value: Value) -> Result<UnsignedData, serde_json::Error> {
    serde_json::from_value(value).map(UnsignedData::AggregatedAttestation)
}

fn decode_sync_contribution(value: Value) -> Result<UnsignedData, serde_json::Error> {
    serde_json::from_value(value).map(UnsignedData::SyncContribution)
}

/// Decode table keyed by duty type. Duty types without an unsigned payload have no entry.
fn decoder(duty_type: DutyType) -> Option<Decoder> {
    match duty_type {
        DutyType::Attester => Some(decode_attestation as Decoder),
        DutyType::Proposer => Some(decode_proposal as Decoder),
        DutyType::BuilderProposer => Some(decode_blinded_proposal as Decoder),
        DutyType::Aggregator => Some(decode_aggregated_attestation as Decoder),
        DutyType::SyncContribution => Some(decode_sync_contribution as Decoder),
        DutyType::Randao
        | DutyType::PrepareAggregator
        | DutyType::SyncMessage
        | DutyType::PrepareSyncContribution => None,
    }
}

impl UnsignedData {
    pub fn duty_type(&self) -> DutyType {
        match self {
            UnsignedData::Attestation(_) => DutyType::Attester,
            UnsignedData::Proposal(_) => DutyType::Proposer,
            UnsignedData::BlindedProposal(_) => DutyType::BuilderProposer,
            UnsignedData::AggregatedAttestation(_) => DutyType::Aggregator,
            UnsignedData::SyncContribution(_) => DutyType::SyncContribution,
        }
    }

    /// Decodes a JSON payload into the variant implied by `duty_type`.
    pub fn from_json(duty_type: DutyType, value: Value) -> Result<Self, CoreError> {
        let decode = decoder(duty_type).ok_or(CoreError::UnsupportedDutyType(duty_type))?;
        Ok(decode(value)?)
    }

    pub fn has_payload(duty_type: DutyType) -> bool {
        decoder(duty_type).is_some()
    }

    /// Checks that every value of a set belongs to the duty's type.
    pub fn validate_set(duty: &Duty, set: &UnsignedDataSet) -> Result<(), CoreError> {
        if !Self::has_payload(duty.duty_type) {
            return Err(CoreError::UnsupportedDutyType(duty.duty_type));
        }
        match set
            .values()
            .find(|data| data.duty_type() != duty.duty_type)
        {
            Some(data) => Err(CoreError::MismatchedData {
                expected: duty.duty_type,
                actual: data.duty_type(),
            }),
            None => Ok(()),
        }
    }
}

/// Unsigned payloads of one duty, keyed by validator.
pub type UnsignedDataSet = HashMap<PubKey, UnsignedData>;
