use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tessera_core::{CoreError, Duty, PubKey, UnsignedData, UnsignedDataSet};

use crate::errors::TransportError;

/// A leader's proposal for one duty, as received by a follower.
///
/// On the wire this is one JSON document. The payloads carry no tag of their own: the duty
/// type selects the decoder, and a payload that does not fit it fails the whole message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "WireMessage")]
pub struct LeaderCastMessage {
    pub sender_index: usize,
    pub duty: Duty,
    pub data: UnsignedDataSet,
}

#[derive(Serialize)]
struct WireMessageRef<'a> {
    sender_index: usize,
    duty: Duty,
    data: &'a UnsignedDataSet,
}

#[derive(Deserialize)]
struct WireMessage {
    sender_index: usize,
    duty: Duty,
    data: HashMap<PubKey, Value>,
}

impl TryFrom<WireMessage> for LeaderCastMessage {
    type Error = CoreError;

    fn try_from(message: WireMessage) -> Result<Self, Self::Error> {
        let duty_type = message.duty.duty_type;
        let data = message
            .data
            .into_iter()
            .map(|(pubkey, value)| Ok((pubkey, UnsignedData::from_json(duty_type, value)?)))
            .collect::<Result<UnsignedDataSet, CoreError>>()?;

        Ok(Self {
            sender_index: message.sender_index,
            duty: message.duty,
            data,
        })
    }
}

/// Encodes a proposal after checking every payload belongs to the duty's type.
pub fn encode(
    sender_index: usize,
    duty: Duty,
    data: &UnsignedDataSet,
) -> Result<Vec<u8>, TransportError> {
    UnsignedData::validate_set(&duty, data).map_err(TransportError::Encode)?;
    serde_json::to_vec(&WireMessageRef {
        sender_index,
        duty,
        data,
    })
    .map_err(|err| TransportError::Encode(err.into()))
}

impl LeaderCastMessage {
    pub fn new(sender_index: usize, duty: Duty, data: UnsignedDataSet) -> Self {
        Self {
            sender_index,
            duty,
            data,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, TransportError> {
        encode(self.sender_index, self.duty, &self.data)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TransportError> {
        serde_json::from_slice(bytes).map_err(TransportError::Decode)
    }
}
