mod aggregator;
mod attester;
mod proposer;
mod sync_contribution;

use tessera_core::{Duty, PubKey, SignedData};

use crate::errors::FetchError;

fn unexpected_signed_data(
    duty: Duty,
    pubkey: PubKey,
    expected: &'static str,
    actual: &SignedData,
) -> FetchError {
    FetchError::UnexpectedSignedData {
        duty,
        pubkey,
        expected,
        actual: actual.kind(),
    }
}
