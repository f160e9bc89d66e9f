use std::collections::BTreeMap;

use futures::future::try_join_all;
use tessera_core::{
    DutyDefinitionSet, PubKey, UnsignedData, UnsignedDataSet, containers::AttesterDuty,
    unsigned::AttesterData,
};
use tracing::debug;

use crate::{errors::FetchError, fetcher::Fetcher};

impl Fetcher {
    /// Queries attestation data once per committee and shares it with every member.
    pub(crate) async fn fetch_attester_data(
        &self,
        slot: u64,
        definitions: &DutyDefinitionSet,
    ) -> Result<UnsignedDataSet, FetchError> {
        let mut committees: BTreeMap<u64, Vec<(PubKey, &AttesterDuty)>> = BTreeMap::new();
        for (pubkey, definition) in definitions {
            let attester =
                definition
                    .as_attester()
                    .ok_or(FetchError::UnexpectedDefinition {
                        pubkey: *pubkey,
                        expected: "attester",
                    })?;
            committees
                .entry(attester.committee_index)
                .or_default()
                .push((*pubkey, attester));
        }

        let attestation_data = try_join_all(committees.keys().map(|committee_index| async move {
            let data = self
                .provider
                .attestation_data(slot, *committee_index)
                .await
                .map_err(FetchError::provider("attestation data"))?;
            Ok::<_, FetchError>((*committee_index, data))
        }))
        .await?;

        debug!(slot, committees = committees.len(), "Fetched attestation data");

        let mut unsigned_set = UnsignedDataSet::new();
        for (committee_index, data) in attestation_data {
            for (pubkey, attester) in committees.get(&committee_index).into_iter().flatten() {
                unsigned_set.insert(
                    *pubkey,
                    UnsignedData::Attestation(AttesterData {
                        data,
                        duty: (*attester).clone(),
                    }),
                );
            }
        }

        Ok(unsigned_set)
    }
}
