use std::collections::BTreeMap;

use futures::future::try_join_all;
use tessera_core::{
    Duty, DutyDefinitionSet, SignedData, UnsignedData, UnsignedDataSet,
    constants::NON_AGGREGATOR_COMMITTEE_LENGTH, eligibility::is_attestation_aggregator,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tree_hash::TreeHash;

use super::unexpected_signed_data;
use crate::{errors::FetchError, fetcher::Fetcher};

impl Fetcher {
    /// Selects the aggregators from their prepare-aggregator selection proofs, then fetches one
    /// aggregate per committee that has at least one of them.
    pub(crate) async fn fetch_aggregator_data(
        &self,
        cancel: &CancellationToken,
        duty: Duty,
        definitions: &DutyDefinitionSet,
    ) -> Result<UnsignedDataSet, FetchError> {
        let agg_sig_db = self.agg_sig_db()?;

        let selections = try_join_all(definitions.iter().map(|(pubkey, definition)| async move {
            let attester =
                definition
                    .as_attester()
                    .ok_or(FetchError::UnexpectedDefinition {
                        pubkey: *pubkey,
                        expected: "attester",
                    })?;
            if attester.committee_length == NON_AGGREGATOR_COMMITTEE_LENGTH {
                return Ok(None);
            }

            let selection_duty = Duty::prepare_aggregator(duty.slot);
            let selection = match agg_sig_db
                .await_signed(cancel, selection_duty, *pubkey)
                .await
                .map_err(FetchError::await_failed("await beacon committee selection"))?
            {
                SignedData::BeaconCommitteeSelection(selection) => selection,
                other => {
                    return Err(unexpected_signed_data(
                        selection_duty,
                        *pubkey,
                        "beacon_committee_selection",
                        &other,
                    ));
                }
            };

            if !is_attestation_aggregator(attester.committee_length, &selection.selection_proof) {
                return Ok(None);
            }
            Ok::<_, FetchError>(Some((*pubkey, attester.committee_index)))
        }))
        .await?;

        let mut committees = BTreeMap::<u64, Vec<_>>::new();
        for (pubkey, committee_index) in selections.into_iter().flatten() {
            committees.entry(committee_index).or_default().push(pubkey);
        }
        if committees.is_empty() {
            debug!(slot = duty.slot, "No aggregators selected");
            return Ok(UnsignedDataSet::new());
        }

        let await_att_data = self.await_att_data()?;
        let aggregates = try_join_all(committees.keys().map(|committee_index| async move {
            let attestation_data = await_att_data
                .await_attestation_data(cancel, duty.slot, *committee_index)
                .await
                .map_err(FetchError::await_failed("await attestation data"))?;

            let root = attestation_data.tree_hash_root();
            let aggregate = self
                .provider
                .aggregate_attestation(duty.slot, root)
                .await
                .map_err(FetchError::provider("aggregate attestation"))?
                .ok_or(FetchError::AggregateNotFound { root })?;
            Ok::<_, FetchError>((*committee_index, aggregate))
        }))
        .await?;

        let mut unsigned_set = UnsignedDataSet::new();
        for (committee_index, aggregate) in aggregates {
            for pubkey in committees.get(&committee_index).into_iter().flatten() {
                unsigned_set.insert(
                    *pubkey,
                    UnsignedData::AggregatedAttestation(aggregate.clone()),
                );
            }
        }

        Ok(unsigned_set)
    }
}
