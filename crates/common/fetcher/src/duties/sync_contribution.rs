use std::collections::BTreeMap;

use futures::future::try_join_all;
use tessera_core::{
    Duty, DutyDefinitionSet, SignedData, UnsignedData, UnsignedDataSet,
    eligibility::is_sync_committee_aggregator,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::unexpected_signed_data;
use crate::{errors::FetchError, fetcher::Fetcher};

impl Fetcher {
    /// Selects sync committee aggregators from their selection proofs, locates the block root
    /// each one's sync message voted for, and fetches one contribution per
    /// (subcommittee, root).
    pub(crate) async fn fetch_contribution_data(
        &self,
        cancel: &CancellationToken,
        duty: Duty,
        definitions: &DutyDefinitionSet,
    ) -> Result<UnsignedDataSet, FetchError> {
        let agg_sig_db = self.agg_sig_db()?;

        let aggregators = try_join_all(definitions.iter().map(|(pubkey, definition)| async move {
            if definition.as_sync_committee().is_none() {
                return Err(FetchError::UnexpectedDefinition {
                    pubkey: *pubkey,
                    expected: "sync committee",
                });
            }

            let selection_duty = Duty::prepare_sync_contribution(duty.slot);
            let selection = match agg_sig_db
                .await_signed(cancel, selection_duty, *pubkey)
                .await
                .map_err(FetchError::await_failed("await sync committee selection"))?
            {
                SignedData::SyncCommitteeSelection(selection) => selection,
                other => {
                    return Err(unexpected_signed_data(
                        selection_duty,
                        *pubkey,
                        "sync_committee_selection",
                        &other,
                    ));
                }
            };
            if !is_sync_committee_aggregator(&selection.selection_proof) {
                return Ok(None);
            }

            let message_duty = Duty::sync_message(duty.slot);
            let message = match agg_sig_db
                .await_signed(cancel, message_duty, *pubkey)
                .await
                .map_err(FetchError::await_failed("await sync committee message"))?
            {
                SignedData::SyncMessage(message) => message,
                other => {
                    return Err(unexpected_signed_data(
                        message_duty,
                        *pubkey,
                        "sync_message",
                        &other,
                    ));
                }
            };

            Ok::<_, FetchError>(Some((
                *pubkey,
                selection.subcommittee_index,
                message.beacon_block_root,
            )))
        }))
        .await?;

        let mut subcommittees = BTreeMap::<_, Vec<_>>::new();
        for (pubkey, subcommittee_index, root) in aggregators.into_iter().flatten() {
            subcommittees
                .entry((subcommittee_index, root))
                .or_default()
                .push(pubkey);
        }
        if subcommittees.is_empty() {
            debug!(slot = duty.slot, "No sync committee aggregators selected");
            return Ok(UnsignedDataSet::new());
        }

        let contributions = try_join_all(subcommittees.keys().map(
            |&(subcommittee_index, root)| async move {
                let contribution = self
                    .provider
                    .sync_committee_contribution(duty.slot, subcommittee_index, root)
                    .await
                    .map_err(FetchError::provider("sync committee contribution"))?;
                Ok::<_, FetchError>(((subcommittee_index, root), contribution))
            },
        ))
        .await?;

        let mut unsigned_set = UnsignedDataSet::new();
        for (key, contribution) in contributions {
            for pubkey in subcommittees.get(&key).into_iter().flatten() {
                unsigned_set.insert(
                    *pubkey,
                    UnsignedData::SyncContribution(contribution.clone()),
                );
            }
        }

        Ok(unsigned_set)
    }
}
