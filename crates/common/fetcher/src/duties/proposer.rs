use alloy_primitives::Address;
use futures::future::try_join_all;
use tessera_core::{Duty, DutyDefinitionSet, PubKey, SignedData, UnsignedData, UnsignedDataSet};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::unexpected_signed_data;
use crate::{errors::FetchError, fetcher::Fetcher};

impl Fetcher {
    /// Builds a block per validator from its aggregated randao reveal. `blinded` requests a
    /// payload header from the builder network instead of a full payload.
    pub(crate) async fn fetch_proposer_data(
        &self,
        cancel: &CancellationToken,
        duty: Duty,
        definitions: &DutyDefinitionSet,
        blinded: bool,
    ) -> Result<UnsignedDataSet, FetchError> {
        let agg_sig_db = self.agg_sig_db()?;

        let proposals = try_join_all(definitions.iter().map(|(pubkey, definition)| async move {
            if definition.as_proposer().is_none() {
                return Err(FetchError::UnexpectedDefinition {
                    pubkey: *pubkey,
                    expected: "proposer",
                });
            }

            let randao_duty = Duty::randao(duty.slot);
            let randao = match agg_sig_db
                .await_signed(cancel, randao_duty, *pubkey)
                .await
                .map_err(FetchError::await_failed("await randao reveal"))?
            {
                SignedData::Randao(randao) => randao,
                other => {
                    return Err(unexpected_signed_data(
                        randao_duty,
                        *pubkey,
                        "randao",
                        &other,
                    ));
                }
            };

            let fee_recipient = (self.fee_recipient)(pubkey);
            let graffiti = self.config.graffiti;
            let unsigned_data = if blinded {
                let block = self
                    .provider
                    .blinded_beacon_block_proposal(
                        duty.slot,
                        randao.signature,
                        graffiti,
                        fee_recipient,
                    )
                    .await
                    .map_err(FetchError::provider("blinded beacon block proposal"))?;
                verify_fee_recipient(duty, pubkey, fee_recipient, block.fee_recipient());
                UnsignedData::BlindedProposal(block)
            } else {
                let block = self
                    .provider
                    .beacon_block_proposal(duty.slot, randao.signature, graffiti, fee_recipient)
                    .await
                    .map_err(FetchError::provider("beacon block proposal"))?;
                verify_fee_recipient(duty, pubkey, fee_recipient, block.fee_recipient());
                UnsignedData::Proposal(block)
            };

            Ok::<_, FetchError>((*pubkey, unsigned_data))
        }))
        .await?;

        Ok(proposals.into_iter().collect())
    }
}

fn verify_fee_recipient(duty: Duty, pubkey: &PubKey, expected: Address, actual: Address) {
    if expected != actual {
        warn!(
            slot = duty.slot,
            duty = %duty.duty_type,
            pubkey = %pubkey,
            expected = %expected,
            actual = %actual,
            "Proposal fee recipient does not match the configured address"
        );
    }
}
