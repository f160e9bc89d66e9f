use std::sync::{Arc, OnceLock};

use futures::{FutureExt, future::BoxFuture};
use parking_lot::RwLock;
use tessera_core::{Duty, DutyDefinitionSet, DutyType, UnsignedDataSet};
use tessera_metrics::{
    FETCH_DURATION, FETCH_ERRORS,
    helpers::{inc_int_counter_vec, start_timer_vec, stop_timer},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::FetcherConfig,
    errors::FetchError,
    traits::{AggSigDb, AwaitAttData, ConsensusProvider, FeeRecipientFn},
};

pub type Subscriber = Arc<
    dyn Fn(CancellationToken, Duty, UnsignedDataSet) -> BoxFuture<'static, anyhow::Result<()>>
        + Send
        + Sync,
>;

/// Resolves duties into the unsigned data every node of the cluster signs.
///
/// The fetcher keeps no state between calls. Data produced by earlier duties (randao reveals,
/// selection proofs, sync messages, attestation data) is awaited from the registered
/// [`AggSigDb`] and [`AwaitAttData`].
pub struct Fetcher {
    pub(crate) provider: Arc<dyn ConsensusProvider>,
    pub(crate) fee_recipient: FeeRecipientFn,
    pub(crate) config: FetcherConfig,
    agg_sig_db: OnceLock<Arc<dyn AggSigDb>>,
    await_att_data: OnceLock<Arc<dyn AwaitAttData>>,
    subscribers: RwLock<Vec<Subscriber>>,
}

impl Fetcher {
    pub fn new(
        provider: Arc<dyn ConsensusProvider>,
        fee_recipient: FeeRecipientFn,
        config: FetcherConfig,
    ) -> Self {
        Self {
            provider,
            fee_recipient,
            config,
            agg_sig_db: OnceLock::new(),
            await_att_data: OnceLock::new(),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn register_agg_sig_db(&self, agg_sig_db: Arc<dyn AggSigDb>) -> Result<(), FetchError> {
        self.agg_sig_db
            .set(agg_sig_db)
            .map_err(|_| FetchError::AlreadyRegistered("AggSigDb"))
    }

    pub fn register_await_att_data(
        &self,
        await_att_data: Arc<dyn AwaitAttData>,
    ) -> Result<(), FetchError> {
        self.await_att_data
            .set(await_att_data)
            .map_err(|_| FetchError::AlreadyRegistered("AwaitAttData"))
    }

    pub(crate) fn agg_sig_db(&self) -> Result<&Arc<dyn AggSigDb>, FetchError> {
        self.agg_sig_db
            .get()
            .ok_or(FetchError::MissingCollaborator("AggSigDb"))
    }

    pub(crate) fn await_att_data(&self) -> Result<&Arc<dyn AwaitAttData>, FetchError> {
        self.await_att_data
            .get()
            .ok_or(FetchError::MissingCollaborator("AwaitAttData"))
    }

    /// Registers a callback invoked with every fetched set, in registration order.
    pub fn subscribe<F, Fut>(&self, subscriber: F)
    where
        F: Fn(CancellationToken, Duty, UnsignedDataSet) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let subscriber: Subscriber =
            Arc::new(move |cancel, duty, data| subscriber(cancel, duty, data).boxed());
        self.subscribers.write().push(subscriber);
    }

    /// Fetches the unsigned data of `duty` for every validator in `definitions` and hands the
    /// complete set to the subscribers.
    ///
    /// Nothing is published if any validator fails. An empty definition set, or a two-phase
    /// duty with no eligible aggregator, completes without calling the subscribers.
    pub async fn fetch(
        &self,
        cancel: &CancellationToken,
        duty: Duty,
        definitions: &DutyDefinitionSet,
    ) -> Result<(), FetchError> {
        if definitions.is_empty() {
            debug!(slot = duty.slot, duty = %duty.duty_type, "No definitions to fetch");
            return Ok(());
        }

        let timer = start_timer_vec(&FETCH_DURATION, &[duty.duty_type.as_str()]);
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.fetch_unsigned(cancel, duty, definitions) => result,
        };
        let elapsed = stop_timer(timer);

        let unsigned_set = match result {
            Ok(unsigned_set) => unsigned_set,
            Err(err) => {
                inc_int_counter_vec(&FETCH_ERRORS, &[duty.duty_type.as_str()]);
                if err.is_retryable() {
                    warn!(slot = duty.slot, duty = %duty.duty_type, "Retryable fetch failure: {err}");
                }
                return Err(err);
            }
        };

        if unsigned_set.is_empty() {
            debug!(slot = duty.slot, duty = %duty.duty_type, "No eligible validators for duty");
            return Ok(());
        }

        debug!(
            slot = duty.slot,
            duty = %duty.duty_type,
            count = unsigned_set.len(),
            ?elapsed,
            "Fetched unsigned data"
        );

        let subscribers = self.subscribers.read().clone();
        for subscriber in subscribers {
            subscriber(cancel.clone(), duty, unsigned_set.clone())
                .await
                .map_err(FetchError::Subscriber)?;
        }

        Ok(())
    }

    async fn fetch_unsigned(
        &self,
        cancel: &CancellationToken,
        duty: Duty,
        definitions: &DutyDefinitionSet,
    ) -> Result<UnsignedDataSet, FetchError> {
        match duty.duty_type {
            DutyType::Attester => self
                .fetch_attester_data(duty.slot, definitions)
                .await
                .map_err(|err| err.context("fetch attester data")),
            DutyType::Proposer => self
                .fetch_proposer_data(cancel, duty, definitions, false)
                .await
                .map_err(|err| err.context("fetch proposer data")),
            DutyType::BuilderProposer => self
                .fetch_proposer_data(cancel, duty, definitions, true)
                .await
                .map_err(|err| err.context("fetch builder proposer data")),
            DutyType::Aggregator => self
                .fetch_aggregator_data(cancel, duty, definitions)
                .await
                .map_err(|err| err.context("fetch aggregator data")),
            DutyType::SyncContribution => self
                .fetch_contribution_data(cancel, duty, definitions)
                .await
                .map_err(|err| err.context("fetch contribution data")),
            DutyType::Randao
            | DutyType::PrepareAggregator
            | DutyType::SyncMessage
            | DutyType::PrepareSyncContribution => {
                Err(FetchError::UnsupportedDutyType(duty.duty_type))
            }
        }
    }
}
