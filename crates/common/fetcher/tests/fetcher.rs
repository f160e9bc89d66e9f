use std::{collections::HashSet, sync::Arc, time::Duration};

use alloy_primitives::{Address, B256, FixedBytes};
use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::Mutex;
use rstest::rstest;
use tessera_core::{
    Duty, DutyDefinition, DutyDefinitionSet, DutyType, PubKey, SignedData, UnsignedData,
    UnsignedDataSet,
    constants::{AGGREGATOR_COMMITTEE_LENGTH, NON_AGGREGATOR_COMMITTEE_LENGTH},
    containers::{
        AttesterDuty, BLSSignature, BeaconCommitteeSelection, ProposerDuty, SignedRandao,
        SyncCommitteeDuty, SyncCommitteeMessage, SyncCommitteeSelection,
    },
    eligibility::is_sync_committee_aggregator,
};
use tessera_duty_store::{AttestationDataStore, MemAggSigDb};
use tessera_fetcher::{AggSigDb, AwaitError, FetchError, Fetcher, FetcherConfig};
use tessera_test_utils::{
    BeaconMock,
    beacon_mock::{mock_aggregate, mock_attestation_data},
    random::{random_pubkeys, random_root, random_signature},
};
use tokio_util::sync::CancellationToken;
use tracing_test::traced_test;
use tree_hash::TreeHash;

const SLOT: u64 = 65;

type Published = Arc<Mutex<Vec<(Duty, UnsignedDataSet)>>>;

fn new_fetcher(mock: Arc<BeaconMock>) -> Fetcher {
    Fetcher::new(
        mock,
        Arc::new(|_: &PubKey| Address::ZERO),
        FetcherConfig::default(),
    )
}

fn record(fetcher: &Fetcher) -> Published {
    let published: Published = Arc::default();
    let sink = published.clone();
    fetcher.subscribe(move |_, duty, data| {
        let sink = sink.clone();
        async move {
            sink.lock().push((duty, data));
            Ok(())
        }
    });
    published
}

fn attester_duty(pubkey: PubKey, validator_index: u64, committee_index: u64) -> AttesterDuty {
    AttesterDuty {
        pubkey,
        slot: SLOT,
        validator_index,
        committee_index,
        committee_length: 128,
        committees_at_slot: 4,
        validator_committee_index: validator_index % 128,
    }
}

fn proof_where(eligible: bool) -> BLSSignature {
    (0..=255u8)
        .map(|byte| FixedBytes::from([byte; 96]))
        .find(|proof| is_sync_committee_aggregator(proof) == eligible)
        .expect("some proof matches")
}

#[tokio::test]
#[traced_test]
async fn test_attester_queries_each_committee_once() -> anyhow::Result<()> {
    let mock = Arc::new(BeaconMock::new());
    let fetcher = new_fetcher(mock.clone());
    let published = record(&fetcher);

    let pubkeys = random_pubkeys(3);
    let definitions: DutyDefinitionSet = [
        (pubkeys[0], attester_duty(pubkeys[0], 1, 1).into()),
        (pubkeys[1], attester_duty(pubkeys[1], 2, 1).into()),
        (pubkeys[2], attester_duty(pubkeys[2], 3, 2).into()),
    ]
    .into_iter()
    .collect();

    fetcher
        .fetch(&CancellationToken::new(), Duty::attester(SLOT), &definitions)
        .await?;

    assert_eq!(mock.attestation_data_calls(), 2);

    let published = published.lock();
    assert_eq!(published.len(), 1);
    let (duty, data) = &published[0];
    assert_eq!(*duty, Duty::attester(SLOT));
    assert_eq!(
        data.keys().collect::<HashSet<_>>(),
        definitions.keys().collect::<HashSet<_>>()
    );

    let attestation_data = |pubkey: &PubKey| match &data[pubkey] {
        UnsignedData::Attestation(attester) => attester.clone(),
        other => panic!("unexpected unsigned data {other:?}"),
    };
    let first = attestation_data(&pubkeys[0]);
    let second = attestation_data(&pubkeys[1]);
    let third = attestation_data(&pubkeys[2]);
    assert_eq!(first.data, second.data);
    assert_eq!(first.data, mock_attestation_data(SLOT, 1));
    assert_eq!(third.data, mock_attestation_data(SLOT, 2));
    assert_eq!(first.duty.validator_index, 1);
    assert_eq!(second.duty.validator_index, 2);
    Ok(())
}

#[tokio::test]
async fn test_attester_provider_error_is_wrapped() {
    let mock = Arc::new(BeaconMock::new().with_attestation_data(|_, _| Err(anyhow!("timeout"))));
    let fetcher = new_fetcher(mock);
    let published = record(&fetcher);

    let pubkey = random_pubkeys(1)[0];
    let definitions: DutyDefinitionSet =
        [(pubkey, attester_duty(pubkey, 1, 1).into())].into_iter().collect();

    let err = fetcher
        .fetch(&CancellationToken::new(), Duty::attester(SLOT), &definitions)
        .await
        .expect_err("provider failure fails the fetch");

    assert!(!err.is_retryable());
    assert_eq!(err.to_string(), "fetch attester data: attestation data: timeout");
    assert!(published.lock().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_aggregator() -> anyhow::Result<()> {
    let mock = Arc::new(BeaconMock::new());
    let fetcher = new_fetcher(mock.clone());
    let agg_sig_db = Arc::new(MemAggSigDb::new());
    let att_data = Arc::new(AttestationDataStore::new());
    fetcher.register_agg_sig_db(agg_sig_db.clone())?;
    fetcher.register_await_att_data(att_data.clone())?;
    let published = record(&fetcher);

    let pubkeys = random_pubkeys(2);
    let mut definitions = DutyDefinitionSet::new();
    for (index, pubkey) in pubkeys.iter().enumerate() {
        let mut duty = attester_duty(*pubkey, index as u64, index as u64 + 1);
        duty.committee_length = AGGREGATOR_COMMITTEE_LENGTH;
        definitions.insert(*pubkey, duty.into());

        agg_sig_db.store(
            Duty::prepare_aggregator(SLOT),
            *pubkey,
            BeaconCommitteeSelection {
                validator_index: index as u64,
                slot: SLOT,
                selection_proof: random_signature(),
            }
            .into(),
        )?;
        att_data.store(mock_attestation_data(SLOT, index as u64 + 1))?;
    }

    fetcher
        .fetch(&CancellationToken::new(), Duty::aggregator(SLOT), &definitions)
        .await?;

    assert_eq!(mock.aggregate_attestation_calls(), 2);
    let published = published.lock();
    let (_, data) = &published[0];
    assert_eq!(data.len(), 2);
    for (index, pubkey) in pubkeys.iter().enumerate() {
        let expected_root = mock_attestation_data(SLOT, index as u64 + 1).tree_hash_root();
        match &data[pubkey] {
            UnsignedData::AggregatedAttestation(aggregate) => {
                assert_eq!(aggregate.data.beacon_block_root, expected_root);
            }
            other => panic!("unexpected unsigned data {other:?}"),
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_non_aggregators_skip_lookups() -> anyhow::Result<()> {
    let mock = Arc::new(BeaconMock::new());
    let fetcher = new_fetcher(mock.clone());
    // No AwaitAttData: a fetch without aggregators never needs it.
    fetcher.register_agg_sig_db(Arc::new(MemAggSigDb::new()))?;
    let published = record(&fetcher);

    let definitions: DutyDefinitionSet = random_pubkeys(3)
        .into_iter()
        .enumerate()
        .map(|(index, pubkey)| {
            let mut duty = attester_duty(pubkey, index as u64, 1);
            duty.committee_length = NON_AGGREGATOR_COMMITTEE_LENGTH;
            (pubkey, duty.into())
        })
        .collect();

    tokio::time::timeout(
        Duration::from_secs(1),
        fetcher.fetch(&CancellationToken::new(), Duty::aggregator(SLOT), &definitions),
    )
    .await??;

    assert_eq!(mock.aggregate_attestation_calls(), 0);
    assert!(published.lock().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_selected_aggregator_requires_attestation_data() -> anyhow::Result<()> {
    let fetcher = new_fetcher(Arc::new(BeaconMock::new()));
    let agg_sig_db = Arc::new(MemAggSigDb::new());
    fetcher.register_agg_sig_db(agg_sig_db.clone())?;

    let pubkey = random_pubkeys(1)[0];
    let mut duty = attester_duty(pubkey, 0, 2);
    duty.committee_length = AGGREGATOR_COMMITTEE_LENGTH;
    let definitions: DutyDefinitionSet = [(pubkey, duty.into())].into_iter().collect();
    agg_sig_db.store(
        Duty::prepare_aggregator(SLOT),
        pubkey,
        BeaconCommitteeSelection {
            validator_index: 0,
            slot: SLOT,
            selection_proof: random_signature(),
        }
        .into(),
    )?;

    let err = fetcher
        .fetch(&CancellationToken::new(), Duty::aggregator(SLOT), &definitions)
        .await
        .expect_err("unregistered AwaitAttData");
    assert!(matches!(
        err,
        FetchError::Context { source, .. } if matches!(*source, FetchError::MissingCollaborator("AwaitAttData"))
    ));
    Ok(())
}

#[tokio::test]
async fn test_aggregate_not_found_is_retryable() -> anyhow::Result<()> {
    let mock = Arc::new(BeaconMock::new().with_aggregate_attestation(|_, _| Ok(None)));
    let fetcher = new_fetcher(mock);
    let agg_sig_db = Arc::new(MemAggSigDb::new());
    let att_data = Arc::new(AttestationDataStore::new());
    fetcher.register_agg_sig_db(agg_sig_db.clone())?;
    fetcher.register_await_att_data(att_data.clone())?;

    let pubkey = random_pubkeys(1)[0];
    let mut duty = attester_duty(pubkey, 0, 3);
    duty.committee_length = AGGREGATOR_COMMITTEE_LENGTH;
    let definitions: DutyDefinitionSet = [(pubkey, duty.into())].into_iter().collect();
    agg_sig_db.store(
        Duty::prepare_aggregator(SLOT),
        pubkey,
        BeaconCommitteeSelection {
            validator_index: 0,
            slot: SLOT,
            selection_proof: random_signature(),
        }
        .into(),
    )?;
    att_data.store(mock_attestation_data(SLOT, 3))?;

    let err = fetcher
        .fetch(&CancellationToken::new(), Duty::aggregator(SLOT), &definitions)
        .await
        .expect_err("missing aggregate fails the fetch");

    assert!(err.is_retryable());
    assert!(err.to_string().contains("not found by root"));
    Ok(())
}

#[rstest]
#[case::proposer(DutyType::Proposer)]
#[case::builder_proposer(DutyType::BuilderProposer)]
#[tokio::test]
async fn test_proposer(#[case] duty_type: DutyType) -> anyhow::Result<()> {
    let mock = Arc::new(BeaconMock::new());
    let fetcher = new_fetcher(mock);
    let agg_sig_db = Arc::new(MemAggSigDb::new());
    fetcher.register_agg_sig_db(agg_sig_db.clone())?;
    let published = record(&fetcher);

    let pubkeys = random_pubkeys(2);
    let mut randaos = Vec::new();
    let mut definitions = DutyDefinitionSet::new();
    for (index, pubkey) in pubkeys.iter().enumerate() {
        definitions.insert(
            *pubkey,
            ProposerDuty {
                pubkey: *pubkey,
                slot: SLOT,
                validator_index: index as u64,
            }
            .into(),
        );
        let signature = random_signature();
        agg_sig_db.store(
            Duty::randao(SLOT),
            *pubkey,
            SignedRandao {
                epoch: 2,
                signature,
            }
            .into(),
        )?;
        randaos.push(signature);
    }

    fetcher
        .fetch(
            &CancellationToken::new(),
            Duty::new(SLOT, duty_type),
            &definitions,
        )
        .await?;

    let published = published.lock();
    let (_, data) = &published[0];
    assert_eq!(data.len(), 2);
    for (pubkey, randao) in pubkeys.iter().zip(randaos) {
        let (fee_recipient, randao_reveal) = match &data[pubkey] {
            UnsignedData::Proposal(block) => (block.fee_recipient(), block.body.randao_reveal),
            UnsignedData::BlindedProposal(block) => {
                (block.fee_recipient(), block.body.randao_reveal)
            }
            other => panic!("unexpected unsigned data {other:?}"),
        };
        assert_eq!(data[pubkey].duty_type(), duty_type);
        assert_eq!(fee_recipient, Address::ZERO);
        assert_eq!(randao_reveal, randao);
    }
    Ok(())
}

fn sync_definitions(pubkeys: &[PubKey]) -> DutyDefinitionSet {
    pubkeys
        .iter()
        .enumerate()
        .map(|(index, pubkey)| {
            let definition = DutyDefinition::SyncCommittee(SyncCommitteeDuty {
                pubkey: *pubkey,
                validator_index: index as u64,
                validator_sync_committee_indices: vec![index as u64],
            });
            (*pubkey, definition)
        })
        .collect()
}

fn store_sync_artifacts(
    agg_sig_db: &MemAggSigDb,
    pubkey: PubKey,
    validator_index: u64,
    subcommittee_index: u64,
    root: B256,
    eligible: bool,
) -> anyhow::Result<()> {
    agg_sig_db.store(
        Duty::prepare_sync_contribution(SLOT),
        pubkey,
        SyncCommitteeSelection {
            validator_index,
            slot: SLOT,
            subcommittee_index,
            selection_proof: proof_where(eligible),
        }
        .into(),
    )?;
    agg_sig_db.store(
        Duty::sync_message(SLOT),
        pubkey,
        SyncCommitteeMessage {
            slot: SLOT,
            beacon_block_root: root,
            validator_index,
            signature: random_signature(),
        }
        .into(),
    )?;
    Ok(())
}

#[tokio::test]
async fn test_sync_contribution_aggregators() -> anyhow::Result<()> {
    let mock = Arc::new(BeaconMock::new());
    let fetcher = new_fetcher(mock.clone());
    let agg_sig_db = Arc::new(MemAggSigDb::new());
    fetcher.register_agg_sig_db(agg_sig_db.clone())?;
    let published = record(&fetcher);

    let pubkeys = random_pubkeys(3);
    let root = random_root();
    store_sync_artifacts(&agg_sig_db, pubkeys[0], 0, 1, root, true)?;
    store_sync_artifacts(&agg_sig_db, pubkeys[1], 1, 1, root, true)?;
    store_sync_artifacts(&agg_sig_db, pubkeys[2], 2, 2, root, false)?;

    fetcher
        .fetch(
            &CancellationToken::new(),
            Duty::sync_contribution(SLOT),
            &sync_definitions(&pubkeys),
        )
        .await?;

    assert_eq!(mock.sync_committee_contribution_calls(), 1);
    let published = published.lock();
    let (_, data) = &published[0];
    assert_eq!(data.len(), 2);
    assert!(!data.contains_key(&pubkeys[2]));
    for pubkey in &pubkeys[..2] {
        match &data[pubkey] {
            UnsignedData::SyncContribution(contribution) => {
                assert_eq!(contribution.subcommittee_index, 1);
                assert_eq!(contribution.beacon_block_root, root);
            }
            other => panic!("unexpected unsigned data {other:?}"),
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_sync_contribution_without_aggregators() -> anyhow::Result<()> {
    let mock = Arc::new(BeaconMock::new());
    let fetcher = new_fetcher(mock.clone());
    let agg_sig_db = Arc::new(MemAggSigDb::new());
    fetcher.register_agg_sig_db(agg_sig_db.clone())?;
    let published = record(&fetcher);

    let pubkeys = random_pubkeys(2);
    for (index, pubkey) in pubkeys.iter().enumerate() {
        store_sync_artifacts(&agg_sig_db, *pubkey, index as u64, 0, random_root(), false)?;
    }

    fetcher
        .fetch(
            &CancellationToken::new(),
            Duty::sync_contribution(SLOT),
            &sync_definitions(&pubkeys),
        )
        .await?;

    assert_eq!(mock.sync_committee_contribution_calls(), 0);
    assert!(published.lock().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_sync_contribution_provider_error() -> anyhow::Result<()> {
    let mock = Arc::new(
        BeaconMock::new().with_sync_committee_contribution(|_, _, _| Err(anyhow!("error"))),
    );
    let fetcher = new_fetcher(mock);
    let agg_sig_db = Arc::new(MemAggSigDb::new());
    fetcher.register_agg_sig_db(agg_sig_db.clone())?;

    let pubkeys = random_pubkeys(1);
    store_sync_artifacts(&agg_sig_db, pubkeys[0], 0, 3, random_root(), true)?;

    let err = fetcher
        .fetch(
            &CancellationToken::new(),
            Duty::sync_contribution(SLOT),
            &sync_definitions(&pubkeys),
        )
        .await
        .expect_err("provider failure fails the fetch");

    let message = err.to_string();
    assert!(message.contains("fetch contribution data"));
    assert!(message.contains("error"));
    assert!(!err.is_retryable());
    Ok(())
}

struct FailingAggSigDb;

#[async_trait]
impl AggSigDb for FailingAggSigDb {
    async fn await_signed(
        &self,
        _cancel: &CancellationToken,
        _duty: Duty,
        _pubkey: PubKey,
    ) -> Result<SignedData, AwaitError> {
        Err(AwaitError::Other(anyhow!("error")))
    }
}

#[tokio::test]
async fn test_sync_contribution_aggsigdb_error() -> anyhow::Result<()> {
    let mock = Arc::new(BeaconMock::new());
    let fetcher = new_fetcher(mock.clone());
    fetcher.register_agg_sig_db(Arc::new(FailingAggSigDb))?;
    let published = record(&fetcher);

    let err = fetcher
        .fetch(
            &CancellationToken::new(),
            Duty::sync_contribution(SLOT),
            &sync_definitions(&random_pubkeys(2)),
        )
        .await
        .expect_err("aggsigdb failure fails the fetch");

    let message = err.to_string();
    assert!(message.contains("fetch contribution data"));
    assert!(message.contains("error"));
    assert!(!err.is_retryable());
    assert_eq!(mock.sync_committee_contribution_calls(), 0);
    assert!(published.lock().is_empty());
    Ok(())
}

fn single_definition(duty_type: DutyType, pubkey: PubKey) -> DutyDefinitionSet {
    let definition = match duty_type {
        DutyType::Proposer => ProposerDuty {
            pubkey,
            slot: SLOT,
            validator_index: 0,
        }
        .into(),
        DutyType::Aggregator => {
            let mut duty = attester_duty(pubkey, 0, 1);
            duty.committee_length = AGGREGATOR_COMMITTEE_LENGTH;
            duty.into()
        }
        _ => DutyDefinition::SyncCommittee(SyncCommitteeDuty {
            pubkey,
            validator_index: 0,
            validator_sync_committee_indices: vec![0],
        }),
    };
    [(pubkey, definition)].into_iter().collect()
}

#[rstest]
#[case::proposer_randao(DutyType::Proposer, Duty::randao(SLOT), "randao")]
#[case::aggregator_selection(
    DutyType::Aggregator,
    Duty::prepare_aggregator(SLOT),
    "beacon_committee_selection"
)]
#[case::sync_selection(
    DutyType::SyncContribution,
    Duty::prepare_sync_contribution(SLOT),
    "sync_committee_selection"
)]
#[case::sync_message(DutyType::SyncContribution, Duty::sync_message(SLOT), "sync_message")]
#[tokio::test]
async fn test_unexpected_signed_data(
    #[case] duty_type: DutyType,
    #[case] dependency: Duty,
    #[case] expected_kind: &'static str,
) -> anyhow::Result<()> {
    let fetcher = new_fetcher(Arc::new(BeaconMock::new()));
    let agg_sig_db = Arc::new(MemAggSigDb::new());
    fetcher.register_agg_sig_db(agg_sig_db.clone())?;
    fetcher.register_await_att_data(Arc::new(AttestationDataStore::new()))?;

    let pubkey = random_pubkeys(1)[0];
    if dependency.duty_type == DutyType::SyncMessage {
        agg_sig_db.store(
            Duty::prepare_sync_contribution(SLOT),
            pubkey,
            SyncCommitteeSelection {
                validator_index: 0,
                slot: SLOT,
                subcommittee_index: 0,
                selection_proof: proof_where(true),
            }
            .into(),
        )?;
    }
    agg_sig_db.store(
        dependency,
        pubkey,
        mock_aggregate(SLOT, random_root())?.into(),
    )?;

    let err = fetcher
        .fetch(
            &CancellationToken::new(),
            Duty::new(SLOT, duty_type),
            &single_definition(duty_type, pubkey),
        )
        .await
        .expect_err("wrong signed data fails the fetch");

    match err {
        FetchError::Context { source, .. } => match *source {
            FetchError::UnexpectedSignedData {
                duty,
                expected,
                actual,
                ..
            } => {
                assert_eq!(duty, dependency);
                assert_eq!(expected, expected_kind);
                assert_eq!(actual, "attestation");
            }
            other => panic!("unexpected source {other:?}"),
        },
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_missing_collaborator() {
    let fetcher = new_fetcher(Arc::new(BeaconMock::new()));
    let pubkey = random_pubkeys(1)[0];
    let definitions: DutyDefinitionSet = [(
        pubkey,
        ProposerDuty {
            pubkey,
            slot: SLOT,
            validator_index: 0,
        }
        .into(),
    )]
    .into_iter()
    .collect();

    let err = fetcher
        .fetch(&CancellationToken::new(), Duty::proposer(SLOT), &definitions)
        .await
        .expect_err("unregistered aggsigdb");
    assert!(matches!(
        err,
        FetchError::Context { source, .. } if matches!(*source, FetchError::MissingCollaborator("AggSigDb"))
    ));
}

#[test]
fn test_double_registration() -> anyhow::Result<()> {
    let fetcher = new_fetcher(Arc::new(BeaconMock::new()));
    fetcher.register_agg_sig_db(Arc::new(MemAggSigDb::new()))?;
    fetcher.register_await_att_data(Arc::new(AttestationDataStore::new()))?;

    assert!(matches!(
        fetcher.register_agg_sig_db(Arc::new(MemAggSigDb::new())),
        Err(FetchError::AlreadyRegistered("AggSigDb"))
    ));
    assert!(matches!(
        fetcher.register_await_att_data(Arc::new(AttestationDataStore::new())),
        Err(FetchError::AlreadyRegistered("AwaitAttData"))
    ));
    Ok(())
}

#[tokio::test]
async fn test_empty_definitions_skip_subscribers() -> anyhow::Result<()> {
    let mock = Arc::new(BeaconMock::new());
    let fetcher = new_fetcher(mock.clone());
    let published = record(&fetcher);

    fetcher
        .fetch(
            &CancellationToken::new(),
            Duty::attester(SLOT),
            &DutyDefinitionSet::new(),
        )
        .await?;

    assert_eq!(mock.attestation_data_calls(), 0);
    assert!(published.lock().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unsupported_duty_type() {
    let fetcher = new_fetcher(Arc::new(BeaconMock::new()));
    let pubkey = random_pubkeys(1)[0];
    let definitions: DutyDefinitionSet =
        [(pubkey, attester_duty(pubkey, 0, 0).into())].into_iter().collect();

    let err = fetcher
        .fetch(&CancellationToken::new(), Duty::randao(SLOT), &definitions)
        .await
        .expect_err("randao has no unsigned data");
    assert!(matches!(err, FetchError::UnsupportedDutyType(DutyType::Randao)));
}

#[tokio::test]
async fn test_cancel_while_awaiting_randao() -> anyhow::Result<()> {
    let fetcher = new_fetcher(Arc::new(BeaconMock::new()));
    fetcher.register_agg_sig_db(Arc::new(MemAggSigDb::new()))?;
    let pubkey = random_pubkeys(1)[0];
    let definitions: DutyDefinitionSet = [(
        pubkey,
        ProposerDuty {
            pubkey,
            slot: SLOT,
            validator_index: 0,
        }
        .into(),
    )]
    .into_iter()
    .collect();

    let cancel = CancellationToken::new();
    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel.cancel();
        })
    };

    let result = fetcher
        .fetch(&cancel, Duty::proposer(SLOT), &definitions)
        .await;
    canceller.await?;

    assert!(matches!(result, Err(FetchError::Cancelled)));
    Ok(())
}

#[tokio::test]
async fn test_subscribers_run_in_order_and_stop_on_error() -> anyhow::Result<()> {
    let fetcher = new_fetcher(Arc::new(BeaconMock::new()));
    let calls = Arc::new(Mutex::new(Vec::new()));

    for (name, fail) in [("first", false), ("second", true), ("third", false)] {
        let calls = calls.clone();
        fetcher.subscribe(move |_, _, _| {
            let calls = calls.clone();
            async move {
                calls.lock().push(name);
                if fail {
                    return Err(anyhow!("{name} subscriber failed"));
                }
                Ok(())
            }
        });
    }

    let pubkey = random_pubkeys(1)[0];
    let definitions: DutyDefinitionSet =
        [(pubkey, attester_duty(pubkey, 0, 0).into())].into_iter().collect();
    let err = fetcher
        .fetch(&CancellationToken::new(), Duty::attester(SLOT), &definitions)
        .await
        .expect_err("second subscriber fails");

    assert!(matches!(err, FetchError::Subscriber(_)));
    assert_eq!(err.to_string(), "second subscriber failed");
    assert_eq!(*calls.lock(), vec!["first", "second"]);
    Ok(())
}
