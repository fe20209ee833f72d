//! End to end flows of the message contract client against an in-memory
//! Soroban node.
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde_json::{json, Value};
use soroban_message_client::{
    constants,
    contract_client::ContractUpdateError,
    endpoints::{RPCError, RPCResult},
    message::{MessageContract, SetMessageError},
    rpc::{Client, Transport},
    types::{transactions, ContractAddress, Keypair, Network, SendTransactionStatus},
    xdr::{self, Limits, ReadXdr, WriteXdr},
};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio_test::{assert_err, assert_ok};

const POLL: Duration = Duration::from_millis(250);

/// How the node treats the next submitted transaction.
#[derive(Debug, Clone, Copy)]
enum Outcome {
    /// Accepted, and reported `NOT_FOUND` this many times before `SUCCESS`.
    Succeeds { pending_polls: usize },
    /// Accepted, and reported `NOT_FOUND` this many times before `FAILED`.
    Fails { pending_polls: usize },
    /// Rejected at submission.
    Rejected,
}

#[derive(Debug)]
struct State {
    message:       Vec<u8>,
    sequence:      i64,
    outcome:       Outcome,
    /// The message of the submitted transaction, applied once it succeeds.
    pending:       Option<Vec<u8>>,
    polls:         usize,
    poll_times:    Vec<tokio::time::Instant>,
    submissions:   usize,
    /// Return a value that is not valid XDR from `get_message`.
    garbled_reads: bool,
}

#[derive(Debug)]
struct MockNode {
    contract: ContractAddress,
    state:    Mutex<State>,
}

fn encode(v: &impl WriteXdr) -> String { v.to_xdr_base64(Limits::none()).unwrap() }

fn rpc_error(message: impl Into<String>) -> RPCError {
    RPCError::Rpc {
        code:    RPCError::INVALID_PARAMS,
        message: message.into(),
    }
}

fn transaction_data() -> xdr::SorobanTransactionData {
    xdr::SorobanTransactionData {
        ext:          xdr::ExtensionPoint::V0,
        resources:    xdr::SorobanResources {
            footprint:    xdr::LedgerFootprint {
                read_only:  Default::default(),
                read_write: Default::default(),
            },
            instructions: 2_000_000,
            read_bytes:   1_000,
            write_bytes:  1_000,
        },
        resource_fee: 0,
    }
}

/// The function name and arguments of the single invocation in the envelope.
fn invocation(envelope: &xdr::TransactionEnvelope) -> RPCResult<(xdr::Transaction, String, Vec<xdr::ScVal>)> {
    let xdr::TransactionEnvelope::Tx(env) = envelope else {
        return Err(rpc_error("unsupported envelope"));
    };
    let Some(op) = env.tx.operations.first() else {
        return Err(rpc_error("no operations"));
    };
    let xdr::OperationBody::InvokeHostFunction(invoke) = &op.body else {
        return Err(rpc_error("not an invocation"));
    };
    let xdr::HostFunction::InvokeContract(args) = &invoke.host_function else {
        return Err(rpc_error("not a contract call"));
    };
    let function = String::from_utf8(args.function_name.0.to_vec())
        .map_err(|_| rpc_error("bad function name"))?;
    Ok((env.tx.clone(), function, args.args.to_vec()))
}

fn string_of(args: &[xdr::ScVal]) -> RPCResult<Vec<u8>> {
    match args {
        [xdr::ScVal::String(s)] => Ok(s.0.to_vec()),
        _ => Err(rpc_error("expected one string argument")),
    }
}

impl MockNode {
    fn new(initial: &str, outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            contract: ContractAddress([9u8; 32]),
            state:    Mutex::new(State {
                message: initial.as_bytes().to_vec(),
                sequence: 100,
                outcome,
                pending: None,
                polls: 0,
                poll_times: Vec::new(),
                submissions: 0,
                garbled_reads: false,
            }),
        })
    }

    fn ledger_entries(&self, params: &Value) -> RPCResult<Value> {
        let key = params["keys"][0].as_str().unwrap_or_default();
        let key = xdr::LedgerKey::from_xdr_base64(key, Limits::none())?;
        let state = self.state.lock().unwrap();
        let data = match key {
            xdr::LedgerKey::Account(account) => xdr::LedgerEntryData::Account(xdr::AccountEntry {
                account_id:      account.account_id,
                balance:         10_000 * 10_000_000,
                seq_num:         xdr::SequenceNumber(state.sequence),
                num_sub_entries: 0,
                inflation_dest:  None,
                flags:           0,
                home_domain:     Default::default(),
                thresholds:      xdr::Thresholds([1, 0, 0, 0]),
                signers:         Default::default(),
                ext:             xdr::AccountEntryExt::V0,
            }),
            xdr::LedgerKey::ContractData(data)
                if data.contract == xdr::ScAddress::Contract(xdr::Hash(self.contract.0)) =>
            {
                xdr::LedgerEntryData::ContractData(xdr::ContractDataEntry {
                    ext:        xdr::ExtensionPoint::V0,
                    contract:   data.contract,
                    key:        data.key,
                    durability: data.durability,
                    val:        xdr::ScVal::Void,
                })
            }
            _ => return Ok(json!({"entries": [], "latestLedger": 50})),
        };
        Ok(json!({
            "entries": [{"key": params["keys"][0], "xdr": encode(&data), "lastModifiedLedgerSeq": 40}],
            "latestLedger": 50,
        }))
    }

    fn simulate(&self, params: &Value) -> RPCResult<Value> {
        let envelope = xdr::TransactionEnvelope::from_xdr_base64(
            params["transaction"].as_str().unwrap_or_default(),
            Limits::none(),
        )?;
        let (_, function, args) = invocation(&envelope)?;
        let state = self.state.lock().unwrap();
        match function.as_str() {
            "get_message" if state.garbled_reads => Ok(json!({
                "latestLedger": 50,
                "results": [{"auth": [], "xdr": "AAAA"}],
            })),
            "get_message" => {
                let value = xdr::ScVal::String(xdr::ScString(state.message.clone().try_into()?));
                Ok(json!({
                    "latestLedger": 50,
                    "minResourceFee": "5000",
                    "transactionData": encode(&transaction_data()),
                    "results": [{"auth": [], "xdr": encode(&value)}],
                }))
            }
            "set_message" => {
                string_of(&args)?;
                Ok(json!({
                    "latestLedger": 50,
                    "minResourceFee": "90000",
                    "transactionData": encode(&transaction_data()),
                    "results": [{"auth": [], "xdr": encode(&xdr::ScVal::Void)}],
                }))
            }
            other => Ok(json!({
                "latestLedger": 50,
                "error": format!("HostError: no function {other}"),
            })),
        }
    }

    fn send(&self, params: &Value) -> RPCResult<Value> {
        let envelope = xdr::TransactionEnvelope::from_xdr_base64(
            params["transaction"].as_str().unwrap_or_default(),
            Limits::none(),
        )?;
        let (tx, function, args) = invocation(&envelope)?;
        let hash = transactions::transaction_hash(&tx, &Network::Testnet)
            .map_err(|e| rpc_error(e.to_string()))?;

        // Check the signature the way the network would.
        let xdr::TransactionEnvelope::Tx(env) = &envelope else {
            return Err(rpc_error("unsupported envelope"));
        };
        let xdr::MuxedAccount::Ed25519(source) = &tx.source_account else {
            return Err(rpc_error("muxed source"));
        };
        let key = VerifyingKey::from_bytes(&source.0).map_err(|_| rpc_error("bad key"))?;
        let signed = env.signatures.iter().any(|sig| {
            <[u8; 64]>::try_from(sig.signature.0.to_vec())
                .map(|bytes| key.verify(hash.as_bytes(), &Signature::from_bytes(&bytes)).is_ok())
                .unwrap_or(false)
        });

        let mut state = self.state.lock().unwrap();
        state.submissions += 1;
        let bad_seq = tx.seq_num.0 != state.sequence + 1;
        if !signed || bad_seq || matches!(state.outcome, Outcome::Rejected) || function != "set_message" {
            let result = xdr::TransactionResult {
                fee_charged: 100,
                result:      if bad_seq {
                    xdr::TransactionResultResult::TxBadSeq
                } else {
                    xdr::TransactionResultResult::TxBadAuth
                },
                ext:         xdr::TransactionResultExt::V0,
            };
            return Ok(json!({
                "status": "ERROR",
                "hash": hash.to_string(),
                "latestLedger": 50,
                "latestLedgerCloseTime": "1700000000",
                "errorResultXdr": encode(&result),
            }));
        }
        state.sequence += 1;
        state.pending = Some(string_of(&args)?);
        state.polls = 0;
        Ok(json!({
            "status": "PENDING",
            "hash": hash.to_string(),
            "latestLedger": 50,
            "latestLedgerCloseTime": "1700000000",
        }))
    }

    fn get_transaction(&self) -> RPCResult<Value> {
        let mut state = self.state.lock().unwrap();
        state.poll_times.push(tokio::time::Instant::now());
        state.polls += 1;
        let (pending_polls, succeeds) = match state.outcome {
            Outcome::Succeeds { pending_polls } => (pending_polls, true),
            Outcome::Fails { pending_polls } => (pending_polls, false),
            Outcome::Rejected => return Ok(json!({"status": "NOT_FOUND", "latestLedger": 51})),
        };
        if state.polls <= pending_polls {
            return Ok(json!({"status": "NOT_FOUND", "latestLedger": 51}));
        }
        if succeeds {
            if let Some(message) = state.pending.take() {
                state.message = message;
            }
            let result = xdr::TransactionResult {
                fee_charged: 90_100,
                result:      xdr::TransactionResultResult::TxSuccess(Default::default()),
                ext:         xdr::TransactionResultExt::V0,
            };
            Ok(json!({
                "status": "SUCCESS",
                "latestLedger": 52,
                "ledger": 52,
                "createdAt": "1700000005",
                "resultXdr": encode(&result),
            }))
        } else {
            state.pending = None;
            let result = xdr::TransactionResult {
                fee_charged: 90_100,
                result:      xdr::TransactionResultResult::TxFailed(Default::default()),
                ext:         xdr::TransactionResultExt::V0,
            };
            Ok(json!({
                "status": "FAILED",
                "latestLedger": 52,
                "ledger": 52,
                "createdAt": "1700000005",
                "resultXdr": encode(&result),
            }))
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockNode {
    async fn call(&self, method: &str, params: Value) -> RPCResult<Value> {
        match method {
            "getNetwork" => Ok(json!({
                "friendbotUrl": "https://friendbot.example/",
                "passphrase": constants::TESTNET_NETWORK_PASSPHRASE,
                "protocolVersion": 22,
            })),
            "getLedgerEntries" => self.ledger_entries(&params),
            "simulateTransaction" => self.simulate(&params),
            "sendTransaction" => self.send(&params),
            "getTransaction" => self.get_transaction(),
            other => Err(RPCError::Rpc {
                code:    -32601,
                message: format!("method {other} not found"),
            }),
        }
    }

    async fn http_get(&self, _url: &str) -> RPCResult<Value> { Ok(json!({"successful": true})) }
}

async fn setup(node: &Arc<MockNode>) -> anyhow::Result<MessageContract> {
    let client = Client::from_transport(node.clone()).with_poll_interval(POLL);
    Ok(MessageContract::create(client, node.contract, Network::Testnet).await?)
}

#[tokio::test(start_paused = true)]
async fn read_write_read() -> anyhow::Result<()> {
    let node = MockNode::new("Hello", Outcome::Succeeds { pending_polls: 2 });
    let contract = setup(&node).await?;
    let keys = Keypair::from_seed(&[11u8; 32]);

    let before = contract.get_message(keys.address()).await?;
    assert_eq!(before.as_deref(), Some("Hello"));

    let info = contract
        .set_message_and_wait(&keys, "Hola desde Rust 🦀", constants::BASE_FEE, None)
        .await?;
    assert_eq!(info.ledger, Some(52));
    assert_eq!(info.fee_charged.map(|f| f.stroops), Some(90_100));

    let after = contract.get_message(keys.address()).await?;
    assert_eq!(after.as_deref(), Some("Hola desde Rust 🦀"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn polling_waits_between_queries() -> anyhow::Result<()> {
    let node = MockNode::new("Hello", Outcome::Succeeds { pending_polls: 3 });
    let contract = setup(&node).await?;
    let keys = Keypair::from_seed(&[11u8; 32]);

    let handle = contract.set_message(&keys, "tick", 100).await?;
    let sent_at = tokio::time::Instant::now();
    assert_ok!(handle.wait_for_finalization().await);

    let state = node.state.lock().unwrap();
    assert_eq!(state.poll_times.len(), 4);
    let mut previous = sent_at;
    for at in &state.poll_times {
        assert!(*at - previous >= POLL);
        previous = *at;
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_transaction_is_not_success() -> anyhow::Result<()> {
    let node = MockNode::new("Hello", Outcome::Fails { pending_polls: 1 });
    let contract = setup(&node).await?;
    let keys = Keypair::from_seed(&[11u8; 32]);

    let result = contract
        .set_message_and_wait(&keys, "never stored", 100, None)
        .await;
    match assert_err!(result) {
        SetMessageError::Update(ContractUpdateError::Failed { detail }) => {
            assert!(detail.unwrap_or_default().contains("TxFailed"));
        }
        other => panic!("Expected an on-chain failure, got {other:?}"),
    }
    let message = contract.get_message(keys.address()).await?;
    assert_eq!(message.as_deref(), Some("Hello"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn rejection_carries_detail() -> anyhow::Result<()> {
    let node = MockNode::new("Hello", Outcome::Rejected);
    let contract = setup(&node).await?;
    let keys = Keypair::from_seed(&[11u8; 32]);

    let result = contract.set_message(&keys, "rejected", 100).await;
    match assert_err!(result) {
        SetMessageError::Update(ContractUpdateError::Rejected { status, detail }) => {
            assert_eq!(status, SendTransactionStatus::Error);
            assert!(detail.unwrap_or_default().contains("TxBadAuth"));
        }
        other => panic!("Expected a rejection, got {other:?}"),
    }
    assert!(node.state.lock().unwrap().poll_times.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn stale_sequence_number_is_rejected() -> anyhow::Result<()> {
    let node = MockNode::new("Hello", Outcome::Succeeds { pending_polls: 0 });
    let contract = setup(&node).await?;
    let keys = Keypair::from_seed(&[11u8; 32]);

    let builder = contract.dry_run_set_message(keys.address(), "stale").await?;
    let result = builder
        .sequence_number(soroban_message_client::types::SequenceNumber { number: 7 })
        .send(&keys)
        .await;
    match assert_err!(result) {
        ContractUpdateError::Rejected { detail, .. } => {
            assert!(detail.unwrap_or_default().contains("TxBadSeq"));
        }
        other => panic!("Expected a rejection, got {other:?}"),
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn wait_can_time_out() -> anyhow::Result<()> {
    let node = MockNode::new("Hello", Outcome::Succeeds { pending_polls: 1_000 });
    let contract = setup(&node).await?;
    let keys = Keypair::from_seed(&[11u8; 32]);

    let result = contract
        .set_message_and_wait(&keys, "slow", 100, Some(Duration::from_secs(2)))
        .await;
    assert!(matches!(
        result,
        Err(SetMessageError::Update(ContractUpdateError::DeadlineExceeded))
    ));
    Ok(())
}

#[tokio::test]
async fn undecodable_message_is_absent() -> anyhow::Result<()> {
    let node = MockNode::new("Hello", Outcome::Succeeds { pending_polls: 0 });
    node.state.lock().unwrap().garbled_reads = true;
    let contract = setup(&node).await?;
    let message = contract
        .get_message(Keypair::from_seed(&[11u8; 32]).address())
        .await?;
    assert_eq!(message, None);
    Ok(())
}

#[tokio::test]
async fn missing_contract_is_not_found() {
    let node = MockNode::new("Hello", Outcome::Succeeds { pending_polls: 0 });
    let client = Client::from_transport(node);
    let err = MessageContract::create(client, ContractAddress([1u8; 32]), Network::Testnet)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
