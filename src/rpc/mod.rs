//! A client for the Soroban JSON-RPC API.
//!
//! The main entrypoint is [`Client`]. All queries return typed responses from
//! [`types::queries`](crate::types::queries), and failures are reported via
//! [`RPCError`] and [`QueryError`].
mod transport;

pub use transport::{HttpTransport, Transport};

use crate::{
    constants,
    endpoints::{QueryError, QueryResult, RPCError, RPCResult},
    types::{
        queries::*,
        smart_contracts::InvokeContractResult,
        transactions::{self, PreparedTransaction, TransactionError},
        AccountAddress, AccountInfo, Amount, ContractAddress, Network, SequenceNumber,
        TransactionHash, TransactionStatus,
    },
    xdr::{self, Limits, ReadXdr, WriteXdr},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{sync::Arc, time::Duration};

const LOG_TARGET: &str = "soroban_message_client";

/// Client that can perform queries and submit transactions.
///
/// Cloning is cheap and reuses the underlying connection, and is the
/// intended way of sharing a client between tasks.
#[derive(Clone, Debug)]
pub struct Client {
    transport:     Arc<dyn Transport>,
    poll_interval: Duration,
}

/// Version of the RPC server, see [`Client::get_version_info`].
#[derive(Debug, Clone)]
pub struct VersionInfo {
    pub version:          semver::Version,
    pub commit_hash:      String,
    pub protocol_version: u32,
}

#[derive(Debug, thiserror::Error)]
/// Errors that can occur when preparing a transaction for submission.
pub enum PrepareError {
    #[error("Simulation failed: {0}")]
    Simulation(String),
    #[error("Archived ledger entries must be restored before the transaction can be submitted.")]
    RestoreRequired,
    #[error("Simulation did not report the resources the transaction needs.")]
    MissingResources,
    #[error("Could not assemble the transaction: {0}")]
    Transaction(#[from] TransactionError),
    #[error("Network error: {0}")]
    Network(#[from] RPCError),
}

impl Client {
    /// Connect to the RPC server at the given URL.
    ///
    /// ```no_run
    /// # async fn f() -> anyhow::Result<()> {
    /// use soroban_message_client::rpc::Client;
    /// let client = Client::new("https://soroban-testnet.stellar.org")?;
    /// println!("{:?}", client.get_health().await?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(endpoint: &str) -> RPCResult<Self> {
        Ok(Self::from_transport(Arc::new(HttpTransport::new(endpoint)?)))
    }

    pub fn from_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            poll_interval: constants::DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the interval between status queries in
    /// [`wait_until_finalized`](Self::wait_until_finalized). The interval is
    /// at least one millisecond.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn poll_interval(&self) -> Duration { self.poll_interval }

    async fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> RPCResult<R> {
        let params = serde_json::to_value(params)?;
        let result = self.transport.call(method, params).await?;
        Ok(serde_json::from_value(result)?)
    }

    pub async fn get_health(&self) -> RPCResult<HealthResponse> {
        self.request("getHealth", &serde_json::Value::Null).await
    }

    /// Get the passphrase and protocol version of the network the server is
    /// connected to.
    pub async fn get_network(&self) -> RPCResult<NetworkResponse> {
        self.request("getNetwork", &serde_json::Value::Null).await
    }

    /// Check that the server is connected to `expected`. Signatures commit
    /// to the network passphrase, so transactions signed for another network
    /// would be rejected.
    pub async fn check_network(&self, expected: &Network) -> QueryResult<NetworkResponse> {
        let network = self.get_network().await?;
        if network.passphrase != expected.passphrase() {
            return Err(QueryError::NetworkMismatch {
                expected: expected.passphrase().to_owned(),
                actual:   network.passphrase,
            });
        }
        Ok(network)
    }

    pub async fn get_latest_ledger(&self) -> RPCResult<LatestLedgerResponse> {
        self.request("getLatestLedger", &serde_json::Value::Null)
            .await
    }

    /// Get the version of the RPC server.
    pub async fn get_version_info(&self) -> RPCResult<VersionInfo> {
        let response: VersionInfoResponse = self
            .request("getVersionInfo", &serde_json::Value::Null)
            .await?;
        let version = semver::Version::parse(response.version.trim_start_matches('v'))?;
        Ok(VersionInfo {
            version,
            commit_hash: response.commit_hash,
            protocol_version: response.protocol_version,
        })
    }

    pub async fn get_ledger_entries(
        &self,
        keys: &[xdr::LedgerKey],
    ) -> RPCResult<GetLedgerEntriesResponse> {
        let keys = keys
            .iter()
            .map(|k| k.to_xdr_base64(Limits::none()))
            .collect::<Result<Vec<_>, _>>()?;
        self.request("getLedgerEntries", &GetLedgerEntriesRequest { keys })
            .await
    }

    async fn get_ledger_entry(&self, key: &xdr::LedgerKey) -> QueryResult<xdr::LedgerEntryData> {
        let response = self.get_ledger_entries(std::slice::from_ref(key)).await?;
        let entry = response
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or(QueryError::NotFound)?;
        Ok(xdr::LedgerEntryData::from_xdr_base64(
            &entry.xdr,
            Limits::none(),
        )?)
    }

    /// Get the current sequence number and balance of an account.
    /// If the account does not exist the result is [`QueryError::NotFound`].
    pub async fn get_account(&self, address: &AccountAddress) -> QueryResult<AccountInfo> {
        let key = xdr::LedgerKey::Account(xdr::LedgerKeyAccount {
            account_id: address.xdr_account_id(),
        });
        match self.get_ledger_entry(&key).await? {
            xdr::LedgerEntryData::Account(account) => Ok(AccountInfo {
                address:         *address,
                sequence_number: SequenceNumber {
                    number: account.seq_num.0,
                },
                balance:         Amount::from_stroops(account.balance),
            }),
            _ => Err(RPCError::ParseError(anyhow::anyhow!(
                "Expected an account entry for {address}."
            ))
            .into()),
        }
    }

    /// Look up the instance entry of a deployed contract. If there is no
    /// contract at the address the result is [`QueryError::NotFound`].
    pub async fn get_contract_instance(
        &self,
        contract: &ContractAddress,
    ) -> QueryResult<xdr::ContractDataEntry> {
        let key = xdr::LedgerKey::ContractData(xdr::LedgerKeyContractData {
            contract:   contract.xdr_address(),
            key:        xdr::ScVal::LedgerKeyContractInstance,
            durability: xdr::ContractDataDurability::Persistent,
        });
        match self.get_ledger_entry(&key).await? {
            xdr::LedgerEntryData::ContractData(data) => Ok(data),
            _ => Err(RPCError::ParseError(anyhow::anyhow!(
                "Expected a contract data entry for {contract}."
            ))
            .into()),
        }
    }

    /// Simulate the transaction in the envelope. Nothing is submitted and no
    /// fee is charged.
    pub async fn simulate_transaction(
        &self,
        envelope: &xdr::TransactionEnvelope,
    ) -> RPCResult<SimulateTransactionResponse> {
        let transaction = transactions::encode_envelope(envelope)?;
        self.request("simulateTransaction", &TransactionRequest { transaction })
            .await
    }

    /// Simulate a contract invocation and interpret the result.
    pub async fn invoke_contract(&self, tx: &xdr::Transaction) -> RPCResult<InvokeContractResult> {
        let response = self
            .simulate_transaction(&transactions::unsigned_envelope(tx.clone()))
            .await?;
        InvokeContractResult::try_from(response)
    }

    /// Simulate the transaction and apply the result, so that the
    /// transaction carries the footprint, authorizations, and fee it needs to
    /// be accepted.
    pub async fn prepare_transaction(
        &self,
        tx: xdr::Transaction,
    ) -> Result<PreparedTransaction, PrepareError> {
        match self.invoke_contract(&tx).await? {
            InvokeContractResult::Failure { error, .. } => Err(PrepareError::Simulation(error)),
            InvokeContractResult::Success {
                restore_required: true,
                ..
            } => Err(PrepareError::RestoreRequired),
            InvokeContractResult::Success { data: None, .. } => Err(PrepareError::MissingResources),
            InvokeContractResult::Success {
                return_value,
                data: Some(simulation),
                ..
            } => {
                let transaction = transactions::assemble(tx, &simulation)?;
                Ok(PreparedTransaction {
                    transaction,
                    simulation,
                    return_value,
                })
            }
        }
    }

    /// Submit a signed transaction. Acceptance into the queue is reported in
    /// the `status` of the response, use
    /// [`wait_until_finalized`](Self::wait_until_finalized) to learn the
    /// outcome.
    pub async fn send_transaction(
        &self,
        envelope: &xdr::TransactionEnvelope,
    ) -> RPCResult<SendTransactionResponse> {
        let transaction = transactions::encode_envelope(envelope)?;
        self.request("sendTransaction", &TransactionRequest { transaction })
            .await
    }

    pub async fn get_transaction(&self, hash: &TransactionHash) -> RPCResult<GetTransactionResponse> {
        self.request("getTransaction", &GetTransactionRequest { hash: *hash })
            .await
    }

    /// Wait until the transaction reaches a terminal status, `SUCCESS` or
    /// `FAILED`, and return the response reporting it. The status is queried
    /// once per poll interval. An error from a query is returned immediately.
    ///
    /// Note that this can potentially wait indefinitely.
    pub async fn wait_until_finalized(
        &self,
        hash: &TransactionHash,
    ) -> QueryResult<GetTransactionResponse> {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let response = self.get_transaction(hash).await?;
            match response.status {
                TransactionStatus::NotFound => {
                    tracing::debug!(target: LOG_TARGET, %hash, latest_ledger = response.latest_ledger, "Transaction not yet in a ledger.");
                }
                TransactionStatus::Success | TransactionStatus::Failed => {
                    tracing::info!(target: LOG_TARGET, %hash, status = ?response.status, ledger = ?response.ledger, "Transaction finalized.");
                    return Ok(response);
                }
            }
        }
    }

    /// Fund an account on a test network using the friendbot faucet the
    /// server advertises, and return the state of the account afterwards.
    ///
    /// Networks without a faucet result in [`QueryError::NotFound`]. If the
    /// faucet refuses but the account exists already, e.g., because it was
    /// funded before, the existing account is returned.
    pub async fn request_airdrop(&self, address: &AccountAddress) -> QueryResult<AccountInfo> {
        let network = self.get_network().await?;
        let Some(friendbot) = network.friendbot_url else {
            return Err(QueryError::NotFound);
        };
        let mut url =
            reqwest::Url::parse(&friendbot).map_err(|e| RPCError::ParseError(e.into()))?;
        url.query_pairs_mut()
            .append_pair("addr", &address.to_string());
        if let Err(e) = self.transport.http_get(url.as_str()).await {
            return match self.get_account(address).await {
                Ok(account) => {
                    tracing::warn!(target: LOG_TARGET, %address, "Friendbot refused ({e}), account exists already.");
                    Ok(account)
                }
                Err(_) => Err(e.into()),
            };
        }
        tracing::info!(target: LOG_TARGET, %address, "Account funded by friendbot.");
        self.get_account(address).await
    }
}
