//! This module contains a generic client that provides conveniences for
//! interacting with any deployed smart contract instance.
//!
//! The key types in this module are
//! [`ContractClient`],
//! [`ContractUpdateBuilder`]
//! and [`ContractUpdateHandle`].
use crate::{
    constants,
    endpoints::{QueryError, RPCError},
    rpc::{Client, PrepareError},
    types::{
        queries::describe_result,
        smart_contracts::{ContractContext, InvokeContractResult, SimulationData},
        transactions::{self, TransactionError},
        AccountAddress, Amount, ContractAddress, Keypair, Network, SendTransactionStatus,
        SequenceNumber, TransactionHash, TransactionStatus, TransactionTime,
    },
    xdr,
};
use std::marker::PhantomData;

const LOG_TARGET: &str = "soroban_message_client";

/// A contract client that handles some of the boilerplate such as building,
/// simulating, and signing transactions when invoking smart contracts.
///
/// The `Type` parameter is a marker that allows specialized clients to add
/// typed methods, see [`MessageContract`](crate::message::MessageContract).
///
/// Note that cloning is cheap and is, therefore, the intended way of sharing
/// values of this type between multiple tasks.
#[derive(Debug)]
pub struct ContractClient<Type> {
    /// The underlying network client.
    pub client:  Client,
    /// The address of the instance.
    pub address: ContractAddress,
    /// The network transactions are signed for.
    pub network: Network,
    phantom:     PhantomData<Type>,
}

impl<Type> Clone for ContractClient<Type> {
    fn clone(&self) -> Self {
        Self {
            client:  self.client.clone(),
            address: self.address,
            network: self.network.clone(),
            phantom: PhantomData,
        }
    }
}

#[derive(Debug, thiserror::Error)]
/// An error that can be used as the error for the
/// [`view`](ContractClient::view_raw) family of functions.
pub enum ViewError {
    #[error("Invalid invocation: {0}")]
    InvalidInvocation(#[from] TransactionError),
    #[error("Simulation rejected the invocation: {0}")]
    QueryFailed(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] QueryError),
}

impl From<RPCError> for ViewError {
    fn from(value: RPCError) -> Self { Self::NetworkError(value.into()) }
}

#[derive(thiserror::Error, Debug)]
/// An error that may occur when attempting to dry run an update.
pub enum DryRunUpdateError {
    #[error("Invalid invocation: {0}")]
    InvalidInvocation(#[from] TransactionError),
    #[error("Dry run failed: {0}")]
    Prepare(#[from] PrepareError),
    #[error("Node query error: {0}")]
    Query(#[from] QueryError),
}

#[derive(Debug, thiserror::Error)]
/// An error that may occur when sending a smart contract update transaction,
/// or when querying its result.
pub enum ContractUpdateError {
    #[error("The status of the transaction could not be ascertained: {0}")]
    Query(#[from] QueryError),
    #[error("Could not construct the transaction: {0}")]
    Transaction(#[from] TransactionError),
    #[error("The transaction was prepared for {expected}, but the signer is {actual}.")]
    SignerMismatch {
        expected: AccountAddress,
        actual:   AccountAddress,
    },
    #[error("Submission rejected with status {status}: {}", .detail.as_deref().unwrap_or("no details"))]
    Rejected {
        status: SendTransactionStatus,
        /// The reason reported by the server, if any.
        detail: Option<String>,
    },
    #[error("Contract update failed: {}", .detail.as_deref().unwrap_or("no details"))]
    Failed {
        /// The transaction result, if it could be decoded.
        detail: Option<String>,
    },
    #[error("Deadline waiting for result of transaction is exceeded.")]
    DeadlineExceeded,
}

impl From<RPCError> for ContractUpdateError {
    fn from(value: RPCError) -> Self { Self::Query(value.into()) }
}

impl<Type> ContractClient<Type> {
    /// Construct a [`ContractClient`] by first checking that there is a
    /// contract instance at the address.
    ///
    /// # Arguments
    ///
    /// * `client` - The RPC client.
    /// * `address` - The address of the contract instance.
    /// * `network` - The network the client is connected to.
    pub async fn create(
        client: Client,
        address: ContractAddress,
        network: Network,
    ) -> Result<Self, QueryError> {
        client.get_contract_instance(&address).await?;
        Ok(Self::new(client, address, network))
    }

    /// Construct a [`ContractClient`] locally. In comparison to
    /// [`create`](Self::create) this always succeeds and does not check
    /// existence of the contract.
    pub fn new(client: Client, address: ContractAddress, network: Network) -> Self {
        Self {
            client,
            address,
            network,
            phantom: PhantomData,
        }
    }

    fn context(&self, function: &str, args: Vec<xdr::ScVal>) -> ContractContext {
        ContractContext::new(self.address, function).with_args(args)
    }

    /// Simulate an invocation and return the response without any processing.
    ///
    /// The `invoker` is the source account of the simulated transaction. It
    /// is not charged anything.
    pub async fn invoke_raw(
        &self,
        function: &str,
        args: Vec<xdr::ScVal>,
        invoker: AccountAddress,
    ) -> Result<InvokeContractResult, ViewError> {
        let tx = transactions::make_invoke_transaction(
            invoker,
            SequenceNumber { number: 1 },
            constants::BASE_FEE,
            TransactionTime::never(),
            &self.context(function, args),
        )?;
        Ok(self.client.invoke_contract(&tx).await?)
    }

    /// Invoke a read-only function and return the value it returned. Nothing
    /// is submitted to the network.
    ///
    /// The result is `None` if the simulation did not report a return value
    /// or the value could not be decoded.
    pub async fn view_raw(
        &self,
        function: &str,
        args: Vec<xdr::ScVal>,
        invoker: AccountAddress,
    ) -> Result<Option<xdr::ScVal>, ViewError> {
        match self.invoke_raw(function, args, invoker).await? {
            InvokeContractResult::Success { return_value, .. } => Ok(return_value),
            InvokeContractResult::Failure { error, .. } => Err(ViewError::QueryFailed(error)),
        }
    }

    /// Dry run an update. If the dry run succeeds the return value is an object
    /// that has a send method to send the transaction that was simulated during
    /// the dry run.
    ///
    /// The arguments are
    /// - `function` the name of the contract function to be invoked
    /// - `args` the arguments to the function
    /// - `sender` the account that will be sending the transaction.
    pub async fn dry_run_update_raw(
        &self,
        function: &str,
        args: Vec<xdr::ScVal>,
        sender: AccountAddress,
    ) -> Result<ContractUpdateBuilder, DryRunUpdateError> {
        let context = self.context(function, args);
        let account = self.client.get_account(&sender).await?;
        let tx = transactions::make_invoke_transaction(
            sender,
            account.sequence_number.next()?,
            constants::BASE_FEE,
            TransactionTime::never(),
            &context,
        )?;
        let prepared = self.client.prepare_transaction(tx).await?;
        tracing::debug!(
            target: LOG_TARGET,
            contract = %self.address,
            function,
            min_resource_fee = prepared.simulation.min_resource_fee,
            "Dry run succeeded."
        );
        Ok(ContractUpdateBuilder {
            client: self.client.clone(),
            network: self.network.clone(),
            sender,
            context,
            simulation: prepared.simulation,
            return_value: prepared.return_value,
            expiry: None,
            sequence_number: None,
            base_fee: constants::BASE_FEE,
        })
    }
}

/// A builder to simplify sending smart contract updates. It is constructed by
/// [`dry_run_update_raw`](ContractClient::dry_run_update_raw) and the
/// transaction is intended to be sent using the
/// [`send`](ContractUpdateBuilder::send) method.
#[derive(Debug)]
pub struct ContractUpdateBuilder {
    client:          Client,
    network:         Network,
    sender:          AccountAddress,
    context:         ContractContext,
    simulation:      SimulationData,
    return_value:    Option<xdr::ScVal>,
    expiry:          Option<TransactionTime>,
    sequence_number: Option<SequenceNumber>,
    base_fee:        u32,
}

impl ContractUpdateBuilder {
    /// Set the expiry time for the transaction. If not set the default is
    /// five minutes from the time the transaction is signed.
    pub fn expiry(mut self, expiry: TransactionTime) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Set the sequence number for the transaction. If not set the default
    /// behaviour is to get the sequence number of the sender from the
    /// connected [`Client`] at the time the transaction is sent.
    pub fn sequence_number(mut self, sequence_number: SequenceNumber) -> Self {
        self.sequence_number = Some(sequence_number);
        self
    }

    /// Set the inclusion fee, in stroops. The resource fee determined by the
    /// dry run is added to this.
    pub fn base_fee(mut self, base_fee: u32) -> Self {
        self.base_fee = base_fee;
        self
    }

    /// The fee the transaction will offer if sent with the current parameters.
    pub fn current_fee(&self) -> Amount {
        Amount::from_stroops(i64::from(self.base_fee) + self.simulation.min_resource_fee)
    }

    /// Get the return value from dry-running.
    pub fn return_value(&self) -> Option<&xdr::ScVal> { self.return_value.as_ref() }

    /// Send the transaction and return a handle that can be queried
    /// for the status.
    pub async fn send(self, signer: &Keypair) -> Result<ContractUpdateHandle, ContractUpdateError> {
        if signer.address() != self.sender {
            return Err(ContractUpdateError::SignerMismatch {
                expected: self.sender,
                actual:   signer.address(),
            });
        }
        let sequence_number = match self.sequence_number {
            Some(sequence_number) => sequence_number,
            None => {
                self.client
                    .get_account(&self.sender)
                    .await?
                    .sequence_number
                    .next()?
            }
        };
        let expiry = self.expiry.unwrap_or_else(|| {
            TransactionTime::seconds_after(constants::DEFAULT_TRANSACTION_TIMEOUT_SECS)
        });
        let tx = transactions::make_invoke_transaction(
            self.sender,
            sequence_number,
            self.base_fee,
            expiry,
            &self.context,
        )?;
        let tx = transactions::assemble(tx, &self.simulation)?;
        let fee = tx.fee;
        let signed = transactions::sign_transaction(signer, tx, &self.network)?;
        let response = self.client.send_transaction(&signed.envelope).await?;
        tracing::info!(
            target: LOG_TARGET,
            hash = %signed.hash,
            sequence = %sequence_number,
            fee,
            status = %response.status,
            "Transaction submitted."
        );
        match response.status {
            SendTransactionStatus::Pending => {}
            SendTransactionStatus::Duplicate => {
                tracing::warn!(target: LOG_TARGET, hash = %signed.hash, "Transaction was submitted before.");
            }
            SendTransactionStatus::TryAgainLater | SendTransactionStatus::Error => {
                let detail = response
                    .error_result()
                    .map(|r| describe_result(&r))
                    .or(response.error_result_xdr);
                return Err(ContractUpdateError::Rejected {
                    status: response.status,
                    detail,
                });
            }
        }
        Ok(ContractUpdateHandle {
            tx_hash: signed.hash,
            client:  self.client,
        })
    }

    /// Send the transaction and wait for the outcome. With a `timeout` the
    /// wait is bounded, otherwise it can potentially last indefinitely.
    pub async fn send_and_wait(
        self,
        signer: &Keypair,
        timeout: Option<std::time::Duration>,
    ) -> Result<ContractUpdateInfo, ContractUpdateError> {
        let handle = self.send(signer).await?;
        match timeout {
            Some(timeout) => handle.wait_for_finalization_timeout(timeout).await,
            None => handle.wait_for_finalization().await,
        }
    }
}

/// A handle returned when sending a smart contract update transaction.
/// This can be used to get the response of the update.
#[derive(Debug)]
pub struct ContractUpdateHandle {
    tx_hash: TransactionHash,
    client:  Client,
}

/// The [`Display`](std::fmt::Display) implementation displays the hash of the
/// transaction.
impl std::fmt::Display for ContractUpdateHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.tx_hash.fmt(f) }
}

#[derive(Debug, Clone)]
/// Result of a successful contract update.
pub struct ContractUpdateInfo {
    pub transaction_hash: TransactionHash,
    /// The ledger that included the transaction.
    pub ledger:           Option<u32>,
    pub created_at:       Option<chrono::DateTime<chrono::Utc>>,
    pub fee_charged:      Option<Amount>,
    /// The value the contract function returned, if the server reported it.
    pub return_value:     Option<xdr::ScVal>,
}

impl ContractUpdateHandle {
    /// Extract the hash of the transaction underlying this handle.
    pub fn hash(&self) -> TransactionHash { self.tx_hash }

    /// Wait until the transaction is finalized and return the result. Only a
    /// transaction the network reports as `SUCCESS` yields `Ok`.
    ///
    /// Note that this can potentially wait indefinitely.
    pub async fn wait_for_finalization(self) -> Result<ContractUpdateInfo, ContractUpdateError> {
        let response = self.client.wait_until_finalized(&self.tx_hash).await?;
        match response.status {
            TransactionStatus::Success => Ok(ContractUpdateInfo {
                transaction_hash: self.tx_hash,
                ledger:           response.ledger,
                created_at:       response.created_at_time(),
                fee_charged:      response.fee_charged(),
                return_value:     response.return_value(),
            }),
            TransactionStatus::Failed => {
                let detail = response
                    .result()
                    .map(|r| describe_result(&r))
                    .or(response.result_xdr);
                tracing::warn!(target: LOG_TARGET, hash = %self.tx_hash, ?detail, "Transaction failed.");
                Err(ContractUpdateError::Failed { detail })
            }
            TransactionStatus::NotFound => Err(RPCError::ParseError(anyhow::anyhow!(
                "Expected a terminal status for {}.",
                self.tx_hash
            ))
            .into()),
        }
    }

    /// Wait until the transaction is finalized or until the timeout has elapsed
    /// and return the result.
    pub async fn wait_for_finalization_timeout(
        self,
        timeout: std::time::Duration,
    ) -> Result<ContractUpdateInfo, ContractUpdateError> {
        let result = tokio::time::timeout(timeout, self.wait_for_finalization()).await;
        match result {
            Ok(r) => r,
            Err(_elapsed) => Err(ContractUpdateError::DeadlineExceeded),
        }
    }
}
