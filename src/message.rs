//! A typed client for the message contract. The contract stores a single
//! string, exposed through two functions
//! - `get_message`, which takes no arguments and returns the stored string,
//! - `set_message`, which takes the new string and returns nothing.
use crate::{
    contract_client::{
        ContractClient, ContractUpdateBuilder, ContractUpdateError, ContractUpdateHandle,
        ContractUpdateInfo, DryRunUpdateError, ViewError,
    },
    types::{
        smart_contracts::{decode_string, string_arg},
        transactions::TransactionError,
        AccountAddress, Keypair,
    },
};
use std::time::Duration;

/// Name of the function that reads the message.
pub const GET_MESSAGE: &str = "get_message";
/// Name of the function that replaces the message.
pub const SET_MESSAGE: &str = "set_message";

#[derive(Debug, Clone, Copy)]
/// A marker type to indicate that a [`ContractClient`] is a client for the
/// message contract.
pub enum MessageType {}

/// A wrapper around the [`ContractClient`] for the message contract.
///
/// ```no_run
/// # async fn f(signer: soroban_message_client::types::Keypair) -> anyhow::Result<()> {
/// use soroban_message_client::{message::MessageContract, rpc::Client, types::Network};
/// let client = Client::new("https://soroban-testnet.stellar.org")?;
/// let address = std::env::var("CONTRACT_ID")?.parse()?;
/// let contract = MessageContract::create(client, address, Network::Testnet).await?;
/// println!("{:?}", contract.get_message(signer.address()).await?);
/// contract.set_message_and_wait(&signer, "hello", 100, None).await?;
/// # Ok(())
/// # }
/// ```
pub type MessageContract = ContractClient<MessageType>;

#[derive(Debug, thiserror::Error)]
/// Errors that may occur when replacing the message.
pub enum SetMessageError {
    #[error("Dry run of set_message failed: {0}")]
    DryRun(#[from] DryRunUpdateError),
    #[error("Update failed: {0}")]
    Update(#[from] ContractUpdateError),
}

impl MessageContract {
    /// Read the current message. This only simulates the call, so it is free
    /// and changes nothing. `reader` is the source account of the simulated
    /// transaction.
    ///
    /// The result is `None` if the contract returned something that is not a
    /// valid string.
    pub async fn get_message(&self, reader: AccountAddress) -> Result<Option<String>, ViewError> {
        let value = self.view_raw(GET_MESSAGE, Vec::new(), reader).await?;
        Ok(value.as_ref().and_then(decode_string))
    }

    /// Dry run replacing the message. The result can be used to inspect the
    /// fee and then send the transaction.
    pub async fn dry_run_set_message(
        &self,
        sender: AccountAddress,
        message: &str,
    ) -> Result<ContractUpdateBuilder, DryRunUpdateError> {
        let arg = string_arg(message).map_err(TransactionError::from)?;
        self.dry_run_update_raw(SET_MESSAGE, vec![arg], sender)
            .await
    }

    /// Replace the message, and return a handle to the submitted
    /// transaction. The transaction offers `base_fee` stroops on top of the
    /// resource fee determined by simulation.
    pub async fn set_message(
        &self,
        signer: &Keypair,
        message: &str,
        base_fee: u32,
    ) -> Result<ContractUpdateHandle, SetMessageError> {
        let handle = self
            .dry_run_set_message(signer.address(), message)
            .await?
            .base_fee(base_fee)
            .send(signer)
            .await?;
        Ok(handle)
    }

    /// Replace the message and wait until the network has decided on the
    /// transaction. This only succeeds if the transaction was applied
    /// successfully.
    ///
    /// With a `timeout` the wait is bounded, otherwise it can potentially
    /// last indefinitely.
    pub async fn set_message_and_wait(
        &self,
        signer: &Keypair,
        message: &str,
        base_fee: u32,
        timeout: Option<Duration>,
    ) -> Result<ContractUpdateInfo, SetMessageError> {
        let info = self
            .dry_run_set_message(signer.address(), message)
            .await?
            .base_fee(base_fee)
            .send_and_wait(signer, timeout)
            .await?;
        Ok(info)
    }
}
