//! Definition of transactions invoking contracts, and functions for building,
//! preparing, and signing them.
//!
//! The lifecycle of a contract invocation is
//! 1. [`make_invoke_transaction`] builds the bare transaction,
//! 2. the transaction is simulated and [`assemble`] applies the resulting
//!    [`SimulationData`] (footprint, auth, resource fee),
//! 3. [`sign_transaction`] signs it for a particular network, producing an
//!    envelope ready to submit.
use super::{
    smart_contracts::{ContractContext, SimulationData},
    AccountAddress, Keypair, Network, SequenceNumber, TransactionHash, TransactionTime,
};
use crate::xdr::{self, Limits, WriteXdr};
use sha2::Digest;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors that can occur when constructing a transaction.
pub enum TransactionError {
    #[error("Invalid function name {0:?}: must be 1-32 characters of [a-zA-Z0-9_].")]
    InvalidFunctionName(String),
    #[error("The fee does not fit: inclusion fee {base} + resource fee {resource}.")]
    FeeOverflow {
        /// The inclusion fee, in stroops.
        base:     u32,
        /// The resource fee, in stroops.
        resource: i64,
    },
    #[error("The transaction does not consist of a single contract invocation.")]
    NotAnInvocation,
    #[error("Sequence number {0} has no successor.")]
    SequenceNumberOverflow(SequenceNumber),
    #[error("XDR error: {0}")]
    Xdr(#[from] xdr::Error),
}

/// A transaction together with the simulation it was assembled from, ready
/// to be signed.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub transaction:  xdr::Transaction,
    pub simulation:   SimulationData,
    /// The value the invocation returned in simulation.
    pub return_value: Option<xdr::ScVal>,
}

/// A signed transaction.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub hash:     TransactionHash,
    pub envelope: xdr::TransactionEnvelope,
}

fn valid_function_name(name: &str) -> bool {
    (1..=32).contains(&name.len())
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// The host function invoking `context.function` on `context.contract`.
pub fn host_function(context: &ContractContext) -> Result<xdr::HostFunction, TransactionError> {
    if !valid_function_name(&context.function) {
        return Err(TransactionError::InvalidFunctionName(
            context.function.clone(),
        ));
    }
    let function_name = xdr::ScSymbol(context.function.as_bytes().to_vec().try_into()?);
    Ok(xdr::HostFunction::InvokeContract(xdr::InvokeContractArgs {
        contract_address: context.contract.xdr_address(),
        function_name,
        args: context.args.clone().try_into()?,
    }))
}

/// Construct a transaction with a single operation invoking a contract
/// function. The result must be [assembled](assemble) before it can be
/// submitted.
///
/// The arguments are
/// - `source` - the account paying for the transaction
/// - `sequence_number` - the sequence number of the transaction, i.e., one
///   more than the current sequence number of the source account
/// - `fee` - the inclusion fee in stroops
/// - `expiry` - upper bound on the ledger close time
/// - `context` - the contract invocation.
pub fn make_invoke_transaction(
    source: AccountAddress,
    sequence_number: SequenceNumber,
    fee: u32,
    expiry: TransactionTime,
    context: &ContractContext,
) -> Result<xdr::Transaction, TransactionError> {
    let operation = xdr::Operation {
        source_account: None,
        body:           xdr::OperationBody::InvokeHostFunction(xdr::InvokeHostFunctionOp {
            host_function: host_function(context)?,
            auth:          Default::default(),
        }),
    };
    Ok(xdr::Transaction {
        source_account: xdr::MuxedAccount::Ed25519(xdr::Uint256(source.0)),
        fee,
        seq_num: xdr::SequenceNumber(sequence_number.number),
        cond: xdr::Preconditions::Time(xdr::TimeBounds {
            min_time: xdr::TimePoint(0),
            max_time: xdr::TimePoint(expiry.seconds),
        }),
        memo: xdr::Memo::None,
        operations: vec![operation].try_into()?,
        ext: xdr::TransactionExt::V0,
    })
}

/// Apply the result of a simulation to a transaction.
///
/// This sets the Soroban resource data, fills in the authorizations unless
/// the operation already carries some, and raises the fee by the minimum
/// resource fee.
pub fn assemble(
    tx: xdr::Transaction,
    simulation: &SimulationData,
) -> Result<xdr::Transaction, TransactionError> {
    let mut operations: Vec<xdr::Operation> = tx.operations.into();
    let [operation] = operations.as_mut_slice() else {
        return Err(TransactionError::NotAnInvocation);
    };
    let xdr::OperationBody::InvokeHostFunction(invoke) = &mut operation.body else {
        return Err(TransactionError::NotAnInvocation);
    };
    if invoke.auth.is_empty() {
        invoke.auth = simulation.auth.clone().try_into()?;
    }
    // The inclusion fee of an assembled transaction is what is left after
    // subtracting the previous resource fee, so assembling twice is stable.
    let base = match &tx.ext {
        xdr::TransactionExt::V1(data) => {
            let previous = u32::try_from(data.resource_fee).unwrap_or(u32::MAX);
            tx.fee.saturating_sub(previous)
        }
        xdr::TransactionExt::V0 => tx.fee,
    };
    let fee = i64::from(base)
        .checked_add(simulation.min_resource_fee)
        .and_then(|f| u32::try_from(f).ok())
        .ok_or(TransactionError::FeeOverflow {
            base,
            resource: simulation.min_resource_fee,
        })?;
    let mut transaction_data = simulation.transaction_data.clone();
    transaction_data.resource_fee = simulation.min_resource_fee;
    Ok(xdr::Transaction {
        fee,
        operations: operations.try_into()?,
        ext: xdr::TransactionExt::V1(transaction_data),
        ..tx
    })
}

/// Compute the hash of the transaction on the given network. This is both
/// what gets signed, and the identifier used to look the transaction up.
pub fn transaction_hash(
    tx: &xdr::Transaction,
    network: &Network,
) -> Result<TransactionHash, TransactionError> {
    let payload = xdr::TransactionSignaturePayload {
        network_id:         xdr::Hash(network.network_id()),
        tagged_transaction: xdr::TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload.to_xdr(Limits::none())?;
    let hash: [u8; 32] = sha2::Sha256::digest(bytes).into();
    Ok(hash.into())
}

/// Wrap a transaction in an envelope without signatures. This is what is
/// sent to be simulated.
pub fn unsigned_envelope(tx: xdr::Transaction) -> xdr::TransactionEnvelope {
    xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
        tx,
        signatures: Default::default(),
    })
}

/// Sign the transaction for the given network.
pub fn sign_transaction(
    signer: &Keypair,
    tx: xdr::Transaction,
    network: &Network,
) -> Result<SignedTransaction, TransactionError> {
    let hash = transaction_hash(&tx, network)?;
    let signature = xdr::DecoratedSignature {
        hint:      xdr::SignatureHint(signer.signature_hint()),
        signature: xdr::Signature(signer.sign(hash.as_bytes()).to_vec().try_into()?),
    };
    let envelope = xdr::TransactionEnvelope::Tx(xdr::TransactionV1Envelope {
        tx,
        signatures: vec![signature].try_into()?,
    });
    Ok(SignedTransaction { hash, envelope })
}

/// Encode an envelope the way the RPC server expects it.
pub fn encode_envelope(envelope: &xdr::TransactionEnvelope) -> Result<String, xdr::Error> {
    envelope.to_xdr_base64(Limits::none())
}
