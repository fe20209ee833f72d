//! Types related to invoking smart contracts and interpreting the results.
use super::{queries::SimulateTransactionResponse, ContractAddress};
use crate::{
    endpoints::RPCError,
    xdr::{self, Limits, ReadXdr},
};

/// Data needed to invoke a contract function: which contract, which
/// function, and with which arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractContext {
    pub contract: ContractAddress,
    pub function: String,
    pub args:     Vec<xdr::ScVal>,
}

impl ContractContext {
    pub fn new(contract: ContractAddress, function: impl Into<String>) -> Self {
        Self {
            contract,
            function: function.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<xdr::ScVal>) -> Self {
        self.args = args;
        self
    }
}

/// What a simulation tells us about the resources a transaction needs.
/// Applying this to the transaction is what makes it acceptable to the
/// network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationData {
    /// Authorizations the invocation requires.
    pub auth:             Vec<xdr::SorobanAuthorizationEntry>,
    /// Footprint and resource limits.
    pub transaction_data: xdr::SorobanTransactionData,
    /// Resource fee in stroops, on top of the inclusion fee.
    pub min_resource_fee: i64,
}

/// Outcome of simulating a contract invocation.
#[derive(Debug, Clone)]
pub enum InvokeContractResult {
    Success {
        /// The value the function returned. `None` if the server did not
        /// report one, or if it could not be decoded.
        return_value:     Option<xdr::ScVal>,
        /// Resource data, needed if the invocation is to be submitted.
        data:             Option<SimulationData>,
        /// Whether archived entries must be restored before submitting.
        restore_required: bool,
        latest_ledger:    u32,
    },
    Failure {
        /// The error reported by the server, typically a host error.
        error:         String,
        latest_ledger: u32,
    },
}

impl InvokeContractResult {
    pub fn is_success(&self) -> bool { matches!(self, InvokeContractResult::Success { .. }) }
}

impl TryFrom<SimulateTransactionResponse> for InvokeContractResult {
    type Error = RPCError;

    fn try_from(response: SimulateTransactionResponse) -> Result<Self, Self::Error> {
        if let Some(error) = &response.error {
            return Ok(InvokeContractResult::Failure {
                error:         error.clone(),
                latest_ledger: response.latest_ledger,
            });
        }
        // Decoding of the return value is best effort.
        let return_value = response
            .return_value_xdr()
            .and_then(|encoded| xdr::ScVal::from_xdr_base64(encoded, Limits::none()).ok());
        let auth = response
            .auth_xdr()
            .iter()
            .map(|a| xdr::SorobanAuthorizationEntry::from_xdr_base64(a, Limits::none()))
            .collect::<Result<Vec<_>, _>>()?;
        let data = match (&response.transaction_data, response.min_resource_fee) {
            (Some(encoded), Some(min_resource_fee)) => Some(SimulationData {
                auth,
                transaction_data: xdr::SorobanTransactionData::from_xdr_base64(
                    encoded,
                    Limits::none(),
                )?,
                min_resource_fee,
            }),
            _ => None,
        };
        Ok(InvokeContractResult::Success {
            return_value,
            data,
            restore_required: response.restore_preamble.is_some(),
            latest_ledger: response.latest_ledger,
        })
    }
}

/// Build a contract string argument.
pub fn string_arg(value: &str) -> Result<xdr::ScVal, xdr::Error> {
    let s: xdr::StringM = value.as_bytes().to_vec().try_into()?;
    Ok(xdr::ScVal::String(xdr::ScString(s)))
}

/// Decode a contract value as a string. Both strings and symbols are
/// accepted. Anything else, including strings that are not UTF-8, yields
/// `None`.
pub fn decode_string(value: &xdr::ScVal) -> Option<String> {
    let bytes: Vec<u8> = match value {
        xdr::ScVal::String(s) => s.0.clone().into(),
        xdr::ScVal::Symbol(s) => s.0.clone().into(),
        _ => return None,
    };
    String::from_utf8(bytes).ok()
}
