//! Bodies of the Soroban JSON-RPC requests and responses.
//!
//! XDR payloads travel as base64 strings. They are kept as strings here and
//! decoded by the functions that need them, so that an unknown XDR version in a
//! field the caller never looks at does not make the whole response
//! unparseable.
use super::{Amount, SendTransactionStatus, TransactionHash, TransactionStatus};
use crate::{
    internal::{option_string_number, string_number},
    xdr::{self, Limits, ReadXdr},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response to `getHealth`.
pub struct HealthResponse {
    /// `healthy` if the server is in sync with the network.
    pub status:                  String,
    #[serde(default)]
    pub latest_ledger:           Option<u32>,
    #[serde(default)]
    pub oldest_ledger:           Option<u32>,
    #[serde(default)]
    pub ledger_retention_window: Option<u32>,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool { self.status == "healthy" }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response to `getNetwork`.
pub struct NetworkResponse {
    /// Faucet of the network, only present on test networks.
    #[serde(default)]
    pub friendbot_url:    Option<String>,
    pub passphrase:       String,
    pub protocol_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response to `getLatestLedger`.
pub struct LatestLedgerResponse {
    /// Hash of the latest ledger, hex encoded.
    pub id:               String,
    pub protocol_version: u32,
    pub sequence:         u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response to `getVersionInfo`. Older servers use snake case field names.
pub struct VersionInfoResponse {
    pub version:              String,
    #[serde(default, alias = "commit_hash")]
    pub commit_hash:          String,
    #[serde(default, alias = "build_timestamp")]
    pub build_timestamp:      String,
    #[serde(default, alias = "captive_core_version")]
    pub captive_core_version: String,
    #[serde(default, alias = "protocol_version")]
    pub protocol_version:     u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLedgerEntriesRequest {
    /// Base64 encoded `LedgerKey`s.
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResult {
    /// Base64 encoded `LedgerKey`.
    pub key:                      String,
    /// Base64 encoded `LedgerEntryData`.
    pub xdr:                      String,
    pub last_modified_ledger_seq: u32,
    #[serde(default)]
    pub live_until_ledger_seq:    Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response to `getLedgerEntries`.
pub struct GetLedgerEntriesResponse {
    #[serde(default)]
    pub entries:       Option<Vec<LedgerEntryResult>>,
    pub latest_ledger: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Parameters of `simulateTransaction` and `sendTransaction`.
pub struct TransactionRequest {
    /// Base64 encoded `TransactionEnvelope`.
    pub transaction: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Outcome of the host function invoked in a simulation.
///
/// Servers and versions disagree on the name of the return value field, so
/// every spelling seen in the wild is kept as its own field. An entry may
/// carry more than one of them.
pub struct SimulateHostFunctionResult {
    /// Base64 encoded `SorobanAuthorizationEntry`s the invocation requires.
    #[serde(default)]
    pub auth:         Vec<String>,
    /// Base64 encoded `ScVal` returned by the contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xdr:          Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retval:       Option<String>,
    #[serde(default, rename = "retVal", skip_serializing_if = "Option::is_none")]
    pub ret_val:      Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value: Option<String>,
}

impl SimulateHostFunctionResult {
    /// The encoded return value, checking `xdr`, `retval`, `retVal` and
    /// `returnValue` in that order.
    pub fn value_xdr(&self) -> Option<&str> {
        self.xdr
            .as_deref()
            .or(self.retval.as_deref())
            .or(self.ret_val.as_deref())
            .or(self.return_value.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Present in a simulation if some ledger entries in the footprint are
/// archived and must be restored first.
pub struct RestorePreamble {
    pub transaction_data: String,
    #[serde(with = "string_number")]
    pub min_resource_fee: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response to `simulateTransaction`.
pub struct SimulateTransactionResponse {
    pub latest_ledger:    u32,
    /// Resource fee the transaction must at least pay, in stroops.
    #[serde(default, with = "option_string_number")]
    pub min_resource_fee: Option<i64>,
    #[serde(default)]
    pub results:          Option<Vec<SimulateHostFunctionResult>>,
    /// Base64 encoded `SorobanTransactionData`.
    #[serde(default)]
    pub transaction_data: Option<String>,
    /// Base64 encoded `DiagnosticEvent`s.
    #[serde(default)]
    pub events:           Option<Vec<String>>,
    /// Set if the simulation failed.
    #[serde(default)]
    pub error:            Option<String>,
    #[serde(default)]
    pub restore_preamble: Option<RestorePreamble>,
    /// Legacy single-result field of older servers.
    #[serde(default)]
    pub result:           Option<SimulateHostFunctionResult>,
    /// Return value reported directly on the response by some servers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retval:           Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_value:     Option<String>,
}

impl SimulateTransactionResponse {
    /// Locate the encoded return value. The first entry of `results` is
    /// checked first, then the legacy `result`, then the fields on the
    /// response itself.
    pub fn return_value_xdr(&self) -> Option<&str> {
        self.results
            .as_deref()
            .and_then(<[_]>::first)
            .and_then(SimulateHostFunctionResult::value_xdr)
            .or_else(|| {
                self.result
                    .as_ref()
                    .and_then(SimulateHostFunctionResult::value_xdr)
            })
            .or(self.retval.as_deref())
            .or(self.return_value.as_deref())
    }

    /// The auth entries of the first result, still encoded.
    pub fn auth_xdr(&self) -> &[String] {
        match self.results.as_deref() {
            Some([first, ..]) => &first.auth,
            _ => self.result.as_ref().map_or(&[][..], |r| r.auth.as_slice()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response to `sendTransaction`.
pub struct SendTransactionResponse {
    pub status:                  SendTransactionStatus,
    pub hash:                    TransactionHash,
    pub latest_ledger:           u32,
    #[serde(default, with = "option_string_number")]
    pub latest_ledger_close_time: Option<i64>,
    /// Base64 encoded `TransactionResult`, set if the status is `ERROR`.
    #[serde(default)]
    pub error_result_xdr:        Option<String>,
    #[serde(default)]
    pub diagnostic_events_xdr:   Option<Vec<String>>,
}

impl SendTransactionResponse {
    /// Decode the error result, if present and decodable.
    pub fn error_result(&self) -> Option<xdr::TransactionResult> {
        decode_result(self.error_result_xdr.as_deref()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionRequest {
    pub hash: TransactionHash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Response to `getTransaction`.
pub struct GetTransactionResponse {
    pub status:            TransactionStatus,
    pub latest_ledger:     u32,
    /// The ledger that included the transaction.
    #[serde(default)]
    pub ledger:            Option<u32>,
    /// Close time of that ledger, in unix seconds.
    #[serde(default, with = "option_string_number")]
    pub created_at:        Option<i64>,
    #[serde(default)]
    pub application_order: Option<u32>,
    #[serde(default)]
    pub envelope_xdr:      Option<String>,
    #[serde(default)]
    pub result_xdr:        Option<String>,
    #[serde(default)]
    pub result_meta_xdr:   Option<String>,
}

impl GetTransactionResponse {
    /// Decode the transaction result, if present and decodable.
    pub fn result(&self) -> Option<xdr::TransactionResult> {
        decode_result(self.result_xdr.as_deref()?)
    }

    /// The fee that was actually charged for the transaction.
    pub fn fee_charged(&self) -> Option<Amount> {
        self.result().map(|r| Amount::from_stroops(r.fee_charged))
    }

    /// The close time of the ledger that included the transaction.
    pub fn created_at_time(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.created_at?, 0)
    }

    /// The value returned by the invoked contract function. This is only
    /// available if the result metadata is in a format this library knows.
    pub fn return_value(&self) -> Option<xdr::ScVal> {
        let meta =
            xdr::TransactionMeta::from_xdr_base64(self.result_meta_xdr.as_deref()?, Limits::none())
                .ok()?;
        match meta {
            xdr::TransactionMeta::V3(v3) => v3.soroban_meta.map(|m| m.return_value),
            _ => None,
        }
    }
}

fn decode_result(encoded: &str) -> Option<xdr::TransactionResult> {
    xdr::TransactionResult::from_xdr_base64(encoded, Limits::none()).ok()
}

/// Short human readable description of why a transaction failed.
pub fn describe_result(result: &xdr::TransactionResult) -> String {
    format!("{:?}", result.result)
}
