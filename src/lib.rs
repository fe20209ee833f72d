//! A library for interacting with the Soroban message contract on the Stellar
//! network. The library is structured around multiple modules.
//!
//! - [`rpc`] contains the main entrypoint to the library. In particular it
//!   contains the [`Client`](rpc::Client) struct which talks to a Soroban RPC
//!   server over JSON-RPC, and supports queries, simulation, and submission of
//!   transactions.
//! - [`constants`] contains a number of constants that are relevant when using
//!   the chain, such as the network passphrases.
//! - [`types`] contains most type definitions to model responses as well as
//!   types defining transactions. The latter are in a submodule
//!   [`types::transactions`].
//! - [`contract_client`] is a generic client for any contract instance.
//! - [`message`] is the typed client for the `get_message`/`set_message`
//!   contract.
//!
//! In addition to these, the library re-exports the XDR definitions it is
//! built on as [`xdr`].

/// Various constants that apply to the chain.
pub mod constants;
/// Error types of the RPC layer.
pub mod endpoints;
mod internal;
/// Type definitions used throughout the rest of the library.
pub mod types;

/// A generic client for interacting with smart contracts.
pub mod contract_client;

/// A typed client for the message contract.
pub mod message;

/// A [client](rpc::Client) for the Soroban JSON-RPC API.
pub mod rpc;

/// Re-export of the Stellar XDR definitions for the current protocol.
pub use stellar_xdr::curr as xdr;
