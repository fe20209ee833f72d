//! Type definitions used throughout the rest of the library.
//!
//! Identifiers that are displayed to users (accounts, contracts, secret
//! seeds) use the StrKey textual encoding, transaction hashes are shown as
//! hex.
pub mod queries;
pub mod smart_contracts;
pub mod transactions;

use crate::constants;
use derive_more::{Display, From, Into};
use ed25519_dalek::{Signer as _, SigningKey};
use rand::RngCore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Digest;
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Error when parsing one of the StrKey encoded identifiers.
pub enum ParseKeyError {
    #[error("Invalid account address: {0}")]
    InvalidAccount(String),
    #[error("Invalid contract address: {0}")]
    InvalidContract(String),
    /// The contents are deliberately not included since they are secret.
    #[error("Invalid secret seed.")]
    InvalidSecret,
}

/// The network a transaction is destined for. Signatures commit to the
/// network passphrase, so a transaction signed for one network is not valid on
/// another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Network {
    Public,
    Testnet,
    Futurenet,
    Standalone,
    /// Any other network, identified by its passphrase.
    Custom(String),
}

impl Network {
    /// Look up a network by its passphrase.
    pub fn from_passphrase(passphrase: &str) -> Self {
        match passphrase {
            constants::PUBLIC_NETWORK_PASSPHRASE => Network::Public,
            constants::TESTNET_NETWORK_PASSPHRASE => Network::Testnet,
            constants::FUTURENET_NETWORK_PASSPHRASE => Network::Futurenet,
            constants::STANDALONE_NETWORK_PASSPHRASE => Network::Standalone,
            other => Network::Custom(other.to_owned()),
        }
    }

    pub fn passphrase(&self) -> &str {
        match self {
            Network::Public => constants::PUBLIC_NETWORK_PASSPHRASE,
            Network::Testnet => constants::TESTNET_NETWORK_PASSPHRASE,
            Network::Futurenet => constants::FUTURENET_NETWORK_PASSPHRASE,
            Network::Standalone => constants::STANDALONE_NETWORK_PASSPHRASE,
            Network::Custom(p) => p,
        }
    }

    /// The network id, which is the SHA-256 hash of the passphrase.
    pub fn network_id(&self) -> [u8; 32] { sha2::Sha256::digest(self.passphrase()).into() }
}

/// Parse a network from its short name (`testnet`, `futurenet`, `public`,
/// `mainnet`, `standalone`, `local`). Anything else is taken to be the
/// passphrase of a custom network.
impl FromStr for Network {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "public" | "mainnet" | "pubnet" => Network::Public,
            "testnet" => Network::Testnet,
            "futurenet" => Network::Futurenet,
            "standalone" | "local" => Network::Standalone,
            _ => Network::from_passphrase(s),
        })
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Public => f.write_str("public"),
            Network::Testnet => f.write_str("testnet"),
            Network::Futurenet => f.write_str("futurenet"),
            Network::Standalone => f.write_str("standalone"),
            Network::Custom(p) => write!(f, "custom ({p})"),
        }
    }
}

/// Address of an account. This is the raw ed25519 public key of the account.
/// It is displayed and parsed in the `G...` StrKey format.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into)]
pub struct AccountAddress(pub [u8; 32]);

impl FromStr for AccountAddress {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        stellar_strkey::ed25519::PublicKey::from_string(s)
            .map(|pk| AccountAddress(pk.0))
            .map_err(|_| ParseKeyError::InvalidAccount(s.to_owned()))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stellar_strkey::ed25519::PublicKey(self.0).to_string())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self}") }
}

impl AccountAddress {
    pub(crate) fn xdr_account_id(self) -> crate::xdr::AccountId {
        crate::xdr::AccountId(crate::xdr::PublicKey::PublicKeyTypeEd25519(
            crate::xdr::Uint256(self.0),
        ))
    }
}

/// Address of a deployed contract instance. It is displayed and parsed in the
/// `C...` StrKey format.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, From, Into)]
pub struct ContractAddress(pub [u8; 32]);

impl FromStr for ContractAddress {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        stellar_strkey::Contract::from_string(s)
            .map(|c| ContractAddress(c.0))
            .map_err(|_| ParseKeyError::InvalidContract(s.to_owned()))
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stellar_strkey::Contract(self.0).to_string())
    }
}

impl fmt::Debug for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self}") }
}

impl ContractAddress {
    pub(crate) fn xdr_address(self) -> crate::xdr::ScAddress {
        crate::xdr::ScAddress::Contract(crate::xdr::Hash(self.0))
    }
}

/// An ed25519 keypair that controls an account.
///
/// The [`Debug`](std::fmt::Debug) implementation only shows the public part.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

impl Keypair {
    /// Construct the keypair from an `S...` secret seed.
    pub fn from_secret(secret: &str) -> Result<Self, ParseKeyError> {
        let seed = stellar_strkey::ed25519::PrivateKey::from_string(secret.trim())
            .map_err(|_| ParseKeyError::InvalidSecret)?;
        Ok(Self::from_seed(&seed.0))
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Generate a fresh keypair using the operating system's randomness.
    pub fn random() -> Self {
        let mut seed = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    /// The address of the account controlled by this keypair.
    pub fn address(&self) -> AccountAddress {
        AccountAddress(self.signing_key.verifying_key().to_bytes())
    }

    /// The secret seed in `S...` format.
    pub fn secret(&self) -> String {
        stellar_strkey::ed25519::PrivateKey(self.signing_key.to_bytes()).to_string()
    }

    /// Sign the given message (typically a transaction hash).
    pub fn sign(&self, message: &[u8]) -> [u8; 64] { self.signing_key.sign(message).to_bytes() }

    /// The last four bytes of the public key. Signatures carry this so that
    /// verifiers can find the matching signer quickly.
    pub fn signature_hint(&self) -> [u8; 4] {
        let pk = self.address().0;
        [pk[28], pk[29], pk[30], pk[31]]
    }
}

/// Hash of a transaction. This is what identifies the transaction when
/// querying its status.
#[derive(Copy, Clone, PartialEq, Eq, Hash, From, Into)]
pub struct TransactionHash([u8; 32]);

impl TransactionHash {
    pub fn as_bytes(&self) -> &[u8; 32] { &self.0 }
}

impl fmt::Display for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&hex::encode(self.0)) }
}

impl fmt::Debug for TransactionHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{self}") }
}

#[derive(Debug, Error)]
pub enum ParseHashError {
    #[error("Not a valid hex string: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("Expected 32 bytes, got {0}.")]
    InvalidLength(usize),
}

impl FromStr for TransactionHash {
    type Err = ParseHashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let len = bytes.len();
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseHashError::InvalidLength(len))?;
        Ok(Self(arr))
    }
}

impl Serialize for TransactionHash {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransactionHash {
    fn deserialize<D: serde::Deserializer<'de>>(des: D) -> Result<Self, D::Error> {
        let s = String::deserialize(des)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Sequence number of an account. A transaction must use exactly one more
/// than the current sequence number of its source account.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct SequenceNumber {
    pub number: i64,
}

impl SequenceNumber {
    /// The sequence number the next transaction of the account must use.
    /// Fails if the account has exhausted its sequence numbers.
    pub fn next(self) -> Result<Self, transactions::TransactionError> {
        let number = self
            .number
            .checked_add(1)
            .ok_or(transactions::TransactionError::SequenceNumberOverflow(self))?;
        Ok(Self { number })
    }
}

/// An amount of lumens, stored in stroops (10^-7 XLM).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into, Default)]
pub struct Amount {
    pub stroops: i64,
}

impl Amount {
    pub fn from_stroops(stroops: i64) -> Self { Self { stroops } }

    pub fn zero() -> Self { Self::default() }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.stroops.checked_add(other.stroops).map(Amount::from_stroops)
    }
}

/// Display the amount in XLM, with 7 decimals.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} XLM",
            Decimal::new(self.stroops, constants::STROOP_DECIMALS)
        )
    }
}

/// Upper bound on the close time of the ledger that includes a transaction.
/// A value of `0` means the transaction never expires.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, From, Into)]
pub struct TransactionTime {
    pub seconds: u64,
}

impl TransactionTime {
    /// A transaction time that puts no upper bound on validity.
    pub fn never() -> Self { Self { seconds: 0 } }

    /// The time `seconds` after the current time.
    pub fn seconds_after(seconds: u64) -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        Self {
            seconds: now + seconds,
        }
    }

    /// The time `minutes` after the current time.
    pub fn minutes_after(minutes: u64) -> Self { Self::seconds_after(minutes * 60) }

    pub fn is_never(&self) -> bool { self.seconds == 0 }
}

/// Status of a transaction as reported by `getTransaction`. `Success` and
/// `Failed` are terminal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Success,
    NotFound,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool { !matches!(self, TransactionStatus::NotFound) }
}

/// Status of a submission as reported by `sendTransaction`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendTransactionStatus {
    /// Accepted into the queue, not yet included in a ledger.
    Pending,
    /// The same transaction was already submitted.
    Duplicate,
    /// The server is overloaded, submission was not accepted.
    TryAgainLater,
    /// The transaction was rejected.
    Error,
}

impl fmt::Display for SendTransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SendTransactionStatus::Pending => "PENDING",
            SendTransactionStatus::Duplicate => "DUPLICATE",
            SendTransactionStatus::TryAgainLater => "TRY_AGAIN_LATER",
            SendTransactionStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The state of an account relevant for building transactions.
pub struct AccountInfo {
    pub address:         AccountAddress,
    /// The current sequence number of the account.
    pub sequence_number: SequenceNumber,
    /// The native balance of the account.
    pub balance:         Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_seed_roundtrips() {
        let secret = Keypair::from_seed(&[7u8; 32]).secret();
        assert!(secret.starts_with('S'));
        let kp = Keypair::from_secret(&secret).expect("valid seed");
        assert_eq!(kp.secret(), secret);
        let address = kp.address().to_string();
        assert!(address.starts_with('G'));
        assert_eq!(address.parse::<AccountAddress>().unwrap(), kp.address());
    }

    #[test]
    fn invalid_secret_is_rejected_without_echoing_it() {
        let err = Keypair::from_secret("SNOTAVALIDSEED").unwrap_err();
        assert_eq!(err, ParseKeyError::InvalidSecret);
        assert!(!err.to_string().contains("SNOTAVALIDSEED"));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let kp = Keypair::random();
        let dbg = format!("{kp:?}");
        assert!(!dbg.contains(&kp.secret()));
        assert!(dbg.contains(&kp.address().to_string()));
    }

    #[test]
    fn contract_address_parses() {
        let s = ContractAddress([3u8; 32]).to_string();
        assert!(s.starts_with('C'));
        let addr: ContractAddress = s.parse().unwrap();
        assert_eq!(addr, ContractAddress([3u8; 32]));
        assert!(s.parse::<AccountAddress>().is_err());
    }

    #[test]
    fn signature_verifies() {
        use ed25519_dalek::{Signature, Verifier, VerifyingKey};
        let kp = Keypair::random();
        let sig = kp.sign(b"message");
        let vk = VerifyingKey::from_bytes(&kp.address().0).unwrap();
        assert!(vk.verify(b"message", &Signature::from_bytes(&sig)).is_ok());
        assert_eq!(&kp.signature_hint(), &kp.address().0[28..]);
    }

    #[test]
    fn network_parsing() {
        assert_eq!("testnet".parse::<Network>().unwrap(), Network::Testnet);
        assert_eq!("Mainnet".parse::<Network>().unwrap(), Network::Public);
        assert_eq!(
            constants::FUTURENET_NETWORK_PASSPHRASE
                .parse::<Network>()
                .unwrap(),
            Network::Futurenet
        );
        let custom: Network = "My Network ; 2024".parse().unwrap();
        assert_eq!(custom.passphrase(), "My Network ; 2024");
    }

    #[test]
    fn network_id_is_hash_of_passphrase() {
        assert_eq!(
            hex::encode(Network::Testnet.network_id()),
            "cee0302d59844d32bdca915c8203dd44b33fbb7edc19051ea37abedf28ecd472"
        );
    }

    #[test]
    fn amount_displays_in_lumens() {
        assert_eq!(Amount::from_stroops(12_345_678).to_string(), "1.2345678 XLM");
        assert_eq!(Amount::from_stroops(100).to_string(), "0.0000100 XLM");
    }

    #[test]
    fn transaction_hash_hex() {
        let h = TransactionHash::from([0xabu8; 32]);
        let s = h.to_string();
        assert_eq!(s.len(), 64);
        assert_eq!(s.parse::<TransactionHash>().unwrap(), h);
        assert!(matches!(
            "abcd".parse::<TransactionHash>(),
            Err(ParseHashError::InvalidLength(2))
        ));
    }

    #[test]
    fn transaction_status_serde() {
        let s: TransactionStatus = serde_json::from_str("\"NOT_FOUND\"").unwrap();
        assert_eq!(s, TransactionStatus::NotFound);
        assert!(!s.is_terminal());
        let s: SendTransactionStatus = serde_json::from_str("\"TRY_AGAIN_LATER\"").unwrap();
        assert_eq!(s, SendTransactionStatus::TryAgainLater);
    }

    #[test]
    fn sequence_number_successor() {
        let seq = SequenceNumber { number: 41 };
        assert_eq!(seq.next().unwrap(), SequenceNumber { number: 42 });
        let last = SequenceNumber { number: i64::MAX };
        assert!(matches!(
            last.next(),
            Err(transactions::TransactionError::SequenceNumberOverflow(s)) if s == last
        ));
    }
}
