/// Passphrase of the public (main) network.
pub const PUBLIC_NETWORK_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";

/// Passphrase of the test network.
pub const TESTNET_NETWORK_PASSPHRASE: &str = "Test SDF Network ; September 2015";

/// Passphrase of the future network.
pub const FUTURENET_NETWORK_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";

/// Passphrase used by a local standalone node (e.g. the quickstart image).
pub const STANDALONE_NETWORK_PASSPHRASE: &str = "Standalone Network ; February 2017";

/// The public Soroban RPC endpoint of the test network.
pub const DEFAULT_TESTNET_RPC_URL: &str = "https://soroban-testnet.stellar.org";

/// Minimum inclusion fee per operation, in stroops.
pub const BASE_FEE: u32 = 100;

/// Interval between two `getTransaction` queries while waiting for a
/// transaction to reach a terminal status.
pub const DEFAULT_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

/// Default validity window of a transaction, in seconds after it is built.
pub const DEFAULT_TRANSACTION_TIMEOUT_SECS: u64 = 300;

/// Timeout of a single HTTP request to the RPC server.
pub const DEFAULT_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Number of decimal places between stroops and lumens.
pub const STROOP_DECIMALS: u32 = 7;
