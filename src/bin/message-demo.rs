//! Read and replace the message stored in a message contract.
//!
//! The `demo` action runs the full round trip: read the current message,
//! replace it, and read it again to confirm the change.
use anyhow::Context;
use clap::AppSettings;
use soroban_message_client::{
    message::MessageContract,
    rpc::Client,
    types::{ContractAddress, Keypair, Network},
};
use std::time::Duration;
use structopt::StructOpt;
use tracing::Level;

#[derive(StructOpt)]
struct App {
    #[structopt(
        long = "rpc",
        env = "SOROBAN_RPC_URL",
        help = "Soroban RPC endpoint.",
        default_value = "https://soroban-testnet.stellar.org"
    )]
    endpoint:          String,
    #[structopt(
        long = "network",
        env = "SOROBAN_NETWORK",
        help = "Network name (testnet, futurenet, public, standalone) or passphrase.",
        default_value = "testnet"
    )]
    network:           Network,
    #[structopt(long = "contract", env = "CONTRACT_ID", help = "Address of the contract.")]
    contract:          ContractAddress,
    #[structopt(
        long = "secret",
        env = "USER_SECRET",
        hide_env_values = true,
        help = "Secret seed (S...) of the account that signs transactions."
    )]
    secret:            String,
    #[structopt(
        long = "base-fee",
        env = "BASE_FEE",
        help = "Inclusion fee in stroops, on top of the resource fee.",
        default_value = "100"
    )]
    base_fee:          u32,
    #[structopt(
        long = "poll-interval-ms",
        help = "Interval between status queries while waiting for a transaction.",
        default_value = "1000"
    )]
    poll_interval_ms:  u64,
    #[structopt(
        long = "wait-timeout-secs",
        help = "Give up waiting for a transaction after this many seconds."
    )]
    wait_timeout_secs: Option<u64>,
    #[structopt(long = "fund", help = "Fund the account with the friendbot first.")]
    fund:              bool,
    #[structopt(subcommand, help = "The action you want to perform.")]
    action:            Action,
}

#[derive(StructOpt)]
enum Action {
    #[structopt(about = "Read the current message")]
    Get,
    #[structopt(about = "Replace the message")]
    Set {
        #[structopt(long, help = "The new message.")]
        message: String,
    },
    #[structopt(about = "Read the message, replace it, and read it again")]
    Demo {
        #[structopt(long, help = "The new message.", default_value = "Hola desde Rust 🦀")]
        message: String,
    },
}

async fn read_message(contract: &MessageContract, keys: &Keypair) -> anyhow::Result<()> {
    match contract.get_message(keys.address()).await? {
        Some(message) => println!("Current message: {message}"),
        None => println!("The contract did not return a readable message."),
    }
    Ok(())
}

async fn write_message(
    contract: &MessageContract,
    keys: &Keypair,
    message: &str,
    base_fee: u32,
    timeout: Option<Duration>,
) -> anyhow::Result<()> {
    let builder = contract
        .dry_run_set_message(keys.address(), message)
        .await
        .context("Dry run of set_message failed.")?
        .base_fee(base_fee);
    println!("Setting message to {message:?}, offering a fee of {}.", builder.current_fee());
    let info = builder.send_and_wait(keys, timeout).await?;
    let hash = info.transaction_hash;
    match (info.ledger, info.fee_charged) {
        (Some(ledger), Some(fee)) => {
            println!("Transaction {hash} confirmed in ledger {ledger}, fee charged {fee}.")
        }
        (Some(ledger), None) => println!("Transaction {hash} confirmed in ledger {ledger}."),
        _ => println!("Transaction {hash} confirmed."),
    }
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let app = {
        let app = App::clap().global_setting(AppSettings::ColoredHelp);
        let matches = app.get_matches();
        App::from_clap(&matches)
    };

    {
        use tracing_subscriber::prelude::*;
        let log_filter = tracing_subscriber::filter::Targets::new()
            .with_target(module_path!(), Level::INFO)
            .with_target("soroban_message_client", Level::INFO);
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .with(log_filter)
            .init();
    }

    let keys = Keypair::from_secret(&app.secret).context("Could not parse the secret seed.")?;
    let client = Client::new(&app.endpoint)
        .context("Could not create the RPC client.")?
        .with_poll_interval(Duration::from_millis(app.poll_interval_ms));

    client
        .check_network(&app.network)
        .await
        .context("The RPC server does not serve the configured network.")?;
    tracing::info!(
        endpoint = %app.endpoint,
        network = %app.network,
        account = %keys.address(),
        "Connected."
    );

    if app.fund {
        let account = client.request_airdrop(&keys.address()).await?;
        println!("Account {} has a balance of {}.", account.address, account.balance);
    }

    let contract = MessageContract::create(client, app.contract, app.network)
        .await
        .with_context(|| format!("No contract found at {}.", app.contract))?;
    let timeout = app.wait_timeout_secs.map(Duration::from_secs);

    match app.action {
        Action::Get => read_message(&contract, &keys).await?,
        Action::Set { message } => {
            write_message(&contract, &keys, &message, app.base_fee, timeout).await?
        }
        Action::Demo { message } => {
            read_message(&contract, &keys).await?;
            write_message(&contract, &keys, &message, app.base_fee, timeout).await?;
            read_message(&contract, &keys).await?;
        }
    }
    Ok(())
}
