// src/main.rs
use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use dotenv::dotenv;
use ethers::providers::{Http, Provider};
use ethers::signers::LocalWallet;
use ethers::types::{Address, U256};
use jsonrpsee::server::{ServerBuilder, ServerHandle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod account;
mod client;
mod contracts;
mod error;
mod gas;
mod observer;
mod rpc;
mod types;

use crate::account::{AccountConfig, SmartAccount};
use crate::client::{EthersChainClient, ProviderFeeOracle};
use crate::contracts::{
    parse_address, parse_u256, DEFAULT_ENTRY_POINT_ADDRESS, DEFAULT_FACTORY_ADDRESS,
    DEFAULT_MODULE_ADDRESS,
};
use crate::gas::GasOverheads;
use crate::rpc::{AccountRpcImpl, AccountRpcServer};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(short, long, env = "RPC_SERVER_ADDR", default_value = "127.0.0.1:8545")]
    rpc_server_addr: String,

    /// Owner key of the smart account
    #[clap(short, long, env = "PRIVATE_KEY")]
    private_key: String,

    #[clap(short, long, env = "ETH_RPC_URL")]
    eth_rpc_url: String,

    #[clap(long, env = "FACTORY_ADDRESS", default_value = DEFAULT_FACTORY_ADDRESS, value_parser = parse_address)]
    factory_address: Address,

    #[clap(long, env = "ENTRY_POINT_ADDRESS", default_value = DEFAULT_ENTRY_POINT_ADDRESS, value_parser = parse_address)]
    entry_point_address: Address,

    /// Ownership validation module installed at deployment
    #[clap(long, env = "MODULE_ADDRESS", default_value = DEFAULT_MODULE_ADDRESS, value_parser = parse_address)]
    module_address: Address,

    /// Deployment index (salt) of the account
    #[clap(long, env = "ACCOUNT_INDEX", default_value = "0", value_parser = parse_u256)]
    index: U256,

    /// Expected operations per bundle, used to share the fixed pre-verification cost
    #[clap(long, env = "BUNDLE_SIZE", default_value_t = 1)]
    bundle_size: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let owner = args.private_key.parse::<LocalWallet>()?;
    let provider = Arc::new(Provider::<Http>::try_from(args.eth_rpc_url.as_str())?);
    let config = AccountConfig {
        factory: args.factory_address,
        entry_point: args.entry_point_address,
        module: args.module_address,
        index: args.index,
    };
    let account = SmartAccount::new(
        owner,
        config,
        EthersChainClient::new(provider.clone()),
        ProviderFeeOracle::new(provider),
    )
    .with_gas_overheads(GasOverheads {
        bundle_size: U256::from(args.bundle_size),
        ..GasOverheads::default()
    });

    let server_addr: SocketAddr = args.rpc_server_addr.parse()?;
    let account_rpc = AccountRpcImpl::new(Arc::new(account));

    info!("Starting smart account RPC server on {}", server_addr);

    let server_handle = start_server(server_addr, account_rpc).await?;

    // Keep the server running until Ctrl+C is pressed
    tokio::signal::ctrl_c().await?;
    server_handle.stop()?;
    info!("Server stopped");

    Ok(())
}

async fn start_server(
    server_addr: SocketAddr,
    account_rpc: impl AccountRpcServer,
) -> anyhow::Result<ServerHandle> {
    let server = ServerBuilder::default().build(server_addr).await?;
    let server_handle = server.start(account_rpc.into_rpc());

    Ok(server_handle)
}
