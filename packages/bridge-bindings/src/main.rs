//! bridgectl - operate the lock/mint bridge from the command line
//!
//! Chain endpoints, addresses and the signer key come from the environment
//! (see `Config`); `abi` and `check-artifact` work without any of them.

use alloy::{
    primitives::{Address, B256, U256},
    providers::Provider,
    transports::http::{Client, Http},
};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bridge_bindings::{
    check_compatibility,
    client::{read_provider, signer_provider, verify_chain_id},
    config::{ChainEndpoint, Config},
    deploy_lock_bridge, deploy_mint_bridge, deploy_wrapped_token, Artifact, BridgeInit,
    ContractKind, EventQuery, LockBridgeClient, MintBridgeClient, Relayer, TransactOptions,
    WrappedTokenInit,
};

type LockClient<P> = LockBridgeClient<Http<Client>, P>;
type MintClient<P> = MintBridgeClient<Http<Client>, P>;

#[derive(Parser)]
#[command(name = "bridgectl")]
#[command(about = "Deploy, inspect and operate the lock/mint token bridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Side {
    /// LockBridge on the source chain
    Lock,
    /// MintBridge on the destination chain
    Mint,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Direction {
    /// Mint on the destination for source locks
    Locks,
    /// Unlock on the source for destination burns
    Burns,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the JSON ABI of a contract
    Abi {
        contract: ContractKind,

        /// Single-line output
        #[arg(long)]
        compact: bool,
    },

    /// Check a compiled artifact against the bindings
    CheckArtifact {
        contract: ContractKind,

        /// Artifact file (defaults to a lookup under ARTIFACTS_DIR)
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Deploy a contract from its compiled artifact
    #[command(subcommand)]
    Deploy(DeployCommand),

    /// Show bridge configuration and state
    Status {
        #[arg(long, value_enum, default_value = "lock")]
        bridge: Side,
    },

    /// Preview a lock or burn without sending it
    Preview {
        #[arg(long, value_enum, default_value = "lock")]
        bridge: Side,

        /// Account that would send the transfer
        #[arg(long)]
        sender: Address,

        amount: U256,
    },

    /// Lock tokens on the source chain
    Lock {
        amount: U256,

        /// Approve the bridge first if the allowance is short
        #[arg(long)]
        approve: bool,
    },

    /// Burn wrapped tokens on the destination chain
    Burn { amount: U256 },

    /// Release locked tokens for a destination burn (owner only)
    Unlock {
        #[arg(long)]
        recipient: Address,
        #[arg(long)]
        amount: U256,
        /// Burn transaction on the destination chain
        #[arg(long)]
        source_tx: B256,
    },

    /// Mint wrapped tokens for a source lock (owner only)
    Mint {
        #[arg(long)]
        recipient: Address,
        #[arg(long)]
        amount: U256,
        /// Lock transaction on the source chain
        #[arg(long)]
        source_tx: B256,
    },

    /// List bridge events in a block range
    Events {
        #[arg(long, value_enum, default_value = "lock")]
        bridge: Side,
        #[arg(long)]
        from: u64,
        /// Defaults to the safe head
        #[arg(long)]
        to: Option<u64>,
    },

    /// Stream new Locked/Burned events until Ctrl-C
    Watch {
        #[arg(long, value_enum, default_value = "lock")]
        bridge: Side,
        /// Start block (defaults to the next safe block)
        #[arg(long)]
        from: Option<u64>,
    },

    /// Relay transfers between the two bridges (owner key on both chains)
    Relay {
        #[arg(value_enum)]
        direction: Direction,
        #[arg(long)]
        from: u64,
        #[arg(long)]
        to: Option<u64>,
    },
}

#[derive(Subcommand)]
enum DeployCommand {
    /// WrappedToken on the destination chain
    Token {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value_t = 18)]
        decimals: u8,
        /// Defaults to the signer
        #[arg(long)]
        owner: Option<Address>,
    },

    /// LockBridge on the source chain
    LockBridge {
        #[command(flatten)]
        args: BridgeArgs,
    },

    /// MintBridge on the destination chain
    MintBridge {
        #[command(flatten)]
        args: BridgeArgs,
    },
}

#[derive(clap::Args)]
struct BridgeArgs {
    /// Custodied token (lock bridge) or wrapped token (mint bridge)
    #[arg(long)]
    token: Address,
    #[arg(long, default_value = "0")]
    fee_bps: U256,
    /// Defaults to the signer
    #[arg(long)]
    fee_recipient: Option<Address>,
    /// Zero disables the limit
    #[arg(long, default_value = "0")]
    daily_limit: U256,
    /// Defaults to the signer
    #[arg(long)]
    owner: Option<Address>,
}

impl BridgeArgs {
    fn init(&self, signer: Address) -> BridgeInit {
        BridgeInit {
            token: self.token,
            fee_bps: self.fee_bps,
            fee_recipient: self.fee_recipient.unwrap_or(signer),
            daily_limit: self.daily_limit,
            owner: self.owner.unwrap_or(signer),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Initialize tracing/logging with structured output
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,bridge_bindings=debug"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn connect_read(endpoint: &ChainEndpoint) -> Result<impl Provider<Http<Client>> + Clone> {
    let provider = read_provider(&endpoint.rpc_url)?;
    verify_chain_id::<Http<Client>, _>(&provider, endpoint.chain_id).await?;
    Ok(provider)
}

async fn connect_signer(
    endpoint: &ChainEndpoint,
    config: &Config,
) -> Result<(impl Provider<Http<Client>> + Clone, Address)> {
    let (provider, signer) = signer_provider(&endpoint.rpc_url, config.require_private_key()?)?;
    verify_chain_id::<Http<Client>, _>(&provider, endpoint.chain_id).await?;
    Ok((provider, signer))
}

/// Explicit `path`, else a lookup under the configured artifacts directory
/// (`ARTIFACTS_DIR`, also read from .env when no full config is loaded)
fn load_artifact(config: Option<&Config>, kind: ContractKind, path: Option<PathBuf>) -> Result<Artifact> {
    match path {
        Some(path) => Artifact::load(path),
        None => {
            let dir = match config {
                Some(config) => config.artifacts_dir.clone(),
                None => Config::artifacts_dir_from_file(".env")?,
            };
            Artifact::load_for(dir, kind)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Abi { contract, compact } => {
            println!("{}", contract.abi_json(!compact)?);
        }

        Commands::CheckArtifact { contract, path } => {
            let artifact = load_artifact(None, contract, path)?;
            let report = check_compatibility(contract, &artifact.abi);
            print_json(&report)?;
            report.into_result()?;
        }

        Commands::Deploy(command) => {
            let config = Config::load()?;
            deploy(&config, command).await?;
        }

        Commands::Status { bridge } => {
            let config = Config::load()?;
            let status = match bridge {
                Side::Lock => {
                    let provider = connect_read(&config.source).await?;
                    LockClient::new(config.source.require_bridge()?, provider)
                        .status()
                        .await?
                }
                Side::Mint => {
                    let dest = config.require_destination()?;
                    let provider = connect_read(dest).await?;
                    MintClient::new(dest.require_bridge()?, provider)
                        .status()
                        .await?
                }
            };
            print_json(&status)?;
        }

        Commands::Preview {
            bridge,
            sender,
            amount,
        } => {
            let config = Config::load()?;
            let preview = match bridge {
                Side::Lock => {
                    let provider = connect_read(&config.source).await?;
                    LockClient::new(config.source.require_bridge()?, provider)
                        .preview_lock(sender, amount)
                        .await?
                }
                Side::Mint => {
                    let dest = config.require_destination()?;
                    let provider = connect_read(dest).await?;
                    MintClient::new(dest.require_bridge()?, provider)
                        .preview_burn(sender, amount)
                        .await?
                }
            };
            print_json(&preview)?;
        }

        Commands::Lock { amount, approve } => {
            let config = Config::load()?;
            let (provider, signer) = connect_signer(&config.source, &config).await?;
            let bridge = LockClient::new(config.source.require_bridge()?, provider);

            let outcome = if approve {
                bridge.lock_with_approval(signer, amount).await?
            } else {
                bridge.lock(amount).await?
            };
            print_json(&outcome)?;
        }

        Commands::Burn { amount } => {
            let config = Config::load()?;
            let dest = config.require_destination()?;
            let (provider, _) = connect_signer(dest, &config).await?;
            let outcome = MintClient::new(dest.require_bridge()?, provider)
                .burn(amount)
                .await?;
            print_json(&outcome)?;
        }

        Commands::Unlock {
            recipient,
            amount,
            source_tx,
        } => {
            let config = Config::load()?;
            let (provider, _) = connect_signer(&config.source, &config).await?;
            let outcome = LockClient::new(config.source.require_bridge()?, provider)
                .unlock(recipient, amount, source_tx)
                .await?;
            print_json(&outcome)?;
        }

        Commands::Mint {
            recipient,
            amount,
            source_tx,
        } => {
            let config = Config::load()?;
            let dest = config.require_destination()?;
            let (provider, _) = connect_signer(dest, &config).await?;
            let outcome = MintClient::new(dest.require_bridge()?, provider)
                .mint(recipient, amount, source_tx)
                .await?;
            print_json(&outcome)?;
        }

        Commands::Events { bridge, from, to } => {
            let config = Config::load()?;
            let mut query = EventQuery::new().from_block(from);
            if let Some(to) = to {
                query = query.to_block(to);
            }

            match bridge {
                Side::Lock => {
                    let provider = connect_read(&config.source).await?;
                    let client = LockClient::new(config.source.require_bridge()?, provider)
                        .with_watcher_config(config.watcher.clone());
                    for log in client.filter_all(&query).await? {
                        println!(
                            "{:?} {:?} {:?}",
                            log.meta.block_number, log.meta.tx_hash, log.event
                        );
                    }
                }
                Side::Mint => {
                    let dest = config.require_destination()?;
                    let provider = connect_read(dest).await?;
                    let client = MintClient::new(dest.require_bridge()?, provider)
                        .with_watcher_config(config.watcher.clone());
                    for log in client.filter_all(&query).await? {
                        println!(
                            "{:?} {:?} {:?}",
                            log.meta.block_number, log.meta.tx_hash, log.event
                        );
                    }
                }
            }
        }

        Commands::Watch { bridge, from } => {
            let config = Config::load()?;
            let mut query = EventQuery::new();
            if let Some(from) = from {
                query = query.from_block(from);
            }
            watch(&config, bridge, query).await?;
        }

        Commands::Relay {
            direction,
            from,
            to,
        } => {
            let config = Config::load()?;
            let dest = config.require_destination()?;

            let (source_provider, _) = connect_signer(&config.source, &config).await?;
            let (dest_provider, _) = connect_signer(dest, &config).await?;
            let relayer = Relayer::new(
                LockClient::new(config.source.require_bridge()?, source_provider)
                    .with_watcher_config(config.watcher.clone()),
                MintClient::new(dest.require_bridge()?, dest_provider)
                    .with_watcher_config(config.watcher.clone()),
            );

            let mut query = EventQuery::new().from_block(from);
            if let Some(to) = to {
                query = query.to_block(to);
            }

            let summary = match direction {
                Direction::Locks => relayer.relay_locks(query).await?,
                Direction::Burns => relayer.relay_burns(query).await?,
            };
            print_json(&summary)?;
        }
    }

    Ok(())
}

async fn deploy(config: &Config, command: DeployCommand) -> Result<()> {
    let options = TransactOptions::default();

    let deployment = match command {
        DeployCommand::Token {
            name,
            symbol,
            decimals,
            owner,
        } => {
            let dest = config.require_destination()?;
            let artifact = load_artifact(Some(config), ContractKind::WrappedToken, None)?;
            let (provider, signer) = connect_signer(dest, config).await?;
            let init = WrappedTokenInit {
                name,
                symbol,
                decimals,
                owner: owner.unwrap_or(signer),
            };
            deploy_wrapped_token::<Http<Client>, _>(provider, &artifact, &init, &options)
                .await?
                .0
        }
        DeployCommand::LockBridge { args } => {
            let artifact = load_artifact(Some(config), ContractKind::LockBridge, None)?;
            let (provider, signer) = connect_signer(&config.source, config).await?;
            deploy_lock_bridge::<Http<Client>, _>(provider, &artifact, &args.init(signer), &options)
                .await?
                .0
        }
        DeployCommand::MintBridge { args } => {
            let dest = config.require_destination()?;
            let artifact = load_artifact(Some(config), ContractKind::MintBridge, None)?;
            let (provider, signer) = connect_signer(dest, config).await?;
            deploy_mint_bridge::<Http<Client>, _>(provider, &artifact, &args.init(signer), &options)
                .await?
                .0
        }
    };

    print_json(&deployment)
}

async fn watch(config: &Config, bridge: Side, query: EventQuery) -> Result<()> {
    match bridge {
        Side::Lock => {
            let provider = read_provider(&config.source.rpc_url)?;
            verify_chain_id::<Http<Client>, _>(&provider, config.source.chain_id).await?;
            let client = LockClient::new(config.source.require_bridge()?, provider)
                .with_watcher_config(config.watcher.clone());

            info!(bridge = %client.address(), "Watching Locked events, Ctrl-C to stop");
            let mut sub = client.watch_locked(query, &[]);
            let shutdown = wait_for_shutdown_signal();
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    _ = &mut shutdown => break,
                    next = sub.next() => match next {
                        Some(Ok(log)) => println!(
                            "{:?} {:?} Locked sender={} amount={}",
                            log.meta.block_number, log.meta.tx_hash, log.event.sender, log.event.amount
                        ),
                        Some(Err(e)) => return Err(e),
                        None => break,
                    },
                }
            }
            sub.close();
        }
        Side::Mint => {
            let dest = config.require_destination()?;
            let provider = read_provider(&dest.rpc_url)?;
            verify_chain_id::<Http<Client>, _>(&provider, dest.chain_id).await?;
            let client = MintClient::new(dest.require_bridge()?, provider)
                .with_watcher_config(config.watcher.clone());

            info!(bridge = %client.address(), "Watching Burned events, Ctrl-C to stop");
            let mut sub = client.watch_burned(query, &[]);
            let shutdown = wait_for_shutdown_signal();
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    _ = &mut shutdown => break,
                    next = sub.next() => match next {
                        Some(Ok(log)) => println!(
                            "{:?} {:?} Burned sender={} amount={}",
                            log.meta.block_number, log.meta.tx_hash, log.event.sender, log.event.amount
                        ),
                        Some(Err(e)) => return Err(e),
                        None => break,
                    },
                }
            }
            sub.close();
        }
    }

    info!("Watch stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn wait_for_shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping");
        }
        _ = terminate => {
            info!("Received SIGTERM, stopping");
        }
    }
}
