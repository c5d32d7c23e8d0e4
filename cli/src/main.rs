//! ChainTail CLI: follow a node's logs and print them as named events.
//!
//! # Commands
//! ```text
//! chaintail tail         --rpc-url <url> [--address <addr>]... [--json]
//! chaintail resolve-log  --address <addr> --topics <...> --data <hex>
//! chaintail index        --abi <path.json>
//! chaintail detect-proxy --address <addr> --rpc-url <url>
//! chaintail fetch-abi    --address <addr> [--output <path>]
//! ```

use alloy_primitives::{Address, B256};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chaintail_core::{
    abi::AbiDocument,
    error::SourceError,
    event::Log,
    source::{AbiSource, StorageReader},
};
use chaintail_evm::{build_index, proxy::slot_to_address, EventResolver, EIP1967_IMPLEMENTATION_SLOT};
use chaintail_observability::{init_tracing, LogConfig};
use chaintail_registry::{EtherscanAbiSource, LayeredAbiSource, StaticAbiSource};
use chaintail_rpc::{EthClient, HttpClientConfig, HttpRpcClient, RetryConfig};
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info};

mod config;
mod output;
mod tail;

use config::TailConfig;
use output::{render_json, render_line, LineSink};
use tail::Tailer;

#[derive(Parser)]
#[command(
    name = "chaintail",
    about = "Tail EVM logs and print them as named, decoded events",
    long_about = "
ChainTail follows the head of an Ethereum node and prints every log as a
named event. ABIs come from Etherscan (or a local directory); events emitted
through EIP-1967 proxies are resolved against their implementation contract.

ENVIRONMENT VARIABLES:
  CHAINTAIL_RPC_URL          HTTP JSON-RPC endpoint
  CHAINTAIL_ETHERSCAN_KEY    Etherscan API key
  RUST_LOG                   Overrides --log-level
",
    version
)]
struct Cli {
    #[command(flatten)]
    log: LogArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Default)]
struct LogArgs {
    /// Diagnostic log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Emit diagnostics as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

impl LogArgs {
    fn apply(&self, config: &mut LogConfig) {
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if self.log_json {
            config.json = true;
        }
    }

    /// Tracing for commands without a config file.
    fn init(&self) {
        let mut config = LogConfig::default();
        self.apply(&mut config);
        init_tracing(&config);
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the chain head and print every new log as an event
    Tail(TailArgs),

    /// Resolve a single log given its emitter, topics and data
    #[command(name = "resolve-log")]
    ResolveLog {
        /// Contract that emitted the log
        #[arg(long)]
        address: Address,
        /// topics[0] = event selector, topics[1..] = indexed arguments
        #[arg(long, num_args = 1..)]
        topics: Vec<B256>,
        /// Non-indexed arguments (hex, 0x-prefixed)
        #[arg(long, default_value = "0x")]
        data: String,
        #[arg(long)]
        block: Option<u64>,
        #[command(flatten)]
        sources: SourceArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the events of an ABI file with their selectors
    Index {
        /// ABI JSON file (bare array or artifact with an `abi` key)
        #[arg(long)]
        abi: PathBuf,
    },

    /// Read a contract's EIP-1967 implementation slot
    #[command(name = "detect-proxy")]
    DetectProxy {
        #[arg(long)]
        address: Address,
        #[arg(long, env = "CHAINTAIL_RPC_URL")]
        rpc_url: String,
    },

    /// Fetch a contract's verified ABI from Etherscan
    #[command(name = "fetch-abi")]
    FetchAbi {
        #[arg(long)]
        address: Address,
        #[arg(long, env = "CHAINTAIL_ETHERSCAN_KEY", hide_env_values = true)]
        etherscan_key: Option<String>,
        #[arg(long)]
        etherscan_base: Option<String>,
        /// Save ABI to this file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Where ABIs and storage come from; shared by `tail` and `resolve-log`.
#[derive(Args, Debug, Default)]
struct SourceArgs {
    /// HTTP JSON-RPC endpoint
    #[arg(long, env = "CHAINTAIL_RPC_URL")]
    rpc_url: Option<String>,
    /// Etherscan API key
    #[arg(long, env = "CHAINTAIL_ETHERSCAN_KEY", hide_env_values = true)]
    etherscan_key: Option<String>,
    /// Etherscan-compatible API base URL
    #[arg(long)]
    etherscan_base: Option<String>,
    /// Directory of `<address>.json` ABIs consulted before Etherscan
    #[arg(long)]
    abi_dir: Option<PathBuf>,
    /// Never contact Etherscan; use only --abi-dir
    #[arg(long)]
    offline: bool,
}

#[derive(Args, Debug, Default)]
struct TailArgs {
    /// JSON config file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(flatten)]
    sources: SourceArgs,
    /// Only tail this contract (repeatable)
    #[arg(long = "address")]
    addresses: Vec<Address>,
    /// Start at this block instead of the current head
    #[arg(long)]
    from_block: Option<u64>,
    /// Milliseconds between head polls
    #[arg(long)]
    poll_ms: Option<u64>,
    /// Logs resolved concurrently
    #[arg(long)]
    concurrency: Option<usize>,
    /// One JSON object per event
    #[arg(long)]
    json: bool,
}

impl TailArgs {
    fn into_config(self) -> Result<(TailConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => TailConfig::from_file(path)?,
            None => TailConfig::default(),
        };
        let s = self.sources;
        if let Some(url) = s.rpc_url {
            config.rpc_url = url;
        }
        if s.etherscan_key.is_some() {
            config.etherscan_api_key = s.etherscan_key;
        }
        if let Some(base) = s.etherscan_base {
            config.etherscan_base = base;
        }
        if s.abi_dir.is_some() {
            config.abi_dir = s.abi_dir;
        }
        if !self.addresses.is_empty() {
            config.addresses = self.addresses;
        }
        if self.from_block.is_some() {
            config.from_block = self.from_block;
        }
        if let Some(ms) = self.poll_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if self.json {
            config.json = true;
        }
        config.validate()?;
        Ok((config, s.offline))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli { log, command } = Cli::parse();

    match command {
        Commands::Tail(args) => {
            let (mut config, offline) = args.into_config()?;
            log.apply(&mut config.log);
            init_tracing(&config.log);
            cmd_tail(config, offline).await
        }
        Commands::ResolveLog { address, topics, data, block, sources, json } => {
            log.init();
            cmd_resolve_log(address, topics, &data, block, sources, json).await
        }
        Commands::Index { abi } => {
            log.init();
            cmd_index(&abi)
        }
        Commands::DetectProxy { address, rpc_url } => {
            log.init();
            cmd_detect_proxy(address, &rpc_url).await
        }
        Commands::FetchAbi { address, etherscan_key, etherscan_base, output } => {
            log.init();
            cmd_fetch_abi(address, etherscan_key, etherscan_base, output.as_deref()).await
        }
    }
}

// ─── Wiring ──────────────────────────────────────────────────────────────────

/// Storage reader for runs without a node: every read fails, so the proxy
/// fallback yields the zero address.
struct NoNode;

#[async_trait]
impl StorageReader for NoNode {
    async fn read_storage(&self, _: Address, _: B256) -> Result<B256, SourceError> {
        Err(SourceError::unavailable("no RPC URL configured"))
    }
}

fn build_node(config: &TailConfig) -> Result<EthClient<HttpRpcClient>> {
    let http = HttpRpcClient::new(
        config.rpc_url.clone(),
        HttpClientConfig {
            retry: RetryConfig {
                max_retries: config.max_retries,
                ..RetryConfig::default()
            },
            request_timeout: config.rpc_timeout(),
        },
    )?;
    Ok(EthClient::new(http)
        .with_max_block_range(config.max_block_range)
        .with_addresses(config.addresses.clone()))
}

fn build_abi_source(config: &TailConfig, offline: bool) -> Result<Arc<dyn AbiSource>> {
    let mut layered = LayeredAbiSource::new();
    if let Some(dir) = &config.abi_dir {
        let local = StaticAbiSource::new();
        let count = local
            .load_directory(dir)
            .with_context(|| format!("loading ABIs from {}", dir.display()))?;
        info!(dir = %dir.display(), count, "loaded local ABIs");
        layered = layered.push(Arc::new(local));
    }
    if !offline {
        let mut etherscan = EtherscanAbiSource::with_timeout(config.abi_timeout())?
            .with_base_url(config.etherscan_base.clone());
        if let Some(key) = &config.etherscan_api_key {
            etherscan = etherscan.with_api_key(key.clone());
        }
        layered = layered.push(Arc::new(etherscan));
    }
    if layered.is_empty() {
        bail!("--offline needs --abi-dir");
    }
    Ok(Arc::new(layered))
}

// ─── Command implementations ─────────────────────────────────────────────────

async fn cmd_tail(config: TailConfig, offline: bool) -> Result<()> {
    let node = Arc::new(build_node(&config)?);
    let resolver = EventResolver::new(build_abi_source(&config, offline)?, node.clone());

    let mut tailer = Tailer::new(node, resolver)
        .with_poll_interval(config.poll_interval())
        .with_concurrency(config.concurrency);
    if let Some(block) = config.from_block {
        tailer = tailer.starting_at(block);
    }

    info!(
        rpc = %config.rpc_url,
        contracts = config.addresses.len(),
        poll_ms = config.poll_interval_ms,
        "tailing"
    );
    let stdout = std::io::stdout();
    let mut sink = LineSink::new(stdout.lock(), config.json);
    tailer
        .run(&mut sink, until_signalled(tokio::signal::ctrl_c()))
        .await
}

/// Completes when `signal` fires. If the handler cannot be installed this
/// never completes, so the process runs until it is killed.
async fn until_signalled<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "cannot listen for Ctrl-C; stop the process to exit");
        std::future::pending::<()>().await;
    }
}

async fn cmd_resolve_log(
    address: Address,
    topics: Vec<B256>,
    data: &str,
    block: Option<u64>,
    sources: SourceArgs,
    as_json: bool,
) -> Result<()> {
    let data = hex::decode(data.strip_prefix("0x").unwrap_or(data)).context("invalid data hex")?;
    let mut log = Log::new(address, topics, data);
    log.block_number = block;

    let mut config = TailConfig::default();
    if let Some(key) = sources.etherscan_key {
        config.etherscan_api_key = Some(key);
    }
    if let Some(base) = sources.etherscan_base {
        config.etherscan_base = base;
    }
    config.abi_dir = sources.abi_dir;
    let abi_source = build_abi_source(&config, sources.offline)?;

    let resolver = match sources.rpc_url {
        Some(url) => {
            config.rpc_url = url;
            config.validate()?;
            EventResolver::new(abi_source, Arc::new(build_node(&config)?))
        }
        None => EventResolver::new(abi_source, Arc::new(NoNode)),
    };

    let event = resolver.resolve(&log).await?;
    if as_json {
        println!("{}", render_json(&event)?);
    } else {
        println!("{}", render_line(&event));
    }
    Ok(())
}

fn cmd_index(path: &std::path::Path) -> Result<()> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let abi = AbiDocument::from_json(&content).context("invalid ABI JSON")?;
    let index = build_index(&abi);

    let mut events: Vec<_> = index
        .iter()
        .map(|(selector, template)| (template.canonical_signature(), *selector))
        .collect();
    events.sort();
    for (signature, selector) in &events {
        println!("{selector}  {signature}");
    }
    if index.collisions() > 0 {
        eprintln!("{} event(s) dropped: selector already declared", index.collisions());
    }
    eprintln!("{} event(s) in {} ABI entries", index.len(), abi.len());
    Ok(())
}

async fn cmd_detect_proxy(address: Address, rpc_url: &str) -> Result<()> {
    let config = TailConfig {
        rpc_url: rpc_url.to_string(),
        ..TailConfig::default()
    };
    config.validate()?;
    let node = build_node(&config)?;
    let raw = node
        .storage_at(address, EIP1967_IMPLEMENTATION_SLOT)
        .await
        .context("reading EIP-1967 implementation slot")?;

    let implementation = slot_to_address(raw);
    println!("Contract:       {address}");
    println!("Slot:           {EIP1967_IMPLEMENTATION_SLOT}");
    println!("Raw value:      {raw}");
    if implementation.is_zero() {
        println!("Implementation: none (not an EIP-1967 proxy)");
    } else {
        println!("Implementation: {implementation}");
    }
    Ok(())
}

async fn cmd_fetch_abi(
    address: Address,
    etherscan_key: Option<String>,
    etherscan_base: Option<String>,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let mut source = EtherscanAbiSource::new()?;
    if let Some(key) = etherscan_key {
        source = source.with_api_key(key);
    }
    if let Some(base) = etherscan_base {
        source = source.with_base_url(base);
    }

    let abi = match source.fetch(address).await? {
        Some(abi) => abi,
        None => bail!("no verified ABI for {address}"),
    };
    let json = serde_json::to_string_pretty(&abi)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("cannot write {}", path.display()))?;
            eprintln!("{} ABI entries written to {}", abi.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
