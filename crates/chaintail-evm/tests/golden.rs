//! Golden fixture integration tests.
//!
//! Each test loads a raw log from `fixtures/logs/`, resolves it against the
//! ABIs in `fixtures/abis/` (one `<address>.json` per contract), and checks
//! the resolved event against the expectation recorded in the fixture JSON.

use alloy_primitives::{address, Address, B256, I256, U256};
use async_trait::async_trait;
use chaintail_core::{
    abi::AbiDocument,
    error::{ResolveError, SourceError},
    event::Log,
    source::{AbiSource, StorageReader},
    types::AbiValue,
};
use chaintail_evm::{build_index, EventResolver, EIP1967_IMPLEMENTATION_SLOT};
use chaintail_registry::StaticAbiSource;
use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

const PROXY: Address = address!("949b3B3c098348b879C9e4F15cecc8046d9C8A8c");
const IMPLEMENTATION: Address = address!("fe7de3c1e1bd252c67667b56347cabfc6df08df4");
const WETH: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn fixture_path(rel: &str) -> PathBuf {
    let mut p = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    p.push("fixtures");
    p.push(rel);
    p
}

fn hex_to_bytes(s: &str) -> Vec<u8> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).unwrap_or_else(|e| panic!("bad hex '{s}': {e}"))
}

fn load_fixture(name: &str) -> serde_json::Value {
    let json = std::fs::read_to_string(fixture_path(&format!("logs/{name}")))
        .unwrap_or_else(|e| panic!("fixture {name} not found: {e}"));
    serde_json::from_str(&json).unwrap()
}

fn log_from_fixture(f: &serde_json::Value) -> Log {
    let mut log = Log::new(
        f["contractAddress"].as_str().unwrap().parse().unwrap(),
        f["topics"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t.as_str().unwrap().parse::<B256>().unwrap())
            .collect(),
        hex_to_bytes(f["data"].as_str().unwrap()),
    )
    .at_block(f["blockNumber"].as_u64().unwrap());
    log.transaction_hash = Some(f["txHash"].as_str().unwrap().parse().unwrap());
    log.log_index = f["logIndex"].as_u64();
    log
}

/// Counts every fetch it forwards to the fixture ABI directory.
struct CountingSource {
    inner: StaticAbiSource,
    fetched: Mutex<Vec<Address>>,
}

impl CountingSource {
    fn fixtures() -> Self {
        let inner = StaticAbiSource::new();
        inner
            .load_directory(&fixture_path("abis"))
            .expect("failed to load fixture ABIs");
        Self {
            inner,
            fetched: Mutex::new(Vec::new()),
        }
    }

    fn fetched(&self) -> Vec<Address> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl AbiSource for CountingSource {
    async fn fetch_abi(&self, address: Address) -> Result<Option<AbiDocument>, SourceError> {
        self.fetched.lock().unwrap().push(address);
        self.inner.fetch_abi(address).await
    }
}

/// EIP-1967 slots of the fixture chain: only `PROXY` is a proxy.
#[derive(Default)]
struct FixtureStorage {
    reads: AtomicUsize,
}

#[async_trait]
impl StorageReader for FixtureStorage {
    async fn read_storage(&self, address: Address, slot: B256) -> Result<B256, SourceError> {
        assert_eq!(slot, EIP1967_IMPLEMENTATION_SLOT);
        self.reads.fetch_add(1, Ordering::SeqCst);
        let slots = HashMap::from([(PROXY, IMPLEMENTATION)]);
        Ok(slots.get(&address).copied().unwrap_or_default().into_word())
    }
}

fn resolver() -> (EventResolver, Arc<CountingSource>, Arc<FixtureStorage>) {
    let source = Arc::new(CountingSource::fixtures());
    let storage = Arc::new(FixtureStorage::default());
    (
        EventResolver::new(source.clone(), storage.clone()),
        source,
        storage,
    )
}

async fn check_golden(name: &str) {
    let fixture = load_fixture(name);
    let log = log_from_fixture(&fixture);
    let expected = &fixture["expected"];
    let (resolver, _, _) = resolver();

    let event = resolver
        .resolve(&log)
        .await
        .unwrap_or_else(|e| panic!("{name}: {e}"));

    assert_eq!(event.name, expected["name"].as_str().unwrap(), "{name}");
    assert_eq!(
        event.full_signature(),
        expected["fullSignature"].as_str().unwrap(),
        "{name}"
    );
    let proxied_to = expected["proxiedTo"].as_str().map(|a| a.parse::<Address>().unwrap());
    assert_eq!(event.proxied_to, proxied_to, "{name}");
    assert_eq!(event.contract_address, log.address);
    assert_eq!(event.block_number, log.block_number);
    assert_eq!(event.transaction_hash, log.transaction_hash);
    assert_eq!(event.log_index, log.log_index);
}

// ─── Golden logs ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn weth_deposit_golden() {
    check_golden("weth-deposit.json").await;
}

#[tokio::test]
async fn proxied_transfer_golden() {
    check_golden("proxied-transfer.json").await;
}

#[tokio::test]
async fn uniswap_v3_swap_golden() {
    check_golden("uniswap-v3-swap.json").await;
}

#[tokio::test]
async fn unknown_selector_golden() {
    check_golden("unknown-selector.json").await;
}

// ─── Index ────────────────────────────────────────────────────────────────────

#[test]
fn weth_index_holds_its_four_events() {
    let json = std::fs::read_to_string(fixture_path(&format!("abis/{WETH}.json"))).unwrap();
    let index = build_index(&AbiDocument::from_json(&json).unwrap());
    assert_eq!(index.len(), 4);

    let transfer: B256 = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        .parse()
        .unwrap();
    let template = index.get(&transfer).expect("Transfer must be indexed");
    assert_eq!(template.canonical_signature(), "Transfer(address,address,uint256)");
}

// ─── Resolver behaviour ───────────────────────────────────────────────────────

#[tokio::test]
async fn swap_values_are_signed_and_sized() {
    let log = log_from_fixture(&load_fixture("uniswap-v3-swap.json"));
    let (resolver, _, _) = resolver();
    let event = resolver.resolve(&log).await.unwrap();

    assert_eq!(
        event.arg("amount0"),
        Some(&AbiValue::Int(I256::try_from(-1_000_000i64).unwrap()))
    );
    assert_eq!(event.arg("sqrtPriceX96"), Some(&AbiValue::Uint(U256::from(1u64))));
    assert_eq!(
        event.arg("tick"),
        Some(&AbiValue::Int(I256::try_from(-200_000i64).unwrap()))
    );
}

#[tokio::test]
async fn proxy_own_events_resolve_directly() {
    // Upgraded(address) is declared by the proxy itself.
    let upgraded: B256 = "0xbc7cd75a20ee27fd9adebab32041f755214dbc6bffa90cc0225b39da2e5c2d3b"
        .parse()
        .unwrap();
    let log = Log::new(PROXY, vec![upgraded, IMPLEMENTATION.into_word()], Vec::new());
    let (resolver, _, storage) = resolver();

    let event = resolver.resolve(&log).await.unwrap();
    assert_eq!(event.name, "Upgraded");
    assert!(event.proxied_to.is_none());
    assert_eq!(event.arg("implementation"), Some(&AbiValue::Address(IMPLEMENTATION)));
    assert_eq!(storage.reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_address_is_never_fetched() {
    let fixture = load_fixture("unknown-selector.json");
    let log = log_from_fixture(&fixture);
    let (resolver, source, storage) = resolver();

    assert!(resolver.resolve(&log).await.unwrap().is_unknown());
    assert!(resolver.resolve(&log).await.unwrap().is_unknown());

    assert_eq!(source.fetched(), vec![WETH]);
    assert_eq!(storage.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn abis_are_fetched_once_per_address() {
    let log = log_from_fixture(&load_fixture("proxied-transfer.json"));
    let (resolver, source, storage) = resolver();

    for _ in 0..3 {
        let event = resolver.resolve(&log).await.unwrap();
        assert_eq!(event.proxied_to, Some(IMPLEMENTATION));
    }
    assert_eq!(source.fetched(), vec![PROXY, IMPLEMENTATION]);
    assert_eq!(storage.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn truncated_data_is_a_malformed_payload() {
    let mut log = log_from_fixture(&load_fixture("weth-deposit.json"));
    log.data = log.data[..16].to_vec().into();
    let (resolver, _, _) = resolver();

    let err = resolver.resolve(&log).await.unwrap_err();
    assert!(matches!(err, ResolveError::MalformedPayload { .. }));
    assert_eq!(err.address(), WETH);
}

#[tokio::test]
async fn resolve_all_keeps_fixture_order() {
    let names = [
        "weth-deposit.json",
        "proxied-transfer.json",
        "unknown-selector.json",
        "uniswap-v3-swap.json",
    ];
    let logs: Vec<Log> = names
        .iter()
        .map(|n| log_from_fixture(&load_fixture(n)))
        .collect();
    let (resolver, _, _) = resolver();

    let resolved: Vec<String> = resolver
        .resolve_all(&logs, 8)
        .await
        .into_iter()
        .map(|r| r.unwrap().name)
        .collect();
    assert_eq!(resolved, ["Deposit", "Transfer", "Anonymous/Unknown", "Swap"]);
}
