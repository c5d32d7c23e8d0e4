//! Raw logs, event templates, and resolved events.

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::signature;
use crate::types::{AbiType, AbiValue};

/// Name given to events whose selector matches no known ABI.
pub const UNKNOWN_EVENT_NAME: &str = "Anonymous/Unknown";

/// A raw, undecoded log record as emitted by a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    /// Contract address that emitted the log
    pub address: Address,
    /// topics[0] is the event selector; topics[1..] carry indexed arguments
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed arguments
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
}

impl Log {
    pub fn new(address: Address, topics: Vec<B256>, data: impl Into<Bytes>) -> Self {
        Self {
            address,
            topics,
            data: data.into(),
            block_number: None,
            transaction_hash: None,
            log_index: None,
        }
    }

    pub fn at_block(mut self, block_number: u64) -> Self {
        self.block_number = Some(block_number);
        self
    }

    /// topics[0], if present.
    pub fn selector(&self) -> Option<B256> {
        self.topics.first().copied()
    }
}

/// One argument of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventArgument {
    /// Declared name; may be empty
    pub name: String,
    #[serde(rename = "type")]
    pub ty: AbiType,
    /// Carried in the topic list (true) or the data payload (false)
    pub indexed: bool,
    /// Decoded value; `None` until decode time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<AbiValue>,
}

impl EventArgument {
    pub fn new(name: impl Into<String>, ty: AbiType, indexed: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed,
            value: None,
        }
    }

    /// `[indexed ]<type> <name>[=<value>]`
    fn render(&self) -> String {
        let mut out = String::new();
        if self.indexed {
            out.push_str("indexed ");
        }
        out.push_str(&self.ty.to_string());
        out.push(' ');
        out.push_str(&self.name);
        if let Some(value) = &self.value {
            out.push('=');
            out.push_str(&value.to_string());
        }
        out
    }
}

/// An event as declared in an ABI: a name and its ordered arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTemplate {
    pub name: String,
    pub arguments: Vec<EventArgument>,
}

impl EventTemplate {
    pub fn new(name: impl Into<String>, arguments: Vec<EventArgument>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// `Name(type1,type2,...)`, recomputed from the arguments on every call.
    pub fn canonical_signature(&self) -> String {
        canonical_signature(&self.name, &self.arguments)
    }

    /// Human-readable signature including argument names and decoded values.
    pub fn full_signature(&self) -> String {
        full_signature(&self.name, &self.arguments)
    }

    /// keccak256 of the canonical signature.
    pub fn selector(&self) -> B256 {
        signature::digest(&self.canonical_signature())
    }

    /// Indexed arguments in declaration order.
    pub fn indexed_arguments(&self) -> impl Iterator<Item = &EventArgument> {
        self.arguments.iter().filter(|a| a.indexed)
    }

    /// Unindexed (data payload) arguments in declaration order.
    pub fn data_arguments(&self) -> impl Iterator<Item = &EventArgument> {
        self.arguments.iter().filter(|a| !a.indexed)
    }
}

fn canonical_signature(name: &str, arguments: &[EventArgument]) -> String {
    let types: Vec<_> = arguments.iter().map(|a| a.ty.to_string()).collect();
    format!("{name}({})", types.join(","))
}

fn full_signature(name: &str, arguments: &[EventArgument]) -> String {
    let args: Vec<_> = arguments.iter().map(EventArgument::render).collect();
    format!("{name}({})", args.join(","))
}

/// A log resolved against its emitter's (or its proxy target's) ABI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEvent {
    pub name: String,
    pub arguments: Vec<EventArgument>,
    /// The address that emitted the log
    pub contract_address: Address,
    /// Set only when the event was found through the proxy fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxied_to: Option<Address>,
    /// The log's topics[0]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
}

impl ResolvedEvent {
    /// Build a resolved event from a copy of `template` whose arguments have
    /// been decoded.
    pub fn from_template(
        template: &EventTemplate,
        arguments: Vec<EventArgument>,
        log: &Log,
        proxied_to: Option<Address>,
    ) -> Self {
        Self {
            name: template.name.clone(),
            arguments,
            contract_address: log.address,
            proxied_to,
            selector: log.selector(),
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
            log_index: log.log_index,
        }
    }

    /// Placeholder for a log whose selector matches no known ABI.
    pub fn unknown(log: &Log) -> Self {
        Self {
            name: UNKNOWN_EVENT_NAME.to_string(),
            arguments: Vec::new(),
            contract_address: log.address,
            proxied_to: None,
            selector: log.selector(),
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
            log_index: log.log_index,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_EVENT_NAME && self.arguments.is_empty()
    }

    /// Look up a decoded argument value by name.
    pub fn arg(&self, name: &str) -> Option<&AbiValue> {
        self.arguments
            .iter()
            .find(|a| a.name == name)
            .and_then(|a| a.value.as_ref())
    }

    pub fn canonical_signature(&self) -> String {
        canonical_signature(&self.name, &self.arguments)
    }

    pub fn full_signature(&self) -> String {
        full_signature(&self.name, &self.arguments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{b256, U256};

    fn transfer_template() -> EventTemplate {
        EventTemplate::new(
            "Transfer",
            vec![
                EventArgument::new("from", AbiType::Address, true),
                EventArgument::new("to", AbiType::Address, true),
                EventArgument::new("value", AbiType::Uint(256), false),
            ],
        )
    }

    #[test]
    fn canonical_signature_is_type_only() {
        assert_eq!(
            transfer_template().canonical_signature(),
            "Transfer(address,address,uint256)"
        );
    }

    #[test]
    fn selector_matches_erc20_transfer() {
        assert_eq!(
            transfer_template().selector(),
            b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
        );
    }

    #[test]
    fn full_signature_includes_names_and_values() {
        let mut template = transfer_template();
        assert_eq!(
            template.full_signature(),
            "Transfer(indexed address from,indexed address to,uint256 value)"
        );
        template.arguments[2].value = Some(AbiValue::Uint(U256::from(5u64)));
        assert!(template.full_signature().ends_with("uint256 value=5)"));
    }

    #[test]
    fn copied_template_keeps_its_selector() {
        let template = transfer_template();
        let copy = template.clone();
        let log = Log::new(Address::ZERO, vec![template.selector()], Vec::new());
        let resolved = ResolvedEvent::from_template(&copy, copy.arguments.clone(), &log, None);
        assert_eq!(resolved.canonical_signature(), template.canonical_signature());
        assert_eq!(
            crate::signature::digest(&resolved.canonical_signature()),
            template.selector()
        );
    }

    #[test]
    fn argument_split_keeps_order() {
        let template = transfer_template();
        let indexed: Vec<_> = template.indexed_arguments().map(|a| a.name.as_str()).collect();
        let data: Vec<_> = template.data_arguments().map(|a| a.name.as_str()).collect();
        assert_eq!(indexed, ["from", "to"]);
        assert_eq!(data, ["value"]);
    }

    #[test]
    fn unknown_placeholder() {
        let log = Log::new(Address::repeat_byte(1), vec![B256::repeat_byte(9)], Vec::new());
        let event = ResolvedEvent::unknown(&log);
        assert!(event.is_unknown());
        assert_eq!(event.full_signature(), "Anonymous/Unknown()");
        assert_eq!(event.contract_address, log.address);
        assert!(event.proxied_to.is_none());
    }
}
