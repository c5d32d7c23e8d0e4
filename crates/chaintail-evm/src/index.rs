//! ABI index: selector → event template.

use alloy_primitives::B256;
use chaintail_core::{
    abi::{AbiDocument, AbiEntry},
    error::DecodeError,
    event::{EventArgument, EventTemplate},
    types::AbiType,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// The events of one ABI document, keyed by selector.
#[derive(Debug, Clone, Default)]
pub struct AbiIndex {
    events: HashMap<B256, EventTemplate>,
    collisions: usize,
}

impl AbiIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Insert unless the selector is already taken; the first declaration wins.
    /// Returns `false` on collision.
    fn insert_first(&mut self, selector: B256, template: EventTemplate) -> bool {
        match self.events.entry(selector) {
            std::collections::hash_map::Entry::Occupied(existing) => {
                warn!(
                    %selector,
                    kept = %existing.get().canonical_signature(),
                    dropped = %template.canonical_signature(),
                    "selector collision in ABI; keeping first declaration"
                );
                self.collisions += 1;
                false
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(template);
                true
            }
        }
    }

    pub fn get(&self, selector: &B256) -> Option<&EventTemplate> {
        self.events.get(selector)
    }

    pub fn contains(&self, selector: &B256) -> bool {
        self.events.contains_key(selector)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events dropped because an earlier event had the same selector.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    pub fn iter(&self) -> impl Iterator<Item = (&B256, &EventTemplate)> {
        self.events.iter()
    }
}

/// Build the selector index of an ABI document.
///
/// Only `event` entries are considered. Malformed entries and anonymous
/// events are skipped; the result is always a usable (possibly empty) index.
pub fn build_index(abi: &AbiDocument) -> AbiIndex {
    let mut index = AbiIndex::empty();
    for (position, entry) in abi.entries().iter().enumerate() {
        if entry.get("type").and_then(Value::as_str) != Some("event") {
            continue;
        }
        match template_from_entry(entry) {
            Ok(Some(template)) => {
                let selector = template.selector();
                index.insert_first(selector, template);
            }
            Ok(None) => {}
            Err(reason) => debug!(position, %reason, "skipping malformed ABI event entry"),
        }
    }
    index
}

/// `Ok(None)` for anonymous events, which carry no selector topic.
fn template_from_entry(entry: &Value) -> Result<Option<EventTemplate>, String> {
    let entry: AbiEntry = serde_json::from_value(entry.clone()).map_err(|e| e.to_string())?;
    if entry.anonymous {
        debug!(name = %entry.name, "skipping anonymous event");
        return Ok(None);
    }

    let arguments = entry
        .inputs
        .iter()
        .map(|input| {
            AbiType::from_components(&input.ty, &input.components)
                .map(|ty| EventArgument::new(input.name.clone(), ty, input.indexed))
        })
        .collect::<Result<Vec<_>, DecodeError>>()
        .map_err(|e| format!("{}: {e}", entry.name))?;

    Ok(Some(EventTemplate::new(entry.name, arguments)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;
    use serde_json::json;

    const TRANSFER: B256 =
        b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

    fn transfer_entry() -> Value {
        json!({
            "type": "event",
            "name": "Transfer",
            "anonymous": false,
            "inputs": [
                { "name": "from", "type": "address", "indexed": true },
                { "name": "to", "type": "address", "indexed": true },
                { "name": "value", "type": "uint256", "indexed": false }
            ]
        })
    }

    #[test]
    fn indexes_events_only() {
        let doc = AbiDocument::new(vec![
            json!({ "type": "function", "name": "transfer", "inputs": [], "outputs": [] }),
            transfer_entry(),
            json!({ "type": "constructor", "inputs": [] }),
        ]);
        let index = build_index(&doc);
        assert_eq!(index.len(), 1);
        let template = index.get(&TRANSFER).unwrap();
        assert_eq!(template.name, "Transfer");
        assert_eq!(template.arguments.len(), 3);
        assert_eq!(template.selector(), TRANSFER);
    }

    #[test]
    fn first_declaration_wins() {
        let mut renamed = transfer_entry();
        renamed["inputs"][0]["name"] = json!("sender");
        let doc = AbiDocument::new(vec![transfer_entry(), renamed]);

        let index = build_index(&doc);
        assert_eq!(index.len(), 1);
        assert_eq!(index.collisions(), 1);
        assert_eq!(index.get(&TRANSFER).unwrap().arguments[0].name, "from");
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let doc = AbiDocument::new(vec![
            json!({ "type": "event", "inputs": [] }),
            json!({ "type": "event", "name": "NoInputs" }),
            json!({ "type": "event", "name": "Bad", "inputs": [{ "name": "x", "type": "fixed128x18" }] }),
            json!({ "type": "event", "name": "Bad2", "inputs": [{ "name": "x" }] }),
            json!("not an object"),
            transfer_entry(),
        ]);
        let index = build_index(&doc);
        assert_eq!(index.len(), 1);
        assert!(index.contains(&TRANSFER));
    }

    #[test]
    fn anonymous_events_are_skipped() {
        let mut anon = transfer_entry();
        anon["anonymous"] = json!(true);
        assert!(build_index(&AbiDocument::new(vec![anon])).is_empty());
    }

    #[test]
    fn tuple_inputs_use_canonical_form() {
        let doc = AbiDocument::new(vec![json!({
            "type": "event",
            "name": "OrderFilled",
            "inputs": [
                { "name": "id", "type": "bytes32", "indexed": true },
                { "name": "order", "type": "tuple", "indexed": false, "components": [
                    { "name": "maker", "type": "address" },
                    { "name": "amounts", "type": "uint256[]" }
                ]}
            ]
        })]);
        let index = build_index(&doc);
        let (_, template) = index.iter().next().unwrap();
        assert_eq!(
            template.canonical_signature(),
            "OrderFilled(bytes32,(address,uint256[]))"
        );
    }

    #[test]
    fn empty_document_gives_empty_index() {
        assert!(build_index(&AbiDocument::empty()).is_empty());
    }
}
