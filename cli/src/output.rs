//! Console rendering of resolved events.

use anyhow::Result;
use chaintail_core::event::ResolvedEvent;
use std::io::Write;

/// `[Block N] [Contract 0x…, ProxiedTo 0x…] Name(args…)`
pub fn render_line(event: &ResolvedEvent) -> String {
    let block = match event.block_number {
        Some(n) => n.to_string(),
        None => "pending".to_string(),
    };
    let proxy = match event.proxied_to {
        Some(target) => format!(", ProxiedTo {target}"),
        None => String::new(),
    };
    format!(
        "[Block {block}] [Contract {}{proxy}] {}",
        event.contract_address,
        event.full_signature()
    )
}

/// One JSON object per event.
pub fn render_json(event: &ResolvedEvent) -> Result<String> {
    let mut value = serde_json::to_value(event)?;
    value["signature"] = serde_json::Value::String(event.full_signature());
    Ok(serde_json::to_string(&value)?)
}

/// Receives resolved events in chain order.
pub trait EventSink {
    fn emit(&mut self, event: &ResolvedEvent) -> Result<()>;
}

/// Writes one rendered line per event.
pub struct LineSink<W> {
    writer: W,
    json: bool,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W, json: bool) -> Self {
        Self { writer, json }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for LineSink<W> {
    fn emit(&mut self, event: &ResolvedEvent) -> Result<()> {
        let line = if self.json {
            render_json(event)?
        } else {
            render_line(event)
        };
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl EventSink for Vec<ResolvedEvent> {
    fn emit(&mut self, event: &ResolvedEvent) -> Result<()> {
        self.push(event.clone());
        Ok(())
    }
}
