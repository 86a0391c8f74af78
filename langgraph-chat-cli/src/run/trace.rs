//! `trace`: consolidate a saved raw event log.
//!
//! Accepts a JSON array of `{event, data}` records or one record per line (JSON lines).

use std::io::Write;

use langgraph_chat::{consolidate, Clock, RawEvent};

use crate::config::Error;
use crate::render::render_trace;

/// Parses raw events from a JSON array or JSON lines; blank lines are skipped.
pub fn parse_events(input: &str) -> Result<Vec<RawEvent>, Error> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| -> Result<RawEvent, Error> {
            serde_json::from_str(line).map_err(|e| format!("line {}: {}", i + 1, e).into())
        })
        .collect()
}

/// Parses `input`, consolidates it and writes the rendered trace to `out`.
pub fn run_trace<W: Write, C: Clock + ?Sized>(
    input: &str,
    clock: &C,
    out: &mut W,
) -> Result<usize, Error> {
    let events = parse_events(input)?;
    let records = consolidate(&events, clock);
    tracing::debug!(events = events.len(), records = records.len(), "trace consolidated");
    if !records.is_empty() {
        writeln!(out, "{}", render_trace(&records))?;
    }
    Ok(records.len())
}
