//! CLI presentation: text and json formatters for consistency envelopes.

use crate::error::PasselError;
use crate::types::PossumState;
use crate::wire::ConsistencyEnvelope;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::{Cell, Color, Table};
use owo_colors::OwoColorize;
use std::collections::BTreeSet;

fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn state_cell(state: Option<&PossumState>) -> Cell {
    match state {
        Some(PossumState::Alive) => Cell::new("alive").fg(Color::Green),
        Some(PossumState::Dead) => Cell::new("dead").fg(Color::Red),
        None => Cell::new("-"),
    }
}

/// One row per possum, one column per reporting peer.
///
/// `peers` labels the columns when it matches the number of snapshots; otherwise columns
/// are numbered in passel order.
pub fn format_consistency_text(envelope: &ConsistencyEnvelope, peers: &[String]) -> String {
    let mut out = String::new();
    let verdict = if envelope.consistent {
        format!("{}", "consistent".green())
    } else {
        format!("{}", "inconsistent".red())
    };
    out.push_str(&format!(
        "{}\n\n  Verdict: {}\n",
        format_section_heading("Passel"),
        verdict
    ));
    if let Some(ref error) = envelope.error {
        out.push_str(&format!("  Error: {}\n", error));
    }

    let snapshots = match envelope.passel_states {
        Some(ref snapshots) if !snapshots.is_empty() => snapshots,
        _ => return out,
    };

    let mut header = vec!["Possum".to_string()];
    if peers.len() == snapshots.len() {
        header.extend(peers.iter().map(|p| format!("via {}", p)));
    } else {
        header.extend((1..=snapshots.len()).map(|i| format!("Peer {}", i)));
    }

    let possums: BTreeSet<&String> = snapshots.iter().flat_map(|s| s.keys()).collect();
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(header);
    for possum in possums {
        let mut row = vec![Cell::new(possum)];
        row.extend(snapshots.iter().map(|s| state_cell(s.get(possum))));
        table.add_row(row);
    }
    out.push_str(&format!("\n{}\n", table));
    out
}

pub fn format_consistency_json(envelope: &ConsistencyEnvelope) -> Result<String, PasselError> {
    serde_json::to_string_pretty(envelope)
        .map_err(|e| PasselError::Validation(format!("Failed to render JSON: {}", e)))
}
