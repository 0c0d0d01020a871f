//! Output formatting helpers for the CLI.

use comfy_table::presets::NOTHING;
use comfy_table::{ContentArrangement, Table};

use blurg_core::{Entry, EntryStore, LocalDiary, RemoteDiary};

/// Convert an entry to JSON for output.
pub fn entry_json(entry: &Entry) -> serde_json::Value {
    serde_json::json!({
        "id": entry.id,
        "text": entry.text,
        "date": entry.date,
    })
}

/// Convert multiple entries to JSON array for output.
pub fn entries_json(entries: &[Entry]) -> Vec<serde_json::Value> {
    entries.iter().map(entry_json).collect()
}

fn plain_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers.to_vec());
    for i in 0..headers.len() {
        if let Some(column) = table.column_mut(i) {
            column.set_padding((0, 2));
        }
    }
    table
}

/// Render entries as an ID / DATE / TEXT table.
pub fn entries_table(entries: &[Entry]) -> String {
    let mut table = plain_table(&["ID", "DATE", "TEXT"]);
    for entry in entries {
        table.add_row(vec![entry.id.to_string(), entry.date_str(), entry.text.clone()]);
    }
    table.to_string()
}

/// Render every diary, marking the current one with `*`.
pub fn diaries_table(current: &str, local: &[LocalDiary], remote: &[RemoteDiary]) -> String {
    let marker = |name: &str| (if name == current { "*" } else { "" }).to_string();

    let mut table = plain_table(&["", "NAME", "KIND", "SERVER"]);
    for diary in local {
        table.add_row(vec![
            marker(diary.name()),
            diary.name().to_string(),
            "local".to_string(),
            String::new(),
        ]);
    }
    for diary in remote {
        table.add_row(vec![
            marker(diary.name()),
            diary.name().to_string(),
            "remote".to_string(),
            format!("{} ({})", diary.base_url(), diary.username()),
        ]);
    }
    table.to_string()
}
