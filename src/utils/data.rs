use crate::error::StoreError;
use crate::store::LedgerSnapshot;
use crate::utils::stats::FaabAdjustment;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Save the ledger to a JSON snapshot file
pub fn save_snapshot(snapshot: &LedgerSnapshot, path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    // Write then rename so a crash never leaves a half-written ledger
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Load a ledger snapshot, or an empty ledger if the file does not exist yet
pub fn load_snapshot(path: &Path) -> Result<LedgerSnapshot, StoreError> {
    if !path.exists() {
        return Ok(LedgerSnapshot::default());
    }
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Write the FAAB adjustment report as CSV
pub fn write_faab_report<W: Write>(rows: &[FaabAdjustment], writer: W) -> crate::error::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    // Serialized rows write their own header; an empty report still needs one
    if rows.is_empty() {
        csv_writer.write_record(["Roster ID", "Team Name", "Owner Name", "FAAB Adjustment", "Notes"])?;
    }
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Save the FAAB adjustment report to a CSV file
pub fn save_faab_report_to_csv(rows: &[FaabAdjustment], filename: &Path) -> Result<()> {
    let file = std::fs::File::create(filename).context("Failed to create CSV file")?;
    write_faab_report(rows, file).context("Failed to write FAAB report")
}
