//! Audit log of refresh snapshots.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// Append a payload as one JSON line to the audit file.
///
/// # Arguments
/// * `path` - Path to the audit file; nothing is written when `None`
/// * `payload` - Serializable payload to write
pub fn append_sample<P: AsRef<Path>, T: Serialize>(
    path: Option<P>,
    payload: &T,
) -> anyhow::Result<()> {
    if let Some(audit_path) = path {
        let json = serde_json::to_string(payload)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&audit_path)?;
        writeln!(file, "{}", json)?;
        debug!("Appended audit sample to {:?}", audit_path.as_ref());
    }
    Ok(())
}
