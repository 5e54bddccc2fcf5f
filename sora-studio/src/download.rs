//! Saving a gallery video to disk as `sora-<id>.<ext>`.

use std::fs;
use std::path::{Path, PathBuf};

use sora_core::{DataUrl, SoraError, VideoRecord};

/// File name a record downloads as, e.g. `sora-1700000000000.mp4`.
pub fn file_name(record: &VideoRecord) -> Result<String, SoraError> {
    let data = DataUrl::parse(&record.payload)?;
    Ok(format_name(&record.id, data.extension()))
}

fn format_name(id: &str, extension: &str) -> String {
    let safe_id: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("sora-{}.{}", safe_id, extension)
}

/// Write the decoded payload of `record` into `dir`. Returns the file path.
pub fn save_record(record: &VideoRecord, dir: &Path) -> Result<PathBuf, SoraError> {
    let data = DataUrl::parse(&record.payload)?;
    fs::create_dir_all(dir)?;

    let path = dir.join(format_name(&record.id, data.extension()));
    fs::write(&path, &data.bytes)?;

    tracing::info!("Saved video {} to {} ({} bytes)", record.id, path.display(), data.bytes.len());
    Ok(path)
}
