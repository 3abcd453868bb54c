//! Shared-key file handling.
//!
//! The key is 16 bytes stored as hex. First run generates one; the
//! operator copies the file to the peer out-of-band. Both ends must
//! hold the same key or every frame fails authentication.

use std::fs;
use std::path::Path;

use anyhow::Context;

use canseal_core::codec::SecretKey;

pub fn load_or_generate(path: &Path) -> anyhow::Result<SecretKey> {
    if path.exists() {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read key file {}", path.display()))?;
        let key = SecretKey::from_hex(text.trim())
            .with_context(|| format!("key file {} is not 16 hex-encoded bytes", path.display()))?;
        tracing::info!(path = %path.display(), "loaded shared key");
        return Ok(key);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let key = SecretKey::generate();
    fs::write(path, format!("{}\n", key.to_hex().as_str()))
        .with_context(|| format!("failed to write key file {}", path.display()))?;
    tracing::warn!(
        path = %path.display(),
        "generated a new shared key; copy it to the peer before sending"
    );
    Ok(key)
}
