//! Vault file persistence: atomic writes with owner-only permissions

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn load(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading vault file {}", path.display()))
}

pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Write-to-temp-then-rename: a crashed write never clobbers the current
/// record, and the rename is the single visible mutation.
pub fn save(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, data).with_context(|| format!("writing {}", tmp.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting {}", tmp.display()))?;
    }

    fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}
