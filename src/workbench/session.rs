use std::{fs, path::Path};

use anyhow::{Context, Result};

use super::store::Workbench;

impl Workbench {
    /// Loads the active record set; a missing file is an empty workbench.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading session {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing session {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating session directory {}", parent.display()))?;
        }
        let encoded = serde_json::to_string_pretty(self).context("encoding session")?;
        fs::write(path, encoded).with_context(|| format!("writing session {}", path.display()))
    }
}
