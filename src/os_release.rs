//! Parsing helpers for `/etc/os-release`.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::{ProvisionError, Result};

/// Distribution identity facts read from an os-release file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributionIdentity {
    /// Lowercased `ID`
    pub id: String,
    /// `ID_LIKE`, split on whitespace and lowercased
    pub id_like: Vec<String>,
    /// `VERSION_ID`, empty when absent
    pub version: String,
    /// `PRETTY_NAME`, falling back to `NAME` and then `id`
    pub pretty_name: String,
}

impl DistributionIdentity {
    /// Build an identity by hand (mostly useful in tests).
    pub fn new(id: &str, id_like: &str, version: &str) -> Self {
        Self {
            id: id.to_lowercase(),
            id_like: split_id_like(id_like),
            version: version.to_string(),
            pretty_name: id.to_string(),
        }
    }

    /// `ID_LIKE` joined back into its original space-separated form.
    pub fn id_like_joined(&self) -> String {
        self.id_like.join(" ")
    }

    /// Parse os-release content.
    ///
    /// A missing `ID` yields `"linux"`, the default mandated by os-release(5).
    pub fn parse(content: &str) -> Self {
        let mut id = None;
        let mut id_like = Vec::new();
        let mut version = String::new();
        let mut pretty_name = None;
        let mut name = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, raw)) = line.split_once('=') else {
                continue;
            };
            let value = unquote(raw.trim());
            match key.trim() {
                "ID" => id = Some(value.to_lowercase()),
                "ID_LIKE" => id_like = split_id_like(&value),
                "VERSION_ID" => version = value,
                "PRETTY_NAME" => pretty_name = Some(value),
                "NAME" => name = Some(value),
                _ => {}
            }
        }

        let id = id.filter(|v| !v.is_empty()).unwrap_or_else(|| "linux".to_string());
        let pretty_name = pretty_name
            .or(name)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| id.clone());

        Self {
            id,
            id_like,
            version,
            pretty_name,
        }
    }

    /// Read and parse an os-release file.
    pub fn read_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| ProvisionError::io(path, e))?;
        tracing::debug!(path = %path.display(), "read os-release");
        Ok(Self::parse(&content))
    }
}

fn split_id_like(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_lowercase).collect()
}

fn unquote(value: &str) -> String {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.replace("\\\"", "\"").replace("\\$", "$");
        }
    }
    value.to_string()
}
