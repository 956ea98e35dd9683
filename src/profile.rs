//! Read path for the cached operator profile.
//!
//! The file holds base64-encoded JSON written at sign-in. It is read for
//! display and for stamping `createdBy`/`updatedBy`; nothing here writes it.

use crate::models::Role;
use anyhow::{Context, Result};
use base64::Engine;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorProfile {
    #[serde(default, alias = "_id")]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl OperatorProfile {
    /// Id as a string, whether the server sent a number or a key.
    pub fn operator_id(&self) -> Option<String> {
        match self.id.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

fn decode(content: &str) -> Result<OperatorProfile> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(content.trim())
        .context("profile is not valid base64")?;
    let profile = serde_json::from_slice(&bytes).context("profile is not valid JSON")?;
    Ok(profile)
}

/// Load the profile; a missing or unreadable file yields None.
pub fn load(path: &Path) -> Option<OperatorProfile> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no cached profile");
        return None;
    }
    let result = std::fs::read_to_string(path)
        .context("failed to read profile")
        .and_then(|content| decode(&content));
    match result {
        Ok(profile) => Some(profile),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to load cached profile");
            None
        }
    }
}
