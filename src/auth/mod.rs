//! Registry credential resolution
//!
//! Reads the `auths` section of a Docker or Podman auth file and turns the
//! entry for one registry host into a username/password pair.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::error::CredentialError;

mod store;

pub use store::{default_store_paths, discover_store};

/// Username and password for one registry host
#[derive(Clone, PartialEq, Eq)]
pub struct AuthCredential {
    pub username: String,
    pub password: String,
}

impl AuthCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for AuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credential store file structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialStore {
    #[serde(default)]
    pub auths: HashMap<String, AuthEntry>,
}

/// Entry in the auths section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl CredentialStore {
    /// Load a credential store from a JSON file
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let content = std::fs::read_to_string(path).map_err(|source| CredentialError::StoreRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&content).map_err(|source| CredentialError::StoreParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Find the entry for a registry, trying the usual spellings of its key
    fn find_entry(&self, registry: &str) -> Option<&AuthEntry> {
        registry_key_variants(registry)
            .iter()
            .find_map(|key| self.auths.get(key))
    }
}

/// Resolve the credential for `registry` from `store`
pub fn resolve(store: &CredentialStore, registry: &str) -> Result<AuthCredential, CredentialError> {
    let entry = store
        .find_entry(registry)
        .ok_or_else(|| CredentialError::NotFound {
            registry: registry.to_string(),
        })?;

    if let Some(auth) = &entry.auth {
        return decode_auth(registry, auth);
    }

    match (&entry.username, &entry.password) {
        (Some(username), Some(password)) => Ok(AuthCredential::new(username, password)),
        _ => Err(CredentialError::Malformed {
            registry: registry.to_string(),
        }),
    }
}

/// Decode a base64 `username:password` string.
///
/// Only the first colon separates the two, passwords may contain more.
fn decode_auth(registry: &str, auth: &str) -> Result<AuthCredential, CredentialError> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(auth.trim())
        .map_err(|e| CredentialError::Encoding {
            registry: registry.to_string(),
            message: e.to_string(),
        })?;

    let decoded = String::from_utf8(decoded).map_err(|e| CredentialError::Encoding {
        registry: registry.to_string(),
        message: e.to_string(),
    })?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| CredentialError::Malformed {
            registry: registry.to_string(),
        })?;

    Ok(AuthCredential::new(username, password))
}

/// Extract the registry host from an image reference
pub fn registry_host(image_ref: &str) -> &str {
    // - quay.io/org/app:tag -> quay.io
    // - localhost:5000/app -> localhost:5000
    // - org/app:tag -> docker.io (implicit)
    if let Some((first, _)) = image_ref.split_once('/') {
        if first.contains('.') || first.contains(':') || first == "localhost" {
            return first;
        }
    }

    "docker.io"
}

/// Keys a registry may be stored under, most specific first
fn registry_key_variants(registry: &str) -> Vec<String> {
    let mut variants = vec![registry.to_string()];

    let extra = if registry == "docker.io" || registry == "index.docker.io" {
        vec![
            "docker.io".to_string(),
            "index.docker.io".to_string(),
            "https://index.docker.io/v1/".to_string(),
            "registry-1.docker.io".to_string(),
        ]
    } else if !registry.starts_with("http://") && !registry.starts_with("https://") {
        vec![
            format!("https://{}", registry),
            format!("https://{}/v1/", registry),
            format!("https://{}/v2/", registry),
            format!("http://{}", registry),
        ]
    } else {
        Vec::new()
    };

    for variant in extra {
        if !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    variants
}
