//! Credential store discovery

use super::CredentialStore;
use crate::error::CredentialError;
use std::path::PathBuf;
use tracing::debug;

/// Locations checked for an auth file, in priority order
pub fn default_store_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(auth_file) = std::env::var("REGISTRY_AUTH_FILE") {
        paths.push(PathBuf::from(auth_file));
    }

    // podman / skopeo / buildah
    if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
        paths.push(PathBuf::from(xdg_runtime).join("containers/auth.json"));
    }

    if let Ok(docker_config) = std::env::var("DOCKER_CONFIG") {
        paths.push(PathBuf::from(docker_config).join("config.json"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".docker/config.json"));
    }

    paths
}

/// Load the first credential store that exists among `candidates`
pub fn discover_store(
    candidates: &[PathBuf],
) -> Result<(PathBuf, CredentialStore), CredentialError> {
    for path in candidates {
        if path.is_file() {
            debug!("Loading credential store from: {}", path.display());
            let store = CredentialStore::load(path)?;
            return Ok((path.clone(), store));
        }
        debug!("No credential store at: {}", path.display());
    }

    Err(CredentialError::StoreNotFound {
        checked: candidates.to_vec(),
    })
}
