//! Error types for credential resolution, registry access and index builds.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while resolving registry credentials.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("no auth entry for registry: {registry}")]
    NotFound { registry: String },

    #[error("invalid auth entry format for registry {registry}: expected username:password")]
    Malformed { registry: String },

    #[error("failed to decode auth entry for registry {registry}: {message}")]
    Encoding { registry: String, message: String },

    #[error("no credential store found (checked {checked:?})")]
    StoreNotFound { checked: Vec<PathBuf> },

    #[error("failed to read credential store {path}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse credential store {path}: {source}")]
    StoreParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors reported by a registry client.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("authentication failed for {reference}: {message}")]
    Authentication { reference: String, message: String },

    #[error("manifest not found: {reference}")]
    NotFound { reference: String },

    #[error("permission denied for {reference}: {message}")]
    PermissionDenied { reference: String, message: String },

    #[error("quota exceeded for {reference}: {message}")]
    QuotaExceeded { reference: String, message: String },

    #[error("registry request for {reference} failed: {message}")]
    Transport { reference: String, message: String },

    #[error("registry operation cancelled")]
    Cancelled,
}

/// Errors from computing a manifest digest.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("manifest is empty")]
    Empty,

    #[error("manifest is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("manifest is not a JSON object")]
    NotAnObject,

    #[error("invalid digest {0}: expected sha256:<64 hex characters>")]
    InvalidFormat(String),
}

/// Errors from assembling or publishing an image index.
///
/// Every variant that involves a registry names the reference it failed on.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid build input: {0}")]
    InvalidInput(String),

    #[error("platform {os}/{architecture} is claimed by both {first} and {second}")]
    DuplicatePlatform {
        architecture: String,
        os: String,
        first: String,
        second: String,
    },

    #[error("failed to parse image reference {reference}: {message}")]
    ReferenceParse { reference: String, message: String },

    #[error("failed to fetch manifest for {reference}: {source}")]
    ManifestFetch {
        reference: String,
        #[source]
        source: RegistryError,
    },

    #[error("failed to compute digest of manifest for {reference}: {source}")]
    DigestComputation {
        reference: String,
        #[source]
        source: DigestError,
    },

    #[error("manifest for {reference} has digest {actual}, expected {expected}")]
    DigestMismatch {
        reference: String,
        expected: String,
        actual: String,
    },

    #[error("failed to serialize image index: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to publish image index to {reference}: {source}")]
    Publish {
        reference: String,
        #[source]
        source: RegistryError,
    },

    #[error("build cancelled")]
    Cancelled,
}
