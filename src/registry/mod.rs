//! Registry access used by the index builder
//!
//! The builder only needs to read one manifest per source image and write one
//! index to the destination, so the registry is modelled as sessions opened
//! against a single reference. [`OciRegistry`] is the network implementation.

use async_trait::async_trait;
use oci_distribution::secrets::RegistryAuth;
use oci_distribution::Reference;
use std::ops::{Deref, DerefMut};
use tracing::debug;

use crate::auth::AuthCredential;
use crate::error::RegistryError;

mod oci;

pub use oci::OciRegistry;


/// Authentication shared by every session of one build
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    credential: Option<AuthCredential>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn basic(credential: AuthCredential) -> Self {
        Self {
            credential: Some(credential),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.credential.is_none()
    }

    pub fn username(&self) -> Option<&str> {
        self.credential.as_ref().map(|c| c.username.as_str())
    }

    /// Convert to oci-distribution RegistryAuth
    pub fn to_registry_auth(&self) -> RegistryAuth {
        match &self.credential {
            Some(c) => RegistryAuth::Basic(c.username.clone(), c.password.clone()),
            None => RegistryAuth::Anonymous,
        }
    }
}

impl From<AuthCredential> for AuthContext {
    fn from(credential: AuthCredential) -> Self {
        Self::basic(credential)
    }
}

/// Opens manifest sessions against image references
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Open a session for reading the manifest at `reference`
    async fn open_read(
        &self,
        reference: &Reference,
        auth: &AuthContext,
    ) -> Result<Box<dyn ManifestSession>, RegistryError>;

    /// Open a session for writing the manifest at `reference`
    async fn open_write(
        &self,
        reference: &Reference,
        auth: &AuthContext,
    ) -> Result<Box<dyn ManifestSession>, RegistryError>;
}

/// A session bound to one reference
#[async_trait]
pub trait ManifestSession: Send {
    /// Raw manifest bytes exactly as served by the registry
    async fn fetch_manifest(&mut self) -> Result<Vec<u8>, RegistryError>;

    /// Store `manifest` at the session's reference, replacing whatever is there
    async fn publish_manifest(
        &mut self,
        manifest: Vec<u8>,
        media_type: &str,
    ) -> Result<(), RegistryError>;

    /// Release the session. Called exactly once.
    fn close(&mut self);
}

/// Closes the wrapped session when dropped
pub struct SessionGuard {
    session: Box<dyn ManifestSession>,
    label: String,
    closed: bool,
}

impl SessionGuard {
    pub fn new(session: Box<dyn ManifestSession>, label: impl Into<String>) -> Self {
        Self {
            session,
            label: label.into(),
            closed: false,
        }
    }

    /// Close now instead of at end of scope
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            debug!("Closing registry session for {}", self.label);
            self.session.close();
        }
    }
}

impl Deref for SessionGuard {
    type Target = dyn ManifestSession;

    fn deref(&self) -> &Self::Target {
        self.session.as_ref()
    }
}

impl DerefMut for SessionGuard {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_mut()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// Parse an image reference, returning the parse failure as text
pub fn parse_reference(image: &str) -> Result<Reference, String> {
    if image.trim().is_empty() {
        return Err("empty image reference".to_string());
    }
    image.parse::<Reference>().map_err(|e| e.to_string())
}

/// `registry/repository@digest` for a reference
pub fn pinned_reference(reference: &Reference, digest: &str) -> String {
    format!(
        "{}/{}@{}",
        reference.registry(),
        reference.repository(),
        digest
    )
}
