use async_trait::async_trait;
use http::HeaderValue;
use oci_distribution::client::{ClientConfig, ClientProtocol};
use oci_distribution::errors::OciDistributionError;
use oci_distribution::secrets::RegistryAuth;
use oci_distribution::{Client, Reference, RegistryOperation};
use std::sync::Arc;
use tracing::{debug, info};

use super::{AuthContext, ManifestSession, RegistryClient};
use crate::constants::media_type;
use crate::error::RegistryError;

/// Registry client backed by oci-distribution
pub struct OciRegistry {
    client: Arc<Client>,
}

impl OciRegistry {
    pub fn new() -> Self {
        Self::with_insecure_registries(Vec::new())
    }

    /// Talk plain HTTP to the listed registries, HTTPS to everything else
    pub fn with_insecure_registries(insecure: Vec<String>) -> Self {
        let protocol = if insecure.is_empty() {
            ClientProtocol::Https
        } else {
            ClientProtocol::HttpsExcept(insecure)
        };
        let config = ClientConfig {
            protocol,
            ..Default::default()
        };

        Self {
            client: Arc::new(Client::new(config)),
        }
    }

    async fn open(
        &self,
        reference: &Reference,
        auth: &AuthContext,
        operation: RegistryOperation,
    ) -> Result<Box<dyn ManifestSession>, RegistryError> {
        let registry_auth = auth.to_registry_auth();

        debug!(
            "Authenticating to {} for {:?} (user: {})",
            reference.registry(),
            operation,
            auth.username().unwrap_or("<anonymous>")
        );

        self.client
            .auth(reference, &registry_auth, operation)
            .await
            .map_err(|e| classify(reference, e))?;

        Ok(Box::new(OciSession {
            client: Arc::clone(&self.client),
            reference: reference.clone(),
            auth: registry_auth,
        }))
    }
}

impl Default for OciRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryClient for OciRegistry {
    async fn open_read(
        &self,
        reference: &Reference,
        auth: &AuthContext,
    ) -> Result<Box<dyn ManifestSession>, RegistryError> {
        self.open(reference, auth, RegistryOperation::Pull).await
    }

    async fn open_write(
        &self,
        reference: &Reference,
        auth: &AuthContext,
    ) -> Result<Box<dyn ManifestSession>, RegistryError> {
        self.open(reference, auth, RegistryOperation::Push).await
    }
}

struct OciSession {
    client: Arc<Client>,
    reference: Reference,
    auth: RegistryAuth,
}

#[async_trait]
impl ManifestSession for OciSession {
    async fn fetch_manifest(&mut self) -> Result<Vec<u8>, RegistryError> {
        let (manifest, registry_digest) = self
            .client
            .pull_manifest_raw(&self.reference, &self.auth, media_type::ACCEPTED)
            .await
            .map_err(|e| classify(&self.reference, e))?;

        debug!(
            "Fetched {} byte manifest for {} (registry digest: {})",
            manifest.len(),
            self.reference,
            registry_digest
        );

        Ok(manifest)
    }

    async fn publish_manifest(
        &mut self,
        manifest: Vec<u8>,
        media_type: &str,
    ) -> Result<(), RegistryError> {
        let content_type =
            HeaderValue::from_str(media_type).map_err(|e| RegistryError::Transport {
                reference: self.reference.whole(),
                message: format!("invalid media type {}: {}", media_type, e),
            })?;

        let manifest_url = self
            .client
            .push_manifest_raw(&self.reference, manifest, content_type)
            .await
            .map_err(|e| classify(&self.reference, e))?;

        info!("Pushed manifest to {}", manifest_url);
        Ok(())
    }

    fn close(&mut self) {
        // The client and its token cache are shared, nothing is held per session.
        debug!("Released session for {}", self.reference);
    }
}

/// Map an oci-distribution failure onto the registry error taxonomy
fn classify(reference: &Reference, err: OciDistributionError) -> RegistryError {
    let reference = reference.whole();
    let message = err.to_string();

    match err {
        OciDistributionError::AuthenticationFailure(_)
        | OciDistributionError::UnauthorizedError { .. } => {
            RegistryError::Authentication { reference, message }
        }
        OciDistributionError::ImageManifestNotFoundError(_) => {
            RegistryError::NotFound { reference }
        }
        OciDistributionError::ServerError { code, .. } => status_error(code, reference, message),
        _ => RegistryError::Transport { reference, message },
    }
}

fn status_error(code: u16, reference: String, message: String) -> RegistryError {
    match code {
        401 => RegistryError::Authentication { reference, message },
        403 => RegistryError::PermissionDenied { reference, message },
        404 => RegistryError::NotFound { reference },
        413 | 429 => RegistryError::QuotaExceeded { reference, message },
        _ => RegistryError::Transport { reference, message },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_mapping() {
        let r = || "quay.io/org/app:multi".to_string();
        let m = || "boom".to_string();

        assert!(matches!(
            status_error(401, r(), m()),
            RegistryError::Authentication { .. }
        ));
        assert!(matches!(
            status_error(403, r(), m()),
            RegistryError::PermissionDenied { .. }
        ));
        assert!(matches!(
            status_error(404, r(), m()),
            RegistryError::NotFound { .. }
        ));
        assert!(matches!(
            status_error(429, r(), m()),
            RegistryError::QuotaExceeded { .. }
        ));
        assert!(matches!(
            status_error(500, r(), m()),
            RegistryError::Transport { .. }
        ));
    }

    #[test]
    fn test_classify_not_found() {
        let reference: Reference = "quay.io/org/app:arm".parse().unwrap();
        let err = classify(
            &reference,
            OciDistributionError::ImageManifestNotFoundError("gone".to_string()),
        );
        assert!(matches!(
            err,
            RegistryError::NotFound { ref reference } if reference == "quay.io/org/app:arm"
        ));
    }

    #[test]
    fn test_classify_authentication_failure() {
        let reference: Reference = "quay.io/org/app:arm".parse().unwrap();
        let err = classify(
            &reference,
            OciDistributionError::AuthenticationFailure("bad token".to_string()),
        );
        assert!(matches!(err, RegistryError::Authentication { .. }));
    }
}
