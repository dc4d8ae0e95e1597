//! Build service for orchestrating index creation
//!
//! Resolves credentials, assembles the index from the source images and
//! publishes it unless `no_push` is set.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    auth::{default_store_paths, discover_store, registry_host, resolve, CredentialStore},
    index::{validate_sources, IndexBuilder},
    manifest::{ImageIndex, SourceImage},
    registry::{AuthContext, RegistryClient},
    service::platform::platform_warning,
};

/// Configuration for a build operation
pub struct BuildConfig {
    pub images: Vec<SourceImage>,
    pub destination: String,
    pub auth_file: Option<PathBuf>,
    pub anonymous: bool,
    pub no_push: bool,
}

/// Result of a build operation
#[derive(Debug)]
pub struct BuildResult {
    pub index: ImageIndex,
    /// Serialized index, identical to what was published
    pub document: Vec<u8>,
    /// `registry/repository@digest` of the published index
    pub image_ref: Option<String>,
}

/// Service for orchestrating the build process
pub struct BuildService;

impl BuildService {
    /// Assemble the index for `config` and publish it unless `no_push` is set
    pub async fn build(
        config: BuildConfig,
        registry: &dyn RegistryClient,
        cancel: CancellationToken,
    ) -> Result<BuildResult> {
        for image in &config.images {
            if let Some(warning) = platform_warning(&image.platform()) {
                warn!("{}: {}", image.reference, warning);
            }
        }

        // Input errors take precedence over credential lookup
        validate_sources(&config.images)?;

        let auth = Self::auth_context(&config)?;
        let builder = IndexBuilder::new(registry).with_cancellation(cancel);

        if config.no_push {
            let index = builder.assemble(&config.images, &auth).await?;
            let document = index.to_bytes()?;
            info!("Assembled index for {} platform(s)", index.manifests.len());
            info!("Skipping push (--no-push specified)");
            return Ok(BuildResult {
                index,
                document,
                image_ref: None,
            });
        }

        let outcome = builder
            .build_and_publish(&config.images, &config.destination, auth)
            .await
            .with_context(|| format!("Failed to create manifest list {}", config.destination))?;

        Ok(BuildResult {
            index: outcome.index,
            document: outcome.manifest,
            image_ref: Some(outcome.pinned_reference),
        })
    }

    /// Credentials for the destination registry, shared by every session
    fn auth_context(config: &BuildConfig) -> Result<AuthContext> {
        if config.anonymous {
            info!("Using anonymous registry access");
            return Ok(AuthContext::anonymous());
        }

        let registry = registry_host(&config.destination);

        let store = match &config.auth_file {
            Some(path) => CredentialStore::load(path)?,
            None => discover_store(&default_store_paths())?.1,
        };

        let credential = resolve(&store, registry)
            .with_context(|| format!("Error getting auth config for {}", registry))?;
        info!("Using credentials for {} (user: {})", registry, credential.username);

        Ok(credential.into())
    }
}
