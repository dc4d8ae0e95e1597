//! Image index assembly and publication
//!
//! [`IndexBuilder`] fetches the manifest of every source image, describes it
//! by digest and platform, and writes the resulting index to the destination
//! reference. The first failure aborts the build and nothing is published.

use oci_distribution::Reference;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::constants::media_type;
use crate::digest::{declared_media_type, manifest_digest, ContentDigest};
use crate::error::{BuildError, RegistryError};
use crate::manifest::{ImageIndex, ManifestDescriptor, SourceImage};
use crate::registry::{
    parse_reference, pinned_reference, AuthContext, RegistryClient, SessionGuard,
};


/// Result of a published index
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub index: ImageIndex,
    /// Exact bytes written to the registry
    pub manifest: Vec<u8>,
    pub digest: ContentDigest,
    pub destination: String,
    /// `registry/repository@sha256:...` of the published index
    pub pinned_reference: String,
}

/// Builds image indexes against a registry
pub struct IndexBuilder<'a> {
    registry: &'a dyn RegistryClient,
    cancel: CancellationToken,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(registry: &'a dyn RegistryClient) -> Self {
        Self {
            registry,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort in-flight registry calls when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Fetch every source manifest and assemble the index without publishing it
    pub async fn assemble(
        &self,
        images: &[SourceImage],
        auth: &AuthContext,
    ) -> Result<ImageIndex, BuildError> {
        let references = validate_sources(images)?;
        self.collect(images, &references, auth).await
    }

    /// Assemble the index and publish it at `destination`.
    ///
    /// Any existing manifest at `destination` is overwritten.
    pub async fn build_and_publish(
        &self,
        images: &[SourceImage],
        destination: &str,
        auth: AuthContext,
    ) -> Result<BuildOutcome, BuildError> {
        let references = validate_sources(images)?;
        let destination_ref = parse(destination)?;

        let index = self.collect(images, &references, &auth).await?;
        let manifest = index.to_bytes()?;
        let digest = ContentDigest::compute(&manifest);

        info!(
            "Publishing image index with {} manifests to {}",
            index.manifests.len(),
            destination
        );
        for m in &index.manifests {
            debug!(
                "  - Platform: {}, digest: {}, size: {}",
                m.platform, m.digest, m.size
            );
        }

        let session = self
            .cancellable(self.registry.open_write(&destination_ref, &auth))
            .await
            .map_err(|e| publish_error(destination, e))?;
        let mut session = SessionGuard::new(session, destination);

        self.cancellable(session.publish_manifest(manifest.clone(), media_type::OCI_INDEX))
            .await
            .map_err(|e| publish_error(destination, e))?;
        session.close();

        let pinned_reference = pinned_reference(&destination_ref, &digest.to_string());
        info!("Successfully published image index {}", pinned_reference);

        Ok(BuildOutcome {
            index,
            manifest,
            digest,
            destination: destination.to_string(),
            pinned_reference,
        })
    }

    async fn collect(
        &self,
        images: &[SourceImage],
        references: &[Reference],
        auth: &AuthContext,
    ) -> Result<ImageIndex, BuildError> {
        let mut manifests = Vec::with_capacity(images.len());

        for (image, reference) in images.iter().zip(references) {
            manifests.push(self.describe(image, reference, auth).await?);
        }

        let mut seen = HashSet::new();
        for m in &manifests {
            if !seen.insert(m.digest.as_str()) {
                warn!("Manifest {} is referenced by more than one platform", m.digest);
            }
        }

        Ok(ImageIndex::new(manifests))
    }

    /// Fetch one source manifest and describe it
    async fn describe(
        &self,
        image: &SourceImage,
        reference: &Reference,
        auth: &AuthContext,
    ) -> Result<ManifestDescriptor, BuildError> {
        info!("Fetching manifest for {} ({})", image.reference, image.platform());

        let session = self
            .cancellable(self.registry.open_read(reference, auth))
            .await
            .map_err(|e| fetch_error(&image.reference, e))?;
        let mut session = SessionGuard::new(session, &image.reference);

        let manifest = self
            .cancellable(session.fetch_manifest())
            .await
            .map_err(|e| fetch_error(&image.reference, e))?;
        session.close();

        let digest = manifest_digest(&manifest).map_err(|source| BuildError::DigestComputation {
            reference: image.reference.clone(),
            source,
        })?;

        if let Some(expected) = reference.digest() {
            // Only sha256 pins can be checked; hex case is not significant
            let matches = !expected.starts_with("sha256:")
                || expected
                    .parse::<ContentDigest>()
                    .is_ok_and(|pinned| pinned == digest);
            if !matches {
                return Err(BuildError::DigestMismatch {
                    reference: image.reference.clone(),
                    expected: expected.to_string(),
                    actual: digest.to_string(),
                });
            }
        }

        if let Some(declared) = declared_media_type(&manifest) {
            if media_type::is_index(&declared) {
                warn!(
                    "{} resolves to an index ({}), nesting it under {}",
                    image.reference,
                    declared,
                    image.platform()
                );
            }
        }

        debug!(
            "Manifest for {}: digest {}, size {}",
            image.reference,
            digest,
            manifest.len()
        );

        Ok(ManifestDescriptor::for_manifest(
            &manifest,
            &digest,
            image.platform(),
        ))
    }

    async fn cancellable<T>(
        &self,
        operation: impl Future<Output = Result<T, RegistryError>>,
    ) -> Result<T, RegistryError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RegistryError::Cancelled),
            result = operation => result,
        }
    }
}

/// Check the source list before any registry call is made
pub fn validate_sources(images: &[SourceImage]) -> Result<Vec<Reference>, BuildError> {
    if images.is_empty() {
        return Err(BuildError::InvalidInput(
            "at least one source image is required".to_string(),
        ));
    }

    let mut platforms: HashMap<(&str, &str), &str> = HashMap::new();
    let mut references = Vec::with_capacity(images.len());

    for (i, image) in images.iter().enumerate() {
        for (field, value) in [
            ("reference", &image.reference),
            ("architecture", &image.architecture),
            ("os", &image.os),
        ] {
            if value.trim().is_empty() {
                return Err(BuildError::InvalidInput(format!(
                    "source image #{} has an empty {}",
                    i + 1,
                    field
                )));
            }
        }

        let key = (image.architecture.as_str(), image.os.as_str());
        if let Some(first) = platforms.insert(key, &image.reference) {
            return Err(BuildError::DuplicatePlatform {
                architecture: image.architecture.clone(),
                os: image.os.clone(),
                first: first.to_string(),
                second: image.reference.clone(),
            });
        }

        references.push(parse(&image.reference)?);
    }

    Ok(references)
}

fn parse(reference: &str) -> Result<Reference, BuildError> {
    parse_reference(reference).map_err(|message| BuildError::ReferenceParse {
        reference: reference.to_string(),
        message,
    })
}

fn fetch_error(reference: &str, source: RegistryError) -> BuildError {
    match source {
        RegistryError::Cancelled => BuildError::Cancelled,
        source => BuildError::ManifestFetch {
            reference: reference.to_string(),
            source,
        },
    }
}

fn publish_error(reference: &str, source: RegistryError) -> BuildError {
    match source {
        RegistryError::Cancelled => BuildError::Cancelled,
        source => BuildError::Publish {
            reference: reference.to_string(),
            source,
        },
    }
}
