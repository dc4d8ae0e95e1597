use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::constants::{media_type, SCHEMA_VERSION};
use crate::digest::ContentDigest;

/// OCI Image Index (manifest list) for multi-arch support.
///
/// Field order is the serialized order: `schemaVersion`, `mediaType`,
/// `manifests`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageIndex {
    #[serde(rename = "schemaVersion")]
    pub schema_version: i32,
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub manifests: Vec<ManifestDescriptor>,
}

/// Descriptor for a platform-specific manifest in the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDescriptor {
    #[serde(rename = "mediaType")]
    pub media_type: String,
    pub size: i64,
    pub digest: String,
    pub platform: Platform,
}

/// Platform information for a manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
}

impl ImageIndex {
    pub fn new(manifests: Vec<ManifestDescriptor>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            media_type: media_type::OCI_INDEX.to_string(),
            manifests,
        }
    }

    /// Compact JSON encoding, the exact bytes that get published
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl ManifestDescriptor {
    /// Describe manifest bytes as fetched from the registry
    pub fn for_manifest(manifest: &[u8], digest: &ContentDigest, platform: Platform) -> Self {
        Self {
            media_type: media_type::OCI_MANIFEST.to_string(),
            size: manifest.len() as i64,
            digest: digest.to_string(),
            platform,
        }
    }
}

impl Platform {
    pub fn new(os: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self {
            architecture: architecture.into(),
            os: os.into(),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.os, self.architecture)
    }
}

/// One platform-specific image to include in an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    pub reference: String,
    pub architecture: String,
    pub os: String,
}

impl SourceImage {
    pub fn new(
        reference: impl Into<String>,
        architecture: impl Into<String>,
        os: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            architecture: architecture.into(),
            os: os.into(),
        }
    }

    pub fn platform(&self) -> Platform {
        Platform::new(&self.os, &self.architecture)
    }
}

/// Parses `<reference>=<os>/<arch>`, e.g. `quay.io/org/app:arm=linux/arm64`
impl FromStr for SourceImage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (reference, platform) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("expected <reference>=<os>/<arch>, got: {}", s))?;

        let (os, arch) = platform
            .split_once('/')
            .ok_or_else(|| format!("invalid platform format: {}", platform))?;

        if reference.is_empty() || os.is_empty() || arch.is_empty() || arch.contains('/') {
            return Err(format!("expected <reference>=<os>/<arch>, got: {}", s));
        }

        Ok(Self::new(reference, arch, os))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(digest_source: &[u8], os: &str, arch: &str) -> ManifestDescriptor {
        ManifestDescriptor::for_manifest(
            digest_source,
            &ContentDigest::compute(digest_source),
            Platform::new(os, arch),
        )
    }

    #[test]
    fn test_index_field_order() {
        let index = ImageIndex::new(vec![descriptor(b"{}", "linux", "arm64")]);
        let json = String::from_utf8(index.to_bytes().unwrap()).unwrap();

        assert_eq!(
            json,
            concat!(
                r#"{"schemaVersion":2,"mediaType":"application/vnd.oci.image.index.v1+json","#,
                r#""manifests":[{"mediaType":"application/vnd.oci.image.manifest.v1+json","#,
                r#""size":2,"digest":"sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a","#,
                r#""platform":{"architecture":"arm64","os":"linux"}}]}"#
            )
        );
    }

    #[test]
    fn test_descriptor_size_is_raw_length() {
        let raw = b"{ \"schemaVersion\" : 2 }\n";
        let desc = descriptor(raw, "linux", "amd64");
        assert_eq!(desc.size, raw.len() as i64);
    }

    #[test]
    fn test_index_round_trips_through_serde() {
        let index = ImageIndex::new(vec![
            descriptor(b"{\"a\":1}", "linux", "arm64"),
            descriptor(b"{\"b\":2}", "linux", "amd64"),
        ]);
        let parsed: ImageIndex = serde_json::from_slice(&index.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, index);
    }

    #[test]
    fn test_parse_source_image() {
        let image: SourceImage = "quay.io/org/app:arm=linux/arm64".parse().unwrap();
        assert_eq!(image.reference, "quay.io/org/app:arm");
        assert_eq!(image.os, "linux");
        assert_eq!(image.architecture, "arm64");
        assert_eq!(image.platform().to_string(), "linux/arm64");
    }

    #[test]
    fn test_parse_source_image_with_registry_port() {
        let image: SourceImage = "localhost:5000/app:x86=linux/amd64".parse().unwrap();
        assert_eq!(image.reference, "localhost:5000/app:x86");
        assert_eq!(image.architecture, "amd64");
    }

    #[test]
    fn test_parse_source_image_invalid() {
        assert!("quay.io/org/app:arm".parse::<SourceImage>().is_err());
        assert!("quay.io/org/app:arm=linux".parse::<SourceImage>().is_err());
        assert!("=linux/amd64".parse::<SourceImage>().is_err());
        assert!("app=linux/arm/v7".parse::<SourceImage>().is_err());
    }
}
