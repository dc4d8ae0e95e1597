//! Content digests for manifests
//!
//! Registries and pulling clients address a manifest by the SHA-256 of its
//! exact bytes, so the digest here is always taken over the bytes as fetched
//! and never over a parsed or re-serialized form.

use std::fmt;
use std::str::FromStr;

use crate::error::DigestError;

/// Algorithm prefix used for every digest this crate produces
pub const SHA256: &str = "sha256";

/// An algorithm-prefixed content digest such as `sha256:<hex>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentDigest {
    hex: String,
}

impl ContentDigest {
    /// Hash `bytes` without any validation
    pub fn compute(bytes: &[u8]) -> Self {
        Self {
            hex: sha256::digest(bytes),
        }
    }

    pub fn algorithm(&self) -> &str {
        SHA256
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", SHA256, self.hex)
    }
}

impl FromStr for ContentDigest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix("sha256:")
            .ok_or_else(|| DigestError::InvalidFormat(s.to_string()))?;

        if hex.len() != 64 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(DigestError::InvalidFormat(s.to_string()));
        }

        Ok(Self {
            hex: hex.to_ascii_lowercase(),
        })
    }
}

/// Compute the digest a registry would assign to `manifest`.
///
/// The bytes must look like a manifest (a non-empty JSON object); the digest
/// itself is taken over the unmodified input.
pub fn manifest_digest(manifest: &[u8]) -> Result<ContentDigest, DigestError> {
    if manifest.is_empty() {
        return Err(DigestError::Empty);
    }

    let value: serde_json::Value = serde_json::from_slice(manifest)?;
    if !value.is_object() {
        return Err(DigestError::NotAnObject);
    }

    Ok(ContentDigest::compute(manifest))
}

/// Media type declared inside a manifest document, if any
pub fn declared_media_type(manifest: &[u8]) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(manifest)
        .ok()?
        .get("mediaType")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &[u8] = br#"{"schemaVersion":2,"mediaType":"application/vnd.oci.image.manifest.v1+json","config":{"mediaType":"application/vnd.oci.image.config.v1+json","size":2,"digest":"sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"},"layers":[]}"#;

    #[test]
    fn test_digest_of_empty_object() {
        let digest = manifest_digest(b"{}").unwrap();
        assert_eq!(
            digest.to_string(),
            "sha256:44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn test_digest_is_deterministic() {
        let first = manifest_digest(MANIFEST).unwrap();
        let second = manifest_digest(MANIFEST).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.algorithm(), "sha256");
        assert_eq!(first.hex().len(), 64);
    }

    #[test]
    fn test_single_byte_change_changes_digest() {
        let original = manifest_digest(MANIFEST).unwrap();

        let mut changed = MANIFEST.to_vec();
        // flip the schema version digit
        let pos = changed.iter().position(|b| *b == b'2').unwrap();
        changed[pos] = b'3';

        assert_ne!(original, manifest_digest(&changed).unwrap());
    }

    #[test]
    fn test_digest_uses_exact_bytes_not_parsed_form() {
        let compact = br#"{"schemaVersion":2}"#;
        let spaced = br#"{ "schemaVersion": 2 }"#;
        assert_ne!(
            manifest_digest(compact).unwrap(),
            manifest_digest(spaced).unwrap()
        );
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(matches!(manifest_digest(b""), Err(DigestError::Empty)));
    }

    #[test]
    fn test_rejects_non_json() {
        assert!(matches!(
            manifest_digest(b"not a manifest"),
            Err(DigestError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_non_object_json() {
        assert!(matches!(
            manifest_digest(b"[1,2,3]"),
            Err(DigestError::NotAnObject)
        ));
    }

    #[test]
    fn test_parse_content_digest() {
        let digest: ContentDigest =
            "sha256:44136FA355B3678A1146AD16F7E8649E94FB4FC21FE77E8310C060F61CAAFF8A"
                .parse()
                .unwrap();
        assert_eq!(digest, ContentDigest::compute(b"{}"));

        assert!("md5:abc".parse::<ContentDigest>().is_err());
        assert!("sha256:abc".parse::<ContentDigest>().is_err());
    }

    #[test]
    fn test_declared_media_type() {
        assert_eq!(
            declared_media_type(MANIFEST).as_deref(),
            Some("application/vnd.oci.image.manifest.v1+json")
        );
        assert_eq!(declared_media_type(b"{}"), None);
    }
}
