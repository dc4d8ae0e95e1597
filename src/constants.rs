/// Media type constants for manifests and indexes
pub mod media_type {
    /// OCI image manifest (single platform)
    pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

    /// OCI image index (multi platform)
    pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";

    /// Docker v2 schema 2 manifest
    pub const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";

    /// Docker v2 manifest list
    pub const DOCKER_MANIFEST_LIST: &str =
        "application/vnd.docker.distribution.manifest.list.v2+json";

    /// Docker v2 schema 1 manifest, signed
    pub const DOCKER_SCHEMA1_SIGNED: &str =
        "application/vnd.docker.distribution.manifest.v1+prettyjws";

    /// Docker v2 schema 1 manifest, unsigned
    pub const DOCKER_SCHEMA1: &str = "application/vnd.docker.distribution.manifest.v1+json";

    /// Every manifest type accepted when fetching a source image, so the
    /// registry answers with whatever it stores for the tag
    pub const ACCEPTED: &[&str] = &[
        OCI_MANIFEST,
        DOCKER_MANIFEST,
        OCI_INDEX,
        DOCKER_MANIFEST_LIST,
        DOCKER_SCHEMA1_SIGNED,
        DOCKER_SCHEMA1,
    ];

    /// Returns true for index and manifest-list media types
    pub fn is_index(media_type: &str) -> bool {
        media_type == OCI_INDEX || media_type == DOCKER_MANIFEST_LIST
    }
}

/// Image index schema version
pub const SCHEMA_VERSION: i32 = 2;
