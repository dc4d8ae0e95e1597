pub mod auth;
pub mod cli;
pub mod config;
pub mod constants;
pub mod digest;
pub mod error;
pub mod index;
pub mod manifest;
pub mod registry;
pub mod service;

pub use error::{BuildError, CredentialError, DigestError, RegistryError};
pub use index::{BuildOutcome, IndexBuilder};
pub use manifest::{ImageIndex, ManifestDescriptor, Platform, SourceImage};
