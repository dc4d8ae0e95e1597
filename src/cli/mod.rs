use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::manifest::SourceImage;

#[derive(Parser)]
#[command(name = "multiarch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file (defaults to <config dir>/multiarch/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a manifest list from platform-specific images and push it
    Create {
        /// Reference to push the manifest list to (e.g., quay.io/org/app:multi)
        #[arg(value_name = "DESTINATION")]
        destination: Option<String>,

        /// Source image as <reference>=<os>/<arch> (e.g., quay.io/org/app:arm=linux/arm64)
        /// Repeat in the order the entries should appear in the index
        #[arg(short, long = "image", value_name = "REF=OS/ARCH")]
        images: Vec<SourceImage>,

        /// Auth file holding registry credentials
        #[arg(long, env = "REGISTRY_AUTH_FILE", value_name = "FILE")]
        authfile: Option<PathBuf>,

        /// Access registries without credentials
        #[arg(long)]
        anonymous: bool,

        /// Registry to reach over plain HTTP (e.g., localhost:5000)
        /// Can be specified multiple times
        #[arg(long = "insecure-registry", value_name = "HOST")]
        insecure_registries: Vec<String>,

        /// Assemble and print the manifest list without pushing it
        #[arg(long)]
        no_push: bool,
    },

    /// Show version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_create_command() {
        let cli = Cli::try_parse_from([
            "multiarch",
            "create",
            "quay.io/org/app:multi",
            "--image",
            "quay.io/org/app:arm=linux/arm64",
            "-i",
            "quay.io/org/app:x86=linux/amd64",
            "--insecure-registry",
            "localhost:5000",
        ])
        .unwrap();

        match cli.command {
            Commands::Create {
                destination,
                images,
                insecure_registries,
                no_push,
                anonymous,
                ..
            } => {
                assert_eq!(destination.as_deref(), Some("quay.io/org/app:multi"));
                assert_eq!(images.len(), 2);
                assert_eq!(images[0].architecture, "arm64");
                assert_eq!(images[1].architecture, "amd64");
                assert_eq!(insecure_registries, vec!["localhost:5000"]);
                assert!(!no_push);
                assert!(!anonymous);
            }
            Commands::Version => panic!("expected create"),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_image() {
        let result = Cli::try_parse_from([
            "multiarch",
            "create",
            "repo/app:multi",
            "-i",
            "repo/app:arm",
        ]);
        assert!(result.is_err());
    }
}
