use anyhow::{Context, Result};
use clap::Parser;
use multiarch::{
    cli::{Cli, Commands},
    config::Config,
    registry::OciRegistry,
    service::{BuildConfig, BuildService},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Create {
            destination,
            images,
            authfile,
            anonymous,
            insecure_registries,
            no_push,
        } => {
            let config = Config::load(cli.config.as_deref())?;

            let destination = destination.or(config.destination).context(
                "Either a DESTINATION argument or `destination` in the config file must be set",
            )?;

            // Images on the command line replace the configured list
            let images = if images.is_empty() {
                config.images
            } else {
                images
            };

            let mut insecure = config.insecure_registries;
            insecure.extend(insecure_registries);

            let registry = OciRegistry::with_insecure_registries(insecure);

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling registry operations");
                    on_signal.cancel();
                }
            });

            let result = BuildService::build(
                BuildConfig {
                    images,
                    destination,
                    auth_file: authfile.or(config.auth_file),
                    anonymous,
                    no_push,
                },
                &registry,
                cancel,
            )
            .await?;

            // Print only the manifest list document to stdout
            println!("{}", String::from_utf8_lossy(&result.document));

            if let Some(image_ref) = result.image_ref {
                info!("Manifest list image created successfully: {}", image_ref);
            }
        }
        Commands::Version => {
            println!("multiarch {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
