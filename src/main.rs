// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use gravel::config::Config;
use gravel::installer::Installer;
use gravel::package::Package;
use gravel::supervisor::Supervisor;

#[derive(Parser)]
#[command(name = "gravel")]
#[command(author, version, about = "Host-local package manager with signed bundles and service supervision", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a package (no-op if already installed)
    Install {
        /// Package name
        package: String,
    },
    /// Reinstall an installed package, firing the upgrade triggers
    Upgrade {
        /// Package name
        package: String,
    },
    /// Start a package's supervised service
    Start {
        /// Package name
        package: String,
    },
    /// Signal a package's supervised service to stop
    Stop {
        /// Package name
        package: String,
    },
    /// Stop and start a package's supervised service
    Restart {
        /// Package name
        package: String,
    },
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let home = Config::resolve_home();

    match cli.command {
        Commands::Install { package } => {
            Installer::open(&home)?.install(&package, false)?;
        }
        Commands::Upgrade { package } => {
            Installer::open(&home)?.install(&package, true)?;
        }
        Commands::Start { package } => {
            let config = Config::load(&home)?;
            let pkg = Package::open(&config, &package)?;
            Supervisor::new(&config).start(&pkg)?;
        }
        Commands::Stop { package } => {
            let config = Config::load(&home)?;
            let pkg = Package::open(&config, &package)?;
            Supervisor::new(&config).stop(&pkg, true)?;
        }
        Commands::Restart { package } => {
            let config = Config::load(&home)?;
            let pkg = Package::open(&config, &package)?;
            Supervisor::new(&config).restart(&pkg)?;
        }
    }
    Ok(())
}
