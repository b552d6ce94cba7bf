// SPDX-License-Identifier: GPL-3.0-only

//! COSMIC Ext Ejecter - drive eject tracking and notifications for the panel
//!
//! Watches removable drives over UDisks2, reports eject outcomes as desktop
//! notifications and warns when a mounted drive is pulled without ejecting.
//! The panel talks to it over the session bus.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ejecter_contracts::client::{CONTROL_PATH, ControlClient, SERVICE_NAME};
use ejecter_core::Ejecter;
use tokio::sync::mpsc;
use zbus::connection::Builder as ConnectionBuilder;

mod adapters;
mod config;
mod control;
mod error;
mod logging;
mod runtime;

use adapters::{DesktopNotifier, UdisksVolumeMonitor};
use config::Config;
use control::ControlHandler;
use runtime::Runtime;

#[derive(Debug, Parser)]
#[command(name = "cosmic-ext-ejecter", version, about)]
struct Cli {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/cosmic-ext-ejecter/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the ejecter service (default)
    Run,
    /// Tell the running service that DEVICE is being ejected by another program
    MarkEjecting { device: String },
    /// Ask the running service to eject the drive with device node DEVICE
    Eject { device: String },
    /// List drives that can be ejected
    List,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let config = Config::load(cli.config.as_deref())?;
            logging::init(&config);
            run_service(config).await
        }
        Command::MarkEjecting { device } => {
            let client = ControlClient::new().await?;
            client.mark_ejecting(&device).await?;
            Ok(())
        }
        Command::Eject { device } => {
            let client = ControlClient::new().await?;
            if !client.eject(&device).await? {
                anyhow::bail!("No connected drive has device node {device}");
            }
            Ok(())
        }
        Command::List => {
            let client = ControlClient::new().await?;
            for drive in client.list_ejectable().await? {
                match &drive.device {
                    Some(device) => println!("{device}\t{}", drive.menu_label()),
                    None => println!("-\t{}", drive.menu_label()),
                }
            }
            Ok(())
        }
    }
}

async fn run_service(config: Config) -> Result<()> {
    tracing::info!("Starting COSMIC Ext Ejecter v{}", env!("CARGO_PKG_VERSION"));

    let (request_sender, requests) = mpsc::unbounded_channel();
    let icon_visible = Arc::new(AtomicBool::new(!config.autohide));

    let connection = ConnectionBuilder::session()?
        .name(SERVICE_NAME)?
        .serve_at(
            CONTROL_PATH,
            ControlHandler::new(request_sender, Arc::clone(&icon_visible)),
        )?
        .build()
        .await?;
    tracing::info!("Service registered on D-Bus session bus");
    tracing::info!("  - {SERVICE_NAME} at {CONTROL_PATH}");

    let monitor = Arc::new(UdisksVolumeMonitor::new().await?);
    let notifier = Arc::new(DesktopNotifier::new(&connection, config.notifications.clone()).await?);
    let (ejecter, events) = Ejecter::new(monitor, notifier);

    Runtime::new(
        ejecter,
        events,
        requests,
        connection,
        config.autohide,
        icon_visible,
    )
    .run()
    .await?;

    tracing::info!("COSMIC Ext Ejecter shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_runs_the_service() {
        let cli = Cli::try_parse_from(["cosmic-ext-ejecter"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn mark_ejecting_takes_a_device() {
        let cli = Cli::try_parse_from(["cosmic-ext-ejecter", "mark-ejecting", "/dev/sdb"]).unwrap();
        assert!(matches!(cli.command, Some(Command::MarkEjecting { ref device }) if device == "/dev/sdb"));
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["cosmic-ext-ejecter", "run", "--config", "/tmp/ejecter.toml"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Run)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ejecter.toml")));
    }
}
