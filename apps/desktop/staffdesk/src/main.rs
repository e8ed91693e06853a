// Prevents additional console window on Windows in release builds
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use staffdesk::config::ShellConfig;
use staffdesk::endpoint::EndpointInfo;
use staffdesk::error::StaffdeskError;
use staffdesk::logger::initialize as LoggerInitialize;

use bridge_core::channel::ChannelRegistry;
use bridge_core::datastore::Datastore;
use bridge_core::host::{Dispatcher, HeadlessWindowManager, start_bridge_host};

use common::{ErrorLocation, RedactedToken};

use std::fs::create_dir_all;
use std::panic::Location;
use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), StaffdeskError> {
    // Resolve the app's data directory for logs, datastore and endpoint file
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| StaffdeskError::Staffdesk {
            message: String::from("No local data directory available on this platform"),
            location: ErrorLocation::from(Location::caller()),
        })?
        .join("staffdesk");

    let log_dir = data_dir.join("logs");
    create_dir_all(&log_dir).map_err(|e| StaffdeskError::Staffdesk {
        message: format!("Failed to create log directory: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // Initialize logger FIRST
    LoggerInitialize(&log_dir)?;

    info!("Staffdesk host shell starting");
    info!("Log directory: {}", log_dir.display());

    // Load shell configuration (defaults when absent)
    let config_dir = dirs::config_dir()
        .ok_or_else(|| StaffdeskError::Staffdesk {
            message: String::from("No config directory available on this platform"),
            location: ErrorLocation::from(Location::caller()),
        })?
        .join("staffdesk");
    let config = match ShellConfig::load(&config_dir) {
        Ok(config) => config,
        Err(error) => {
            warn!("Config rejected ({error}), continuing with defaults");
            ShellConfig::default()
        }
    };

    // Open and migrate the workforce datastore
    let db_path = config
        .database
        .file
        .clone()
        .unwrap_or_else(|| data_dir.join("staffdesk.db"));
    let datastore = Datastore::open(&db_path)
        .await
        .map_err(|e| StaffdeskError::Core {
            message: format!("Failed to open datastore: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
    datastore
        .migrate()
        .await
        .map_err(|e| StaffdeskError::Core {
            message: format!("Failed to migrate datastore: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;
    info!("Datastore ready at {}", db_path.display());

    // Start the bridge host with the full capability table
    let token = RedactedToken::new(Uuid::new_v4().to_string());
    let dispatcher = Dispatcher::new(
        Arc::new(ChannelRegistry::default_table()),
        datastore,
        Arc::new(HeadlessWindowManager::new()),
    );

    info!("Starting bridge host on port {}", config.bridge.port);
    let handle = start_bridge_host(
        config.bridge.port,
        Some(token.as_str().to_string()),
        dispatcher,
    )
    .await
    .map_err(|e| StaffdeskError::Core {
        message: format!("Failed to start bridge host: {}", e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    info!("Bridge host started on port {}", handle.port());

    // Publish port + token where the UI process looks for them
    EndpointInfo::new(handle.port(), token).save(&data_dir)?;

    // The transport is process-lifetime-scoped; park until shutdown
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| StaffdeskError::Staffdesk {
            message: format!("Failed to wait for shutdown signal: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("Shutdown requested, exiting");
    Ok(())
}
