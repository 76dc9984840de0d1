//! Daemon mode: holds the classifier and session store, serves the socket.

pub mod handler;

use crate::classify::{
    CentroidClassifier, Classifier, LabelMap, NullClassifier, ObservationSource,
};
use crate::config::{ClassifierSection, Config};
use crate::error::{Result, SignseqError};
use crate::ipc::server::IpcServer;
use crate::segment::BatchConfig;
use crate::session::SessionStore;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// Daemon state shared by every connection.
pub struct DaemonState {
    /// One segmenter per connected client
    pub store: SessionStore,
    /// Loaded classifier and label map (stay in memory)
    pub source: ObservationSource,
    /// Tuning for `clip` requests
    pub batch: BatchConfig,
}

impl DaemonState {
    /// Creates daemon state from validated configuration.
    pub fn new(config: &Config, source: ObservationSource) -> Self {
        Self {
            store: SessionStore::new(config.segmenter.to_segmenter_config()),
            source,
            batch: config.batch.to_batch_config(),
        }
    }

    /// Number of connected sessions.
    pub fn session_count(&self) -> usize {
        self.store.len()
    }
}

/// Run the daemon: load the model, start the IPC server, wait for shutdown.
///
/// The socket is taken from `socket_path`, then `[daemon] socket`, then the
/// runtime-dir default.
pub async fn run_daemon(config: Config, socket_path: Option<PathBuf>) -> Result<()> {
    config.validate()?;

    let source = create_source(&config.classifier)?;
    info!(
        "Classifier '{}' loaded with {} labels",
        source.classifier_name(),
        source.labels().len()
    );

    let socket_path = socket_path
        .or_else(|| config.daemon.socket.clone())
        .unwrap_or_else(IpcServer::default_socket_path);
    let state = DaemonState::new(&config, source);

    let server = Arc::new(IpcServer::new(socket_path)?);
    info!("IPC server listening at: {}", server.socket_path().display());

    let handler = handler::DaemonSessionHandler::new(state);

    // Start IPC server in background task
    let server_clone = Arc::clone(&server);
    let server_handle = tokio::spawn(async move { server_clone.start(handler).await });

    // Wait for SIGTERM or SIGINT
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT, shutting down...");
        }
        res = wait_for_sigterm() => {
            if let Err(e) = res {
                error!("Error setting up signal handler: {}", e);
            }
            info!("Received SIGTERM, shutting down...");
        }
    }

    server.stop().await?;

    match server_handle.await {
        Ok(Err(e)) => error!("Daemon server failed: {}", e),
        Err(e) => error!("Daemon server task failed: {}", e),
        Ok(Ok(())) => {}
    }

    info!("Daemon stopped.");
    Ok(())
}

/// Wait for SIGTERM signal (used by systemd).
#[cfg(unix)]
async fn wait_for_sigterm() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| SignseqError::Other(format!("Failed to register SIGTERM handler: {}", e)))?;
    sigterm.recv().await;
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_sigterm() -> Result<()> {
    // On non-Unix, just wait forever (Ctrl+C will still work)
    std::future::pending::<()>().await
}

/// Build the classifier and label map from config.
///
/// Without a centroid model the daemon still runs, but only pre-classified
/// `observation` requests can produce detections.
pub fn create_source(config: &ClassifierSection) -> Result<ObservationSource> {
    let labels = match &config.label_map {
        Some(path) => LabelMap::load(path)?,
        None => {
            warn!("No label map configured; every prediction resolves to Unknown");
            LabelMap::default()
        }
    };

    let classifier: Arc<dyn Classifier> = match &config.centroids {
        Some(path) => {
            let model = CentroidClassifier::load(path)?;
            if model.dimensions() != config.feature_len {
                return Err(SignseqError::ConfigInvalidValue {
                    key: "classifier.feature_len".to_string(),
                    message: format!(
                        "{} does not match centroid model dimensions {}",
                        config.feature_len,
                        model.dimensions()
                    ),
                });
            }
            Arc::new(model)
        }
        None => {
            warn!("No classifier model configured; feature frames count as no hand");
            Arc::new(NullClassifier)
        }
    };

    Ok(ObservationSource::new(classifier, labels, config.feature_len))
}
