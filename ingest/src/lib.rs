//! File-based request ingester: polls a flat file of `PART_ID,QTY` lines
//! and turns them into a single atomic batch offered to the request
//! queue.
//!
//! Grounded on the teacher's `MarketManager` poll-and-forward shape
//! (`market/src/manager.rs`'s periodic refresh loop), generalized from a
//! `tokio::sync::Mutex<HashMap<...>>` poll to a `tokio::time::interval`
//! loop over a file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use corelib::{Request, SimError};
use inventory::Inventory;
use req_queue::RequestQueue;

#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub path: PathBuf,
    pub poll_interval: Duration,
}

/// Spawns the polling task. Runs until `cancel` fires.
pub fn spawn(config: IngestConfig, queue: Arc<RequestQueue>, inventory: Arc<Inventory>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(path = %config.path.display(), "ingester online");
        let mut interval = tokio::time::interval(config.poll_interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    match ingest_once(&config.path, &inventory) {
                        Ok(requests) if !requests.is_empty() => {
                            let n = requests.len();
                            queue.offer_batch(requests);
                            debug!(count = n, "ingested batch");
                        }
                        Ok(_) => {}
                        Err(err) => warn!(error = %err, "ingest cycle failed, batch dropped"),
                    }
                }
            }
        }
        info!("ingester offline");
    })
}

/// Reads and parses the file once. On success, truncates the file and
/// returns the parsed requests (possibly empty); the truncate and the
/// return happen together so a caller never sees a parsed batch still
/// sitting in the file. On any parse or I/O failure, the file is left
/// untouched and nothing is returned.
#[instrument(skip(inventory))]
fn ingest_once(path: &std::path::Path, inventory: &Inventory) -> Result<Vec<Request>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err).context("reading ingest file"),
    };

    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut requests = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (part_id, qty_str) = line
            .split_once(',')
            .with_context(|| format!("line {}: expected PART_ID,QTY, got {line:?}", lineno + 1))?;
        let part_id = part_id.trim();
        let qty_str = qty_str.trim();

        let Some(part) = inventory.find_by_id(part_id) else {
            warn!(line = lineno + 1, part_id, "unknown part, skipping line");
            continue;
        };

        let qty: i64 = qty_str.parse().map_err(|_| {
            SimError::RequestProcessing(format!("line {}: non-integer quantity {qty_str:?}", lineno + 1))
        })?;

        let request = Request::create(Some(part), qty)
            .map_err(|e| SimError::RequestProcessing(format!("line {}: {e}", lineno + 1)))?;
        requests.push(request);
    }

    std::fs::write(path, "").context("truncating ingest file after successful parse")?;
    Ok(requests)
}
