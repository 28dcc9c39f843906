//! Debounced background persistence
//!
//! Mutations hand their resulting snapshot to a [`SnapshotWriter`] and move on.
//! A worker thread keeps only the newest pending snapshot and writes it at
//! most once per interval; whatever is pending is written on flush, shutdown
//! or drop.

use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::Result;
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::models::Factory;
use crate::store;

/// Destination for snapshots written by the worker.
pub trait SnapshotSink: Send + 'static {
    fn write(&mut self, factory: &Factory) -> Result<()>;
}

/// Writes snapshots into the `factories` table.
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        store::init_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl SnapshotSink for SqliteSink {
    fn write(&mut self, factory: &Factory) -> Result<()> {
        store::save_factory(&self.conn, factory)
    }
}

enum Message {
    Snapshot(Factory),
    Flush(Sender<()>),
    Shutdown,
}

pub struct SnapshotWriter {
    tx: Sender<Message>,
    handle: Option<JoinHandle<()>>,
}

impl SnapshotWriter {
    pub fn spawn<S: SnapshotSink>(sink: S, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || run(sink, rx, interval));
        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// Queue a snapshot. Never blocks; superseded snapshots are dropped unwritten.
    pub fn submit(&self, factory: Factory) {
        if self.tx.send(Message::Snapshot(factory)).is_err() {
            warn!("snapshot writer has stopped; snapshot discarded");
        }
    }

    /// Write whatever is pending now and wait until it is done.
    pub fn flush(&self) {
        let (ack_tx, ack_rx) = mpsc::channel();
        if self.tx.send(Message::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.recv();
        }
    }

    /// Write the pending snapshot and stop the worker.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.tx.send(Message::Shutdown);
            if handle.join().is_err() {
                warn!("snapshot writer panicked");
            }
        }
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        self.stop();
    }
}

fn write_pending<S: SnapshotSink>(sink: &mut S, pending: &mut Option<Factory>) {
    if let Some(factory) = pending.take() {
        match sink.write(&factory) {
            Ok(()) => debug!(factory = %factory.id, "snapshot written"),
            Err(e) => warn!(factory = %factory.id, error = %e, "snapshot write failed"),
        }
    }
}

fn run<S: SnapshotSink>(mut sink: S, rx: Receiver<Message>, interval: Duration) {
    info!(?interval, "snapshot writer started");
    let mut pending: Option<Factory> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        let message = match deadline {
            None => match rx.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
            Some(due) => {
                match rx.recv_timeout(due.saturating_duration_since(Instant::now())) {
                    Ok(message) => message,
                    Err(RecvTimeoutError::Timeout) => {
                        write_pending(&mut sink, &mut pending);
                        deadline = None;
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        };

        match message {
            Message::Snapshot(factory) => {
                pending = Some(factory);
                // The window opens with the first snapshot and is not extended by later ones.
                deadline.get_or_insert_with(|| Instant::now() + interval);
            }
            Message::Flush(ack) => {
                write_pending(&mut sink, &mut pending);
                deadline = None;
                let _ = ack.send(());
            }
            Message::Shutdown => break,
        }
    }

    write_pending(&mut sink, &mut pending);
    info!("snapshot writer stopped");
}
