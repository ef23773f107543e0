// adcwatch - Change-or-timeout analog sampling
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Snapshot sinks
//!
//! The engine never publishes anything itself. Callers hand each emitted
//! snapshot to an [`Emitter`], which encodes it for a transport.

use std::io::Write;

use serde::Serialize;

use crate::error::{AdcError, Result};
use crate::snapshot::Snapshot;

/// Destination for emitted snapshots
pub trait Emitter {
    /// Deliver one snapshot produced by `device`
    fn emit(&mut self, device: &str, snapshot: &Snapshot) -> Result<()>;

    /// Flush buffered output, if any
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collects snapshots in memory, for tests and local inspection
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    emitted: Vec<(String, Snapshot)>,
}

impl MemoryEmitter {
    /// Create an empty emitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything emitted so far, oldest first
    pub fn emitted(&self) -> &[(String, Snapshot)] {
        &self.emitted
    }

    /// Most recent snapshot
    pub fn last(&self) -> Option<&Snapshot> {
        self.emitted.last().map(|(_, s)| s)
    }

    /// Number of snapshots received
    pub fn count(&self) -> usize {
        self.emitted.len()
    }

    /// Drop everything received
    pub fn clear(&mut self) {
        self.emitted.clear();
    }
}

impl Emitter for MemoryEmitter {
    fn emit(&mut self, device: &str, snapshot: &Snapshot) -> Result<()> {
        self.emitted.push((device.to_string(), snapshot.clone()));
        Ok(())
    }
}

#[derive(Serialize)]
struct Record<'a> {
    device: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<&'a str>,
    values: &'a Snapshot,
}

/// Writes one JSON object per snapshot, newline separated
///
/// Each line looks like `{"device":"ads1115","values":{"a0":"1.000"}}`,
/// with an optional `timestamp` field supplied by a stamping function.
pub struct JsonLinesEmitter<W: Write> {
    writer: W,
    stamp: Option<Box<dyn FnMut() -> String + Send>>,
    lines: u64,
}

impl<W: Write> JsonLinesEmitter<W> {
    /// Write records to `writer`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            stamp: None,
            lines: 0,
        }
    }

    /// Add a `timestamp` field produced by `stamp` to every record
    pub fn with_timestamps(mut self, stamp: impl FnMut() -> String + Send + 'static) -> Self {
        self.stamp = Some(Box::new(stamp));
        self
    }

    /// Records written so far
    pub fn lines(&self) -> u64 {
        self.lines
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Emitter for JsonLinesEmitter<W> {
    fn emit(&mut self, device: &str, snapshot: &Snapshot) -> Result<()> {
        let timestamp = self.stamp.as_mut().map(|stamp| stamp());
        let record = Record {
            device,
            timestamp: timestamp.as_deref(),
            values: snapshot,
        };

        serde_json::to_writer(&mut self.writer, &record)
            .map_err(|e| AdcError::Emit(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| AdcError::Emit(e.to_string()))?;
        self.lines += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| AdcError::Emit(e.to_string()))
    }
}

impl<W: Write> std::fmt::Debug for JsonLinesEmitter<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesEmitter")
            .field("lines", &self.lines)
            .field("timestamps", &self.stamp.is_some())
            .finish()
    }
}
