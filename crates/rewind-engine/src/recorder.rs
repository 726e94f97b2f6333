//! Write side of a record session.
//!
//! The recorder never tears the session down: I/O failures are logged
//! with the trace path and the record is dropped.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use rewind_core::InputSnapshot;
use rewind_trace::{DataKind, DataRecord, TraceError, TraceMetrics, TraceWriter, MAX_PAYLOAD};

type FileWriter = TraceWriter<BufWriter<File>>;

/// Streams captured input and Pin/Track values to a trace file.
pub struct Recorder {
    path: PathBuf,
    writer: Option<FileWriter>,
    origin: f64,
    last_written: Option<InputSnapshot>,
    last_timestamp: f64,
}

impl Recorder {
    /// Create (or truncate) the trace at `path` and write its header.
    ///
    /// Missing parent directories are created. `origin` is the clock reading
    /// that timestamps are measured from.
    pub fn create(path: &Path, origin: f64) -> Result<Self, TraceError> {
        let writer = open_writer(path)?;
        log::info!("recording to {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(writer),
            origin,
            last_written: None,
            last_timestamp: 0.0,
        })
    }

    /// Terminate the current trace and start a fresh one at the same path.
    ///
    /// If the file cannot be reopened the error is logged and the recorder
    /// stays closed; later writes are ignored.
    pub fn restart(&mut self, origin: f64) {
        self.close();
        self.origin = origin;
        self.last_written = None;
        self.last_timestamp = 0.0;
        match open_writer(&self.path) {
            Ok(writer) => {
                self.writer = Some(writer);
                log::info!("recording file {} reopened", self.path.display());
            }
            Err(e) => log::error!("failed to reopen {}: {e}", self.path.display()),
        }
    }

    /// Record a captured snapshot unless it equals the last one written.
    ///
    /// Returns `true` if a record was written.
    pub fn write_input(&mut self, now: f64, snapshot: &InputSnapshot) -> bool {
        if self.last_written.as_ref() == Some(snapshot) {
            return false;
        }
        let timestamp = now - self.origin;
        let Some(writer) = self.writer.as_mut() else {
            return false;
        };
        match writer.write_input(timestamp, snapshot) {
            Ok(()) => {
                self.last_timestamp = timestamp;
                self.last_written = Some(snapshot.clone());
                true
            }
            Err(e) => {
                log::error!(
                    "failed to write input record to {}: {e}",
                    self.path.display()
                );
                false
            }
        }
    }

    /// Record a sync signal.
    pub fn write_signal(&mut self, now: f64, signal_id: i32) {
        let timestamp = now - self.origin;
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        match writer.write_signal(timestamp, signal_id) {
            Ok(()) => self.last_timestamp = self.last_timestamp.max(timestamp),
            Err(e) => log::error!(
                "failed to write signal {signal_id} to {}: {e}",
                self.path.display()
            ),
        }
    }

    /// Record a Pin or Track value.
    pub fn write_data_record(&mut self, kind: DataKind, key: u32, index: u32, bytes: &[u8]) {
        let Some(record) = DataRecord::new(key, index, bytes) else {
            log::error!(
                "{kind} payload for key {key} is {} bytes, maximum is {MAX_PAYLOAD}; skipped",
                bytes.len()
            );
            return;
        };
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if let Err(e) = writer.write_data(kind, &record) {
            log::error!(
                "failed to write {kind} record (key {key}, index {index}) to {}: {e}",
                self.path.display()
            );
        }
    }

    /// Size and record counts of the trace written so far.
    pub fn metrics(&self) -> TraceMetrics {
        match &self.writer {
            Some(w) => TraceMetrics {
                counts: w.counts(),
                duration: self.last_timestamp,
                file_size: Some(w.bytes_written()),
            },
            None => TraceMetrics::default(),
        }
    }

    /// Path of the trace.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the END terminator and close the file.
    ///
    /// Returns the final metrics, or `None` if the recorder was already
    /// closed.
    pub fn close(&mut self) -> Option<TraceMetrics> {
        let mut metrics = self.metrics();
        let writer = self.writer.take()?;
        if let Some(size) = metrics.file_size.as_mut() {
            *size += 1;
        }
        if let Err(e) = writer.finish() {
            log::error!("failed to finalize {}: {e}", self.path.display());
        }
        Some(metrics)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.close();
    }
}

fn open_writer(path: &Path) -> Result<FileWriter, TraceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    TraceWriter::new(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::Key;
    use rewind_trace::load_file;

    #[test]
    fn identical_snapshots_are_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/run.trace");
        let mut rec = Recorder::create(&path, 10.0).unwrap();

        let idle = InputSnapshot::empty();
        assert!(rec.write_input(10.0, &idle));
        for i in 1..5 {
            assert!(!rec.write_input(10.0 + f64::from(i) * 0.1, &idle));
        }
        let mut pressed = idle.clone();
        pressed.set_key(Key::A, true);
        assert!(rec.write_input(11.0, &pressed));
        let metrics = rec.close().unwrap();
        assert_eq!(metrics.counts.inputs, 2);

        let trace = load_file(&path).unwrap();
        assert!(trace.terminated);
        assert_eq!(trace.inputs.len(), 2);
        assert_eq!(trace.inputs[0].timestamp, 0.0);
        assert!((trace.inputs[1].timestamp - 1.0).abs() < 1e-12);
        assert_eq!(metrics.file_size, Some(std::fs::metadata(&path).unwrap().len()));
    }

    #[test]
    fn oversized_payload_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.trace");
        let mut rec = Recorder::create(&path, 0.0).unwrap();
        rec.write_data_record(DataKind::Pin, 1, 0, &[0u8; MAX_PAYLOAD + 1]);
        rec.write_data_record(DataKind::Pin, 1, 0, &[0u8; MAX_PAYLOAD]);
        assert_eq!(rec.metrics().counts.pins, 1);
    }

    #[test]
    fn restart_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.trace");
        let mut rec = Recorder::create(&path, 0.0).unwrap();
        rec.write_input(0.0, &InputSnapshot::empty());
        rec.write_signal(0.5, 9);
        rec.restart(1.0);
        rec.write_signal(1.25, 3);
        rec.close();

        let trace = load_file(&path).unwrap();
        assert!(trace.inputs.is_empty());
        assert_eq!(trace.signals.len(), 1);
        assert_eq!(trace.signals[0].signal_id, 3);
        assert_eq!(trace.signals[0].timestamp, 0.25);
    }

    #[test]
    fn closed_recorder_ignores_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.trace");
        let mut rec = Recorder::create(&path, 0.0).unwrap();
        assert!(rec.close().is_some());
        assert!(rec.close().is_none());
        assert!(!rec.write_input(1.0, &InputSnapshot::empty()));
        rec.write_signal(1.0, 1);
        assert_eq!(load_file(&path).unwrap().counts().total(), 0);
    }
}
