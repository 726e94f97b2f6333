//! Summary statistics for a trace.

use std::fmt;

use crate::loader::DecodedTrace;
use crate::types::RecordCounts;

/// Size and density figures logged when a trace is closed or loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TraceMetrics {
    /// Records per kind.
    pub counts: RecordCounts,
    /// Seconds covered by the recording.
    pub duration: f64,
    /// File size in bytes, if known.
    pub file_size: Option<u64>,
}

impl TraceMetrics {
    /// Metrics for a freshly decoded trace.
    pub fn from_decoded(trace: &DecodedTrace, file_size: Option<u64>) -> Self {
        Self {
            counts: trace.counts(),
            duration: trace.duration(),
            file_size,
        }
    }

    /// INPUT records per second of recording, or `0.0` for an instantaneous
    /// trace.
    pub fn input_density(&self) -> f64 {
        if self.duration > 0.0 {
            self.counts.inputs as f64 / self.duration
        } else {
            0.0
        }
    }
}

impl fmt::Display for TraceMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(size) = self.file_size {
            write!(f, "{size} bytes, ")?;
        }
        write!(
            f,
            "{:.3}s, {} inputs ({:.1}/s), {} signals, {} pins, {} tracks",
            self.duration,
            self.counts.inputs,
            self.input_density(),
            self.counts.signals,
            self.counts.pins,
            self.counts.tracks,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_guards_zero_duration() {
        let metrics = TraceMetrics {
            counts: RecordCounts {
                inputs: 5,
                ..Default::default()
            },
            duration: 0.0,
            file_size: None,
        };
        assert_eq!(metrics.input_density(), 0.0);
    }

    #[test]
    fn display_includes_counts() {
        let metrics = TraceMetrics {
            counts: RecordCounts {
                inputs: 10,
                signals: 2,
                pins: 3,
                tracks: 4,
            },
            duration: 2.0,
            file_size: Some(1234),
        };
        assert_eq!(
            metrics.to_string(),
            "1234 bytes, 2.000s, 10 inputs (5.0/s), 2 signals, 3 pins, 4 tracks"
        );
    }
}
