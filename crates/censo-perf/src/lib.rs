#![forbid(unsafe_code)]

use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::time::Instant;

use csv::WriterBuilder;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerfError {
    #[error("memory counter {field:?} is unavailable in /proc/self/status")]
    MemoryUnavailable { field: String },
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Resident-set size of the running process, in KB (`VmRSS`).
pub fn current_memory_kb() -> Result<i64, PerfError> {
    status_field_kb("VmRSS")
}

/// Peak resident-set size since process start, in KB (`VmHWM`). Monotone:
/// it only ever grows.
pub fn peak_memory_kb() -> Result<i64, PerfError> {
    status_field_kb("VmHWM")
}

/// Run `op` and report how much the peak-RSS high-water mark grew across
/// the call, attributing peak memory to that one unit of work without
/// disturbing the caller's baseline. Zero when the operation stayed under
/// a peak already reached earlier in the process.
pub fn measure_peak_kb<T>(op: impl FnOnce() -> T) -> Result<(T, i64), PerfError> {
    let before = peak_memory_kb()?;
    let value = op();
    let after = peak_memory_kb()?;
    Ok((value, (after - before).max(0)))
}

fn status_field_kb(field: &str) -> Result<i64, PerfError> {
    let status = fs::read_to_string("/proc/self/status")?;
    for line in status.lines() {
        let Some(rest) = line.strip_prefix(field) else {
            continue;
        };
        let Some(rest) = rest.strip_prefix(':') else {
            continue;
        };
        let kb = rest.trim().trim_end_matches("kB").trim();
        return kb.parse::<i64>().map_err(|_| PerfError::MemoryUnavailable {
            field: field.to_owned(),
        });
    }
    Err(PerfError::MemoryUnavailable {
        field: field.to_owned(),
    })
}

/// One recorded operation: name, wall time, memory delta.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpRecord {
    pub operation: String,
    pub elapsed_ms: f64,
    pub memory_kb: i64,
}

/// Aggregate view over the recorded log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonitorSummary {
    pub operations: usize,
    pub total_elapsed_ms: f64,
    pub mean_elapsed_ms: f64,
    pub peak_memory_kb: i64,
}

/// Wall-time and memory monitor with an append-only operation log.
///
/// Single active timing interval; the log is only ever appended, and the
/// running totals (time sum, memory max) are updated on each append.
#[derive(Debug, Default)]
pub struct Monitor {
    started: Option<Instant>,
    records: Vec<OpRecord>,
    total_elapsed_ms: f64,
    peak_memory_kb: i64,
}

impl Monitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the single timing interval. Starting again discards the
    /// previous start point.
    pub fn start_timer(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Close the interval and return elapsed milliseconds. Stopping
    /// without a matching start reads as zero.
    pub fn stop_timer(&mut self) -> f64 {
        match self.started.take() {
            Some(started) => started.elapsed().as_secs_f64() * 1_000.0,
            None => 0.0,
        }
    }

    /// Append one operation to the log.
    pub fn record(&mut self, operation: &str, elapsed_ms: f64, memory_kb: i64) {
        self.total_elapsed_ms += elapsed_ms;
        self.peak_memory_kb = self.peak_memory_kb.max(memory_kb);
        self.records.push(OpRecord {
            operation: operation.to_owned(),
            elapsed_ms,
            memory_kb,
        });
    }

    #[must_use]
    pub fn records(&self) -> &[OpRecord] {
        &self.records
    }

    #[must_use]
    pub fn summary(&self) -> MonitorSummary {
        let operations = self.records.len();
        MonitorSummary {
            operations,
            total_elapsed_ms: self.total_elapsed_ms,
            mean_elapsed_ms: if operations == 0 {
                0.0
            } else {
                self.total_elapsed_ms / operations as f64
            },
            peak_memory_kb: self.peak_memory_kb,
        }
    }

    /// One-line stat the driver prints right after an operation.
    #[must_use]
    pub fn format_stat(operation: &str, elapsed_ms: f64, memory_kb: i64) -> String {
        format!("[perf] {operation}: {elapsed_ms:.3} ms, {memory_kb} KB")
    }

    /// Render the whole log plus the aggregate footer.
    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== PERFORMANCE SUMMARY ===");
        for record in &self.records {
            let _ = writeln!(
                out,
                "{:<32} {:>12.3} ms {:>10} KB",
                record.operation, record.elapsed_ms, record.memory_kb
            );
        }
        let summary = self.summary();
        let _ = writeln!(
            out,
            "operations: {}, mean time: {:.3} ms, peak memory: {} KB",
            summary.operations, summary.mean_elapsed_ms, summary.peak_memory_kb
        );
        out
    }

    /// Log as delimited text: `operation,elapsed_ms,memory_kb`, one row
    /// per recorded call.
    pub fn to_csv_string(&self) -> Result<String, PerfError> {
        let mut writer = WriterBuilder::new().from_writer(Vec::new());
        writer.write_record(["operation", "elapsed_ms", "memory_kb"])?;
        for record in &self.records {
            let elapsed = format!("{:.3}", record.elapsed_ms);
            let memory = record.memory_kb.to_string();
            writer.write_record([record.operation.as_str(), elapsed.as_str(), memory.as_str()])?;
        }
        let bytes = writer.into_inner().map_err(|err| err.into_error())?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Write the CSV log to `path`. The only failure mode is the
    /// destination itself, reported to the caller.
    pub fn export_csv(&self, path: &Path) -> Result<(), PerfError> {
        fs::write(path, self.to_csv_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Monitor, PerfError};

    #[test]
    fn stop_without_start_reads_as_zero() {
        let mut monitor = Monitor::new();
        assert_eq!(monitor.stop_timer(), 0.0);
    }

    #[test]
    fn timer_measures_a_non_negative_interval_once() {
        let mut monitor = Monitor::new();
        monitor.start_timer();
        let elapsed = monitor.stop_timer();
        assert!(elapsed >= 0.0);
        // The interval is consumed.
        assert_eq!(monitor.stop_timer(), 0.0);
    }

    #[test]
    fn record_accumulates_totals() {
        let mut monitor = Monitor::new();
        monitor.record("generate dataset", 12.5, 2_048);
        monitor.record("find by id", 0.5, 16);
        monitor.record("oldest overall", 3.0, 512);

        let summary = monitor.summary();
        assert_eq!(summary.operations, 3);
        assert!((summary.total_elapsed_ms - 16.0).abs() < 1e-9);
        assert!((summary.mean_elapsed_ms - 16.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.peak_memory_kb, 2_048);
        assert_eq!(monitor.records().len(), 3);
        assert_eq!(monitor.records()[1].operation, "find by id");
    }

    #[test]
    fn empty_summary_is_all_zero() {
        let summary = Monitor::new().summary();
        assert_eq!(summary.operations, 0);
        assert_eq!(summary.total_elapsed_ms, 0.0);
        assert_eq!(summary.mean_elapsed_ms, 0.0);
        assert_eq!(summary.peak_memory_kb, 0);
    }

    #[test]
    fn csv_export_matches_the_golden_shape() {
        let mut monitor = Monitor::new();
        monitor.record("generate dataset", 12.5, 2_048);
        monitor.record("find by id", 0.125, -8);

        let csv = monitor.to_csv_string().expect("in-memory export");
        let expected = "operation,elapsed_ms,memory_kb\n\
                        generate dataset,12.500,2048\n\
                        find by id,0.125,-8\n";
        assert_eq!(csv, expected);
    }

    #[test]
    fn csv_export_writes_the_destination() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("perf_log.csv");

        let mut monitor = Monitor::new();
        monitor.record("oldest overall", 1.0, 4);
        monitor.export_csv(&path).expect("export succeeds");

        let written = std::fs::read_to_string(&path).expect("file exists");
        assert!(written.starts_with("operation,elapsed_ms,memory_kb"));
        assert!(written.contains("oldest overall,1.000,4"));
    }

    #[test]
    fn export_reports_a_bad_destination() {
        let monitor = Monitor::new();
        let err = monitor
            .export_csv(std::path::Path::new("/nonexistent-dir/perf_log.csv"))
            .expect_err("must fail");
        assert!(matches!(err, PerfError::Io(_)));
    }

    #[test]
    fn op_record_serializes_with_snake_case_fields() {
        let mut monitor = Monitor::new();
        monitor.record("find by id", 0.5, 16);
        let value = serde_json::to_value(&monitor.records()[0]).expect("serialize record");
        assert_eq!(value["operation"], "find by id");
        assert_eq!(value["memory_kb"], 16);
    }

    #[test]
    fn format_stat_is_one_line() {
        let line = Monitor::format_stat("find by id", 0.5, 16);
        assert_eq!(line, "[perf] find by id: 0.500 ms, 16 KB");
    }

    #[cfg(target_os = "linux")]
    mod linux {
        use super::super::{current_memory_kb, measure_peak_kb, peak_memory_kb};

        #[test]
        fn resident_memory_is_positive() {
            let rss = current_memory_kb().expect("procfs available");
            assert!(rss > 0);
        }

        #[test]
        fn peak_never_trails_resident() {
            let rss = current_memory_kb().expect("procfs available");
            let peak = peak_memory_kb().expect("procfs available");
            assert!(peak >= rss);
        }

        #[test]
        fn peak_delta_is_non_negative_and_returns_the_value() {
            let (value, delta) = measure_peak_kb(|| {
                let block = vec![0u8; 4 * 1024 * 1024];
                block.len()
            })
            .expect("procfs available");
            assert_eq!(value, 4 * 1024 * 1024);
            assert!(delta >= 0);
        }
    }
}
