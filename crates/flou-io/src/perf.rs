use std::{
    fmt,
    time::{Duration, Instant},
};

/// Resident memory of the current process, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemorySnapshot {
    /// Resident set size.
    pub resident_bytes: u64,
}

impl MemorySnapshot {
    /// Samples the resident set size of the current process.
    ///
    /// Returns `None` on platforms without `/proc/self/status`.
    pub fn current() -> Option<Self> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss(&status).map(|resident_bytes| Self { resident_bytes })
    }
}

fn parse_vm_rss(status: &str) -> Option<u64> {
    let line = status.lines().find(|l| l.starts_with("VmRSS:"))?;
    let mut fields = line["VmRSS:".len()..].split_whitespace();
    let value = fields.next()?.parse::<u64>().ok()?;
    match fields.next() {
        Some("kB") | None => Some(value * 1024),
        Some(_) => None,
    }
}

/// Timing and memory figures for one measured unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfReport {
    /// Logical CPUs available to the process.
    pub num_cpus: usize,
    /// Wall-clock time spent in the measured closure.
    pub elapsed: Duration,
    /// Memory sampled right before the closure ran.
    pub memory_before: Option<MemorySnapshot>,
    /// Memory sampled right after the closure returned.
    pub memory_after: Option<MemorySnapshot>,
}

impl PerfReport {
    /// Growth of the resident set across the measurement, if both samples exist.
    pub fn memory_delta(&self) -> Option<i64> {
        let before = self.memory_before?.resident_bytes as i64;
        let after = self.memory_after?.resident_bytes as i64;
        Some(after - before)
    }
}

impl fmt::Display for PerfReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cpus: {} elapsed: {:.3} ms",
            self.num_cpus,
            self.elapsed.as_secs_f64() * 1e3
        )?;
        match self.memory_after {
            Some(after) => write!(
                f,
                " rss: {:.2} MiB",
                after.resident_bytes as f64 / (1024.0 * 1024.0)
            )?,
            None => write!(f, " rss: n/a")?,
        }
        if let Some(delta) = self.memory_delta() {
            write!(f, " (delta {:+} KiB)", delta / 1024)?;
        }
        Ok(())
    }
}

/// Runs `f` once and reports how long it took and how the process memory moved.
///
/// # Example
///
/// ```
/// use flou_io::perf::measure;
///
/// let (sum, report) = measure(|| (0..1000u64).sum::<u64>());
///
/// assert_eq!(sum, 499_500);
/// assert!(report.num_cpus >= 1);
/// ```
pub fn measure<R>(f: impl FnOnce() -> R) -> (R, PerfReport) {
    let num_cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let memory_before = MemorySnapshot::current();
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    let memory_after = MemorySnapshot::current();

    let report = PerfReport {
        num_cpus,
        elapsed,
        memory_before,
        memory_after,
    };
    log::debug!("{report}");

    (result, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_status() {
        let status = "Name:\tflou\nVmPeak:\t  10000 kB\nVmRSS:\t    2048 kB\nThreads:\t4\n";
        assert_eq!(parse_vm_rss(status), Some(2048 * 1024));
        assert_eq!(parse_vm_rss("Name:\tflou\n"), None);
        assert_eq!(parse_vm_rss("VmRSS:\t12 MB\n"), None);
    }

    #[test]
    fn measure_sleep() {
        let ((), report) = measure(|| std::thread::sleep(Duration::from_millis(5)));
        assert!(report.elapsed >= Duration::from_millis(5));
        assert!(report.num_cpus >= 1);

        if cfg!(target_os = "linux") {
            assert!(report.memory_before.is_some());
            assert!(report.memory_after.is_some());
        }
        assert!(report.to_string().starts_with("cpus: "));
    }

    #[test]
    fn display_without_memory() {
        let report = PerfReport {
            num_cpus: 8,
            elapsed: Duration::from_micros(1500),
            memory_before: None,
            memory_after: None,
        };
        assert_eq!(report.to_string(), "cpus: 8 elapsed: 1.500 ms rss: n/a");
    }
}
