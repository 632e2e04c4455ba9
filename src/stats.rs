//! Latency sample collection and the end-of-run summary.
//!
//! The per-sample output contract (one flushed line per acknowledged probe)
//! lives in the event processor; this module only aggregates samples and
//! prints a summary when the session ends.

/// Output format for the final summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for machine consumption.
    Json,
}

/// Collects round-trip samples and computes derived statistics.
#[derive(Debug, Default)]
pub struct RttCollector {
    count: u64,
    min_ns: Option<u64>,
    max_ns: Option<u64>,
    sum_ns: u128,
    jitter_sum_ns: u128,
    jitter_count: u64,
    last_rtt_ns: Option<u64>,
}

impl RttCollector {
    /// Creates a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new round-trip sample.
    pub fn record(&mut self, rtt_ns: u64) {
        self.count += 1;
        self.min_ns = Some(self.min_ns.map_or(rtt_ns, |m| m.min(rtt_ns)));
        self.max_ns = Some(self.max_ns.map_or(rtt_ns, |m| m.max(rtt_ns)));
        self.sum_ns += rtt_ns as u128;

        // RFC 3550 jitter: mean |RTT_i - RTT_{i-1}|
        if let Some(prev) = self.last_rtt_ns {
            self.jitter_sum_ns += rtt_ns.abs_diff(prev) as u128;
            self.jitter_count += 1;
        }
        self.last_rtt_ns = Some(rtt_ns);
    }

    /// Number of samples recorded so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns mean jitter in nanoseconds (RFC 3550 definition).
    pub fn jitter_ns(&self) -> Option<u64> {
        if self.jitter_count == 0 {
            return None;
        }
        Some((self.jitter_sum_ns / self.jitter_count as u128) as u64)
    }

    /// Builds a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            probes_acked: self.count,
            min_rtt_ms: self.min_ns.map(ns_to_ms),
            max_rtt_ms: self.max_ns.map(ns_to_ms),
            avg_rtt_ms: if self.count > 0 {
                Some(self.sum_ns as f64 / self.count as f64 / 1_000_000.0)
            } else {
                None
            },
            jitter_ms: self.jitter_ns().map(ns_to_ms),
        }
    }
}

fn ns_to_ms(ns: u64) -> f64 {
    ns as f64 / 1_000_000.0
}

/// Serializable end-of-run statistics snapshot.
#[derive(Debug, serde::Serialize)]
pub struct StatsSnapshot {
    pub probes_acked: u64,
    pub min_rtt_ms: Option<f64>,
    pub max_rtt_ms: Option<f64>,
    pub avg_rtt_ms: Option<f64>,
    pub jitter_ms: Option<f64>,
}

impl StatsSnapshot {
    /// Prints the final summary to stderr in the given format.
    ///
    /// Stderr keeps the summary out of the sample stream when samples go to
    /// stdout.
    pub fn print(&self, format: SummaryFormat) {
        match format {
            SummaryFormat::Text => self.print_text(),
            SummaryFormat::Json => self.print_json(),
        }
    }

    fn print_text(&self) {
        eprintln!("\n--- PING statistics ---");
        eprintln!("Probes acknowledged: {}", self.probes_acked);
        if let Some(v) = self.min_rtt_ms {
            eprintln!("Min RTT: {:.3} ms", v);
        }
        if let Some(v) = self.max_rtt_ms {
            eprintln!("Max RTT: {:.3} ms", v);
        }
        if let Some(v) = self.avg_rtt_ms {
            eprintln!("Avg RTT: {:.3} ms", v);
        }
        if let Some(v) = self.jitter_ms {
            eprintln!("Jitter: {:.3} ms", v);
        }
    }

    fn print_json(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            eprintln!("{}", json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collector_snapshot() {
        let snapshot = RttCollector::new().snapshot();
        assert_eq!(snapshot.probes_acked, 0);
        assert!(snapshot.min_rtt_ms.is_none());
        assert!(snapshot.avg_rtt_ms.is_none());
        assert!(snapshot.jitter_ms.is_none());
    }

    #[test]
    fn min_max_avg_computed() {
        let mut collector = RttCollector::new();
        collector.record(1_000_000);
        collector.record(3_000_000);
        collector.record(2_000_000);
        let snapshot = collector.snapshot();
        assert_eq!(snapshot.probes_acked, 3);
        assert_eq!(snapshot.min_rtt_ms, Some(1.0));
        assert_eq!(snapshot.max_rtt_ms, Some(3.0));
        assert_eq!(snapshot.avg_rtt_ms, Some(2.0));
    }

    #[test]
    fn jitter_is_mean_absolute_delta() {
        let mut collector = RttCollector::new();
        collector.record(1_000_000);
        collector.record(3_000_000); // delta 2 ms
        collector.record(2_000_000); // delta 1 ms
        assert_eq!(collector.jitter_ns(), Some(1_500_000));
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut collector = RttCollector::new();
        collector.record(1_500_000);
        let json = serde_json::to_string(&collector.snapshot()).unwrap();
        assert!(json.contains("\"probes_acked\":1"));
        assert!(json.contains("\"min_rtt_ms\":1.5"));
    }
}
