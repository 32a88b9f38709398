use super::MetricsCollector;

pub struct DeliveryMonitor {
    collector: MetricsCollector,
}

impl DeliveryMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let mut report = String::from("=== Live Series Metrics ===\n");

        match self.collector.producer_snapshot() {
            Some(p) => report.push_str(&format!(
                "\n[producer:{}]\n  Ticks: {} produced\n  Failures: {}\n  Avg Tick Latency: {}μs\n",
                p.source_name,
                p.ticks_produced,
                if p.tick_failures > 0 {
                    format!("{} skipped tick{}", p.tick_failures, if p.tick_failures == 1 { "" } else { "s" })
                } else {
                    "0 skipped ticks".to_string()
                },
                p.avg_latency_us
            )),
            None => report.push_str("\nNo producer registered\n"),
        }

        let sessions = self.collector.session_snapshots();
        if sessions.is_empty() {
            report.push_str("\nNo viewers connected\n");
            return report;
        }

        for s in sessions {
            report.push_str(&format!(
                "\n[session:{}]\n  Delivered: {}\n  Duplicates ignored: {}\n  Overflow dropped: {}\n  Catch-ups: {}\n  Resyncs: {}\n",
                s.session_id, s.delivered, s.duplicates_ignored, s.overflow_dropped, s.catch_ups, s.resyncs
            ));
        }

        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}
