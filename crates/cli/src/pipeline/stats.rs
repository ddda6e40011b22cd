//! Run statistics.

use std::time::Duration;

use broadcaster::BroadcastMetricsSnapshot;
use ingestion::IngestionSnapshot;
use observability::RelaySummary;
use recorders::MetricsSnapshot;

/// Statistics from one relay run
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Device that produced the readings
    pub device_id: String,

    /// Source and queue counters
    pub ingestion: IngestionSnapshot,

    /// Fan-out counters
    pub broadcast: BroadcastMetricsSnapshot,

    /// Ledger recorder counters (None = not configured)
    pub ledger: Option<MetricsSnapshot>,

    /// Streaming recorder counters (None = not enabled)
    pub streaming: Option<MetricsSnapshot>,

    /// Aggregated event outcomes
    pub summary: RelaySummary,

    /// Total duration of the run
    pub duration: Duration,
}

impl RelayStats {
    /// Processed readings per second
    pub fn readings_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.ingestion.readings_processed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Share of generated readings lost to the drop policy, in percent
    pub fn drop_rate(&self) -> f64 {
        if self.ingestion.readings_generated > 0 {
            (self.ingestion.readings_dropped as f64 / self.ingestion.readings_generated as f64)
                * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                      Relay Statistics                        ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Device: {}", self.device_id);
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Readings generated: {}", self.ingestion.readings_generated);
        println!("   ├─ Readings processed: {}", self.ingestion.readings_processed);
        println!(
            "   ├─ Readings dropped: {} ({:.2}%)",
            self.ingestion.readings_dropped,
            self.drop_rate()
        );
        println!("   ├─ Manual triggers: {}", self.ingestion.triggers);
        println!("   └─ Throughput: {:.2} readings/s", self.readings_per_sec());

        println!("\n📝 Recorders");
        print_recorder("Ledger", self.ledger.as_ref(), "├─");
        print_recorder("Streaming", self.streaming.as_ref(), "└─");

        println!("\n📡 Observers");
        println!("   ├─ Connected (total): {}", self.broadcast.connected_total);
        println!("   ├─ Events broadcast: {}", self.broadcast.events_broadcast);
        println!("   ├─ Frames delivered: {}", self.broadcast.frames_delivered);
        println!("   ├─ Frames dropped: {}", self.broadcast.frames_dropped);
        println!("   └─ Observers removed: {}", self.broadcast.observers_removed);

        println!("\n📈 Outcomes");
        println!("   ├─ Ledger: {}", self.summary.ledger);
        println!("   ├─ Streaming: {}", self.summary.streaming);
        println!("   ├─ Pipeline latency (ms): {}", self.summary.latency_ms);
        println!("   ├─ Temperature (°C): {}", self.summary.temperature);
        println!("   └─ Humidity (%): {}", self.summary.humidity);

        println!();
    }
}

fn print_recorder(label: &str, snapshot: Option<&MetricsSnapshot>, branch: &str) {
    match snapshot {
        Some(m) => println!(
            "   {branch} {label}: attempts={} ok={} failed={} timeouts={} last={:.1}ms",
            m.attempt_count,
            m.success_count,
            m.failure_count,
            m.timeout_count,
            m.last_latency.as_secs_f64() * 1000.0
        ),
        None => println!("   {branch} {label}: not configured"),
    }
}
