//! Relay metric recording
//!
//! Free functions feed the `metrics` facade (a no-op until a recorder is
//! installed); `RelayMetricsAggregator` keeps in-memory totals for the end
//! of run summary.

use std::fmt;

use contracts::{CompositeEvent, SinkKind, SinkOutcome};
use metrics::{counter, gauge, histogram};

/// Record one finished composite event
pub fn record_event(event: &CompositeEvent) {
    counter!("sensor_relay_readings_ingested_total").increment(1);
    gauge!("sensor_relay_last_temperature").set(event.sensor.temperature);
    gauge!("sensor_relay_last_humidity").set(event.sensor.humidity);

    for kind in [SinkKind::Ledger, SinkKind::Streaming] {
        let status = match event.outcome(kind) {
            None => "absent",
            Some(o) if o.success => "success",
            Some(_) => "failure",
        };
        counter!(
            "sensor_relay_sink_outcomes_total",
            "sink" => kind.as_str(),
            "status" => status
        )
        .increment(1);
    }
}

/// Record how long one sink call took
pub fn record_sink_latency_ms(kind: SinkKind, latency_ms: f64) {
    histogram!("sensor_relay_sink_latency_ms", "sink" => kind.as_str()).record(latency_ms);
}

/// Record the full per-reading pipeline latency
pub fn record_ingest_latency_ms(latency_ms: f64) {
    histogram!("sensor_relay_ingest_latency_ms").record(latency_ms);
}

/// Record a reading dropped by the work queue policy
pub fn record_reading_dropped(policy: &'static str) {
    counter!("sensor_relay_readings_dropped_total", "policy" => policy).increment(1);
}

/// Record the history window length
pub fn record_history_len(len: usize) {
    gauge!("sensor_relay_history_len").set(len as f64);
}

/// Record the connected observer count
pub fn record_observers(count: usize) {
    gauge!("sensor_relay_observers").set(count as f64);
}

/// Record one broadcast
pub fn record_broadcast(delivered: usize, dropped: usize, removed: usize) {
    counter!("sensor_relay_frames_delivered_total").increment(delivered as u64);
    if dropped > 0 {
        counter!("sensor_relay_frames_dropped_total").increment(dropped as u64);
    }
    if removed > 0 {
        counter!("sensor_relay_observers_removed_total").increment(removed as u64);
    }
}

/// Per-sink outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkTally {
    pub success: u64,
    pub failure: u64,
    pub absent: u64,
}

impl SinkTally {
    fn update(&mut self, outcome: Option<&SinkOutcome>) {
        match outcome {
            None => self.absent += 1,
            Some(o) if o.success => self.success += 1,
            Some(_) => self.failure += 1,
        }
    }

    pub fn attempted(&self) -> u64 {
        self.success + self.failure
    }
}

impl fmt::Display for SinkTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ok={} failed={} absent={}",
            self.success, self.failure, self.absent
        )
    }
}

/// In-memory aggregation over a run
#[derive(Debug, Clone, Default)]
pub struct RelayMetricsAggregator {
    /// Total events
    pub total_events: u64,

    pub ledger: SinkTally,

    pub streaming: SinkTally,

    /// Pipeline latency per reading (ms)
    pub latency_stats: RunningStats,

    /// Temperature stats
    pub temperature_stats: RunningStats,

    /// Humidity stats
    pub humidity_stats: RunningStats,
}

impl RelayMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event and its pipeline latency into the totals
    pub fn update(&mut self, event: &CompositeEvent, latency_ms: f64) {
        self.total_events += 1;
        self.ledger.update(event.ledger.as_ref());
        self.streaming.update(event.streaming.as_ref());
        self.latency_stats.push(latency_ms);
        self.temperature_stats.push(event.sensor.temperature);
        self.humidity_stats.push(event.sensor.humidity);
    }

    pub fn summary(&self) -> RelaySummary {
        RelaySummary {
            total_events: self.total_events,
            ledger: self.ledger,
            streaming: self.streaming,
            latency_ms: StatsSummary::from(&self.latency_stats),
            temperature: StatsSummary::from(&self.temperature_stats),
            humidity: StatsSummary::from(&self.humidity_stats),
        }
    }
}

/// Run summary
#[derive(Debug, Clone, Default)]
pub struct RelaySummary {
    pub total_events: u64,
    pub ledger: SinkTally,
    pub streaming: SinkTally,
    pub latency_ms: StatsSummary,
    pub temperature: StatsSummary,
    pub humidity: StatsSummary,
}

impl fmt::Display for RelaySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Relay Metrics Summary ===")?;
        writeln!(f, "Total events: {}", self.total_events)?;
        writeln!(f, "Ledger: {}", self.ledger)?;
        writeln!(f, "Streaming: {}", self.streaming)?;
        writeln!(f, "Pipeline latency (ms): {}", self.latency_ms)?;
        writeln!(f, "Temperature (°C): {}", self.temperature)?;
        writeln!(f, "Humidity (%): {}", self.humidity)
    }
}

/// Summary statistics
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
