//! Counters and histograms emitted by the synthesizer.

use parking_lot::Mutex;

/// Cache lookups, tagged `found:yes` or `found:no`.
pub const CACHE_REQUESTS: &str = "tts.cache.requests";
/// Provider round trip in milliseconds, tagged `vendor:<id>`.
pub const RESPONSE_TIME: &str = "tts.response_time";
/// Provider calls, tagged `vendor:<id>` and `accepted:yes|no`.
pub const SYNTH_COUNT: &str = "tts.count";

/// Metrics sink injected into the synthesizer.
pub trait StatsSink: Send + Sync {
    fn increment(&self, name: &str, tags: &[String]);
    fn histogram(&self, name: &str, value: f64, tags: &[String]);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStats;

impl StatsSink for NoopStats {
    fn increment(&self, _name: &str, _tags: &[String]) {}
    fn histogram(&self, _name: &str, _value: f64, _tags: &[String]) {}
}

/// One recorded metric sample.
#[derive(Debug, Clone, PartialEq)]
pub struct StatSample {
    pub name: String,
    pub value: f64,
    pub tags: Vec<String>,
}

/// Keeps samples in memory.
#[derive(Debug, Default)]
pub struct MemoryStats {
    samples: Mutex<Vec<StatSample>>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> Vec<StatSample> {
        self.samples.lock().clone()
    }

    /// Sum of the values recorded under `name` carrying `tag`.
    pub fn count(&self, name: &str, tag: &str) -> f64 {
        self.samples
            .lock()
            .iter()
            .filter(|s| s.name == name && s.tags.iter().any(|t| t == tag))
            .map(|s| s.value)
            .sum()
    }

    fn record(&self, name: &str, value: f64, tags: &[String]) {
        self.samples.lock().push(StatSample {
            name: name.to_string(),
            value,
            tags: tags.to_vec(),
        });
    }
}

impl StatsSink for MemoryStats {
    fn increment(&self, name: &str, tags: &[String]) {
        self.record(name, 1.0, tags);
    }

    fn histogram(&self, name: &str, value: f64, tags: &[String]) {
        self.record(name, value, tags);
    }
}
