//! Host-side call history: the same accumulate-then-normalize aggregation the
//! generated `GetOpAvgTime()` performs, for timings recorded or collected in
//! Rust.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::options::AggregationPolicy;

/// Operator name to elapsed microseconds for one invocation.
pub type ProfilerResult = BTreeMap<String, f64>;

/// Mean time per operator over `runs`. Empty input yields an empty map.
pub fn average_per_operator(runs: &[ProfilerResult], policy: AggregationPolicy) -> ProfilerResult {
    let Some(first) = runs.first() else {
        return ProfilerResult::new();
    };
    match policy {
        AggregationPolicy::Union => {
            let mut totals: BTreeMap<&str, (f64, u64)> = BTreeMap::new();
            for run in runs {
                for (name, micros) in run {
                    let entry = totals.entry(name.as_str()).or_insert((0.0, 0));
                    entry.0 += micros;
                    entry.1 += 1;
                }
            }
            totals
                .into_iter()
                .map(|(name, (total, count))| (name.to_string(), total / count as f64))
                .collect()
        }
        AggregationPolicy::FirstCall => {
            let mut avg = first.clone();
            for run in &runs[1..] {
                for (name, total) in avg.iter_mut() {
                    if let Some(micros) = run.get(name) {
                        *total += micros;
                    }
                }
            }
            let calls = runs.len() as f64;
            for total in avg.values_mut() {
                *total /= calls;
            }
            avg
        }
    }
}

/// Append-only history of per-call timing maps, safe to share across threads.
#[derive(Debug, Default)]
pub struct CallHistory {
    runs: Mutex<Vec<ProfilerResult>>,
    policy: AggregationPolicy,
}

impl CallHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: AggregationPolicy) -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            policy,
        }
    }

    pub fn from_runs(runs: Vec<ProfilerResult>, policy: AggregationPolicy) -> Self {
        Self {
            runs: Mutex::new(runs),
            policy,
        }
    }

    pub fn from_json(json: &str, policy: AggregationPolicy) -> serde_json::Result<Self> {
        let runs: Vec<ProfilerResult> = serde_json::from_str(json)?;
        Ok(Self::from_runs(runs, policy))
    }

    pub fn policy(&self) -> AggregationPolicy {
        self.policy
    }

    pub fn record(&self, run: ProfilerResult) {
        self.runs
            .lock()
            .expect("call history mutex poisoned")
            .push(run);
    }

    /// Starts timing a new invocation; the run is appended on
    /// [`RunRecorder::finish`].
    pub fn begin_run(&self) -> RunRecorder<'_> {
        RunRecorder {
            history: self,
            current: ProfilerResult::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.runs.lock().expect("call history mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<ProfilerResult> {
        self.runs.lock().expect("call history mutex poisoned").clone()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let runs = self.runs.lock().expect("call history mutex poisoned");
        serde_json::to_string_pretty(&*runs)
    }

    pub fn average_per_operator(&self) -> ProfilerResult {
        let runs = self.runs.lock().expect("call history mutex poisoned");
        average_per_operator(&runs, self.policy)
    }
}

/// Times the operators of a single invocation.
#[must_use = "call finish() to record the run"]
pub struct RunRecorder<'a> {
    history: &'a CallHistory,
    current: ProfilerResult,
}

impl RunRecorder<'_> {
    /// Runs `op` and stores its wall-clock duration, truncated to whole
    /// microseconds, under `name`.
    pub fn time<T>(&mut self, name: &str, op: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = op();
        let micros = start.elapsed().as_micros() as f64;
        self.current.insert(name.to_string(), micros);
        out
    }

    pub fn current(&self) -> &ProfilerResult {
        &self.current
    }

    pub fn finish(self) {
        self.history.record(self.current);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpTimingRow {
    pub name: String,
    pub mean_us: f64,
    /// Share of the summed means, in percent.
    pub percent: f64,
}

/// Rows sorted by mean time, slowest first; ties break on name.
pub fn summary_rows(averages: &ProfilerResult) -> Vec<OpTimingRow> {
    let total: f64 = averages.values().sum();
    let mut rows: Vec<OpTimingRow> = averages
        .iter()
        .map(|(name, mean_us)| OpTimingRow {
            name: name.clone(),
            mean_us: *mean_us,
            percent: if total > 0.0 {
                mean_us / total * 100.0
            } else {
                0.0
            },
        })
        .collect();
    rows.sort_by(|a, b| {
        b.mean_us
            .total_cmp(&a.mean_us)
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}
