use std::fmt;
use std::time::{Duration, Instant};

use tracing::info;

/// Stages of a single conversion, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Load,
    DebugSave,
    Save,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Load, Stage::DebugSave, Stage::Save];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::DebugSave => "debug_save",
            Stage::Save => "save",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Wall-clock time spent in each stage of one conversion. A stage that runs
/// more than once accumulates.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StageTimings {
    slots: [Option<Duration>; 3],
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f`, charging its duration to `stage` whether or not it fails.
    pub fn time<T, E>(&mut self, stage: Stage, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let start = Instant::now();
        let result = f();
        self.record(stage, start.elapsed());
        result
    }

    pub fn record(&mut self, stage: Stage, elapsed: Duration) {
        let slot = &mut self.slots[stage.slot()];
        *slot = Some(slot.unwrap_or_default() + elapsed);
    }

    pub fn get(&self, stage: Stage) -> Option<Duration> {
        self.slots[stage.slot()]
    }

    /// Stages that ran, in pipeline order.
    pub fn stages(&self) -> impl Iterator<Item = (Stage, Duration)> + '_ {
        Stage::ALL
            .into_iter()
            .filter_map(|stage| self.get(stage).map(|elapsed| (stage, elapsed)))
    }

    pub fn total(&self) -> Duration {
        self.stages().map(|(_, elapsed)| elapsed).sum()
    }

    pub fn log_summary(&self) {
        let total = self.total().as_secs_f64();
        for (stage, elapsed) in self.stages() {
            let share = if total > 0.0 { elapsed.as_secs_f64() / total * 100.0 } else { 0.0 };
            info!(
                stage = stage.name(),
                "{:<10} {:>9.3}ms {:>5.1}%",
                stage,
                elapsed.as_secs_f64() * 1000.0,
                share
            );
        }
        info!("{:<10} {:>9.3}ms", "total", total * 1000.0);
    }
}
