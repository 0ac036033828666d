use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq)]
pub struct StepTiming {
    pub name: String,
    pub duration: Duration,
}

/// Named stage durations, returned alongside pipeline results instead of being
/// printed while the stages run.
#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    steps: Vec<StepTiming>,
    step_map: HashMap<String, Duration>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        *self.step_map.entry(name.clone()).or_insert(Duration::ZERO) += duration;
        self.steps.push(StepTiming { name, duration });
    }

    /// Records the closure's run time under `name` and passes its value through.
    pub fn time<T>(&mut self, name: impl Into<String>, f: impl FnOnce() -> T) -> T {
        let timer = Timer::start(name);
        let value = f();
        let (name, duration) = timer.stop();
        self.add_step(name, duration);
        value
    }

    pub fn extend(&mut self, other: &PipelineTimings) {
        for step in other.steps() {
            self.add_step(step.name.clone(), step.duration);
        }
    }

    /// Sum of all recorded steps. Concurrent steps are summed, so this can
    /// exceed the wall-clock time of the run.
    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub fn get_step(&self, name: &str) -> Option<Duration> {
        self.step_map.get(name).copied()
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn summary(&self) -> String {
        let total = self.total_duration();
        let mut out = String::new();
        let _ = writeln!(out, "Pipeline Timing Summary:");
        let _ = writeln!(out, "{:-<60}", "");
        for step in &self.steps {
            let percentage = if total.as_secs_f64() > 0.0 {
                (step.duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            let _ = writeln!(
                out,
                "{:<30} {:>12.3}ms ({:>5.1}%)",
                step.name,
                step.duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        let _ = writeln!(out, "{:-<60}", "");
        let _ = write!(out, "{:<30} {:>12.3}ms", "Total", total.as_secs_f64() * 1000.0);
        out
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn stop(self) -> (String, Duration) {
        (self.name, self.start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_steps_accumulate_in_lookup() {
        let mut timings = PipelineTimings::new();
        timings.add_step("merge", Duration::from_millis(5));
        timings.add_step("merge", Duration::from_millis(7));
        timings.add_step("align", Duration::from_millis(3));

        assert_eq!(timings.steps().len(), 3);
        assert_eq!(timings.get_step("merge"), Some(Duration::from_millis(12)));
        assert_eq!(timings.total_duration(), Duration::from_millis(15));
        assert_eq!(timings.get_step("calibrate"), None);
    }

    #[test]
    fn time_passes_value_through() {
        let mut timings = PipelineTimings::new();
        let value = timings.time("compute", || 41 + 1);
        assert_eq!(value, 42);
        assert!(timings.get_step("compute").is_some());
    }

    #[test]
    fn summary_lists_every_step() {
        let mut timings = PipelineTimings::new();
        timings.add_step("align", Duration::from_millis(2));
        timings.add_step("tonemap/Drago", Duration::from_millis(4));
        let summary = timings.summary();
        assert!(summary.contains("align"));
        assert!(summary.contains("tonemap/Drago"));
        assert!(summary.contains("Total"));
    }
}
