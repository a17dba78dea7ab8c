//! Progress reporting

use tracing::info;

/// Receiver of progress updates during a load.
///
/// All methods default to doing nothing so reporters only implement what
/// they display.
pub trait ProgressReporter {
    fn set_method_title(&mut self, _title: &str) {}

    fn set_info(&mut self, _info: &str) {}

    fn start(&mut self) {}

    /// Completion in percent, `0.0..=100.0`
    fn update(&mut self, _percent: f32) {}

    /// Called repeatedly while waiting on work of unknown length
    fn pulse(&mut self) {}

    fn stop(&mut self) {}
}

/// Discards all progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {}

/// Logs progress through `tracing` every `step` percent
#[derive(Debug, Clone)]
pub struct LogProgress {
    title: String,
    step: f32,
    next: f32,
}

impl LogProgress {
    pub fn new(step: f32) -> Self {
        Self {
            title: String::new(),
            step: step.max(1.0),
            next: 0.0,
        }
    }
}

impl Default for LogProgress {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl ProgressReporter for LogProgress {
    fn set_method_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn set_info(&mut self, info: &str) {
        info!("{}: {}", self.title, info);
    }

    fn start(&mut self) {
        self.next = self.step;
    }

    fn update(&mut self, percent: f32) {
        if percent >= self.next {
            info!("{}: {:.0}%", self.title, percent);
            while self.next <= percent {
                self.next += self.step;
            }
        }
    }

    fn stop(&mut self) {
        info!("{}: done", self.title);
    }
}

/// Turns a known number of steps into percent updates.
///
/// The reporter only hears about whole-percent changes, so calling
/// [`one_step`](Self::one_step) per point stays cheap.
pub struct NormalizedProgress<'a> {
    reporter: &'a mut dyn ProgressReporter,
    total: usize,
    counter: usize,
    last_percent: usize,
}

impl<'a> NormalizedProgress<'a> {
    pub fn new(reporter: &'a mut dyn ProgressReporter, total: usize) -> Self {
        Self {
            reporter,
            total,
            counter: 0,
            last_percent: 0,
        }
    }

    /// Advance by one step
    pub fn one_step(&mut self) {
        self.counter += 1;
        if self.total == 0 {
            return;
        }
        let percent = (self.counter.saturating_mul(100) / self.total).min(100);
        if percent > self.last_percent {
            self.last_percent = percent;
            self.reporter.update(percent as f32);
        }
    }

    /// Steps taken so far
    pub fn count(&self) -> usize {
        self.counter
    }
}
