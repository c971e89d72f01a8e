use std::time::{Duration, Instant};

/// Best-effort progress reporter
///
/// Logs whole-percent completion steps at debug level; never blocks.
pub struct Progress {
    label: &'static str,
    total: u64,
    last_percent: u64,
    start: Instant,
}

impl Progress {
    pub fn new(label: &'static str, total: u64) -> Self {
        Self {
            label,
            total,
            last_percent: 0,
            start: Instant::now(),
        }
    }

    pub fn update(&mut self, done: u64) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }
        let percent = percent_of(done, self.total);
        if percent > self.last_percent {
            self.last_percent = percent;
            log::debug!("{}: {:3}% done", self.label, percent);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Log the elapsed time and return it
    pub fn finish(&self) -> Duration {
        let elapsed = self.elapsed();
        log::info!("{} finished in {:.3} s", self.label, elapsed.as_secs_f64());
        elapsed
    }
}

fn percent_of(done: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    done.min(total) * 100 / total
}
