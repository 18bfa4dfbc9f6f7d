//! Timing utilities

use std::time::{Duration, Instant};
use tracing::info;

/// Format a duration as `H:MM:SS` with microseconds when non-zero,
/// e.g. `0:00:01.500000`
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let micros = duration.subsec_micros();

    if micros == 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{}:{:02}:{:02}.{:06}", hours, minutes, seconds, micros)
    }
}

/// Timer for measuring execution time
#[derive(Debug)]
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Create and start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Get elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop and log `"{name} - {elapsed}"`
    pub fn stop(self) -> Duration {
        let elapsed = self.start.elapsed();
        info!(elapsed_secs = elapsed.as_secs_f64(), "{} - {}", self.name, format_duration(elapsed));
        elapsed
    }
}

/// Run `f`, log how long it took under `name`, and return its result
pub fn time_callable<T, F>(name: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let timer = Timer::start(name);
    let result = f();
    timer.stop();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "0:00:00");
        assert_eq!(format_duration(Duration::from_millis(1500)), "0:00:01.500000");
        assert_eq!(format_duration(Duration::from_secs(3 * 3600 + 62)), "3:01:02");
        assert_eq!(format_duration(Duration::from_secs(30 * 3600)), "30:00:00");
    }

    #[test]
    fn test_time_callable_returns_result() {
        let value = time_callable("add", || 2 + 2);
        assert_eq!(value, 4);
    }

    #[test]
    fn test_timer_elapsed() {
        let timer = Timer::start("sleep");
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.stop() >= Duration::from_millis(5));
    }
}
