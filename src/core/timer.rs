use std::time::{Duration, Instant};
use parking_lot::Mutex;

/// Latency attribution for one query. Purely instrumentation: nothing reads
/// a timer to decide a result.
#[derive(Debug)]
pub struct Timer {
    pub name: String,
    pub start: Instant,
    records: Mutex<Vec<TimerRecord>>,
}

#[derive(Debug, Clone)]
pub struct TimerRecord {
    pub name: String,
    pub elapsed: Duration,
}

impl Timer {
    pub fn new(name: impl Into<String>) -> Self {
        Timer {
            name: name.into(),
            start: Instant::now(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Opens a named scope; its duration is recorded when the scope drops.
    pub fn scope(&self, name: &str) -> TimerScope<'_> {
        TimerScope {
            timer: self,
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn records(&self) -> Vec<TimerRecord> {
        self.records.lock().clone()
    }

    /// Total recorded time per scope name, in first-seen order.
    pub fn totals(&self) -> Vec<(String, Duration)> {
        let mut totals: Vec<(String, Duration)> = Vec::new();
        for record in self.records.lock().iter() {
            match totals.iter_mut().find(|(name, _)| *name == record.name) {
                Some((_, total)) => *total += record.elapsed,
                None => totals.push((record.name.clone(), record.elapsed)),
            }
        }
        totals
    }
}

pub struct TimerScope<'a> {
    timer: &'a Timer,
    name: String,
    start: Instant,
}

impl Drop for TimerScope<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        tracing::trace!(timer = %self.timer.name, scope = %self.name, ?elapsed, "timer scope");
        self.timer.records.lock().push(TimerRecord {
            name: std::mem::take(&mut self.name),
            elapsed,
        });
    }
}

/// Opens a scope only when a timer was threaded through.
pub fn scope<'a>(timer: Option<&'a Timer>, name: &str) -> Option<TimerScope<'a>> {
    timer.map(|t| t.scope(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_are_recorded_on_drop() {
        let timer = Timer::new("query");
        {
            let _a = timer.scope("document");
            let _b = timer.scope("join");
        }
        {
            let _a = timer.scope("document");
        }

        let records = timer.records();
        assert_eq!(records.len(), 3);

        let totals = timer.totals();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].0, "join");
        assert_eq!(totals[1].0, "document");
    }

    #[test]
    fn test_optional_scope() {
        assert!(scope(None, "x").is_none());
        let timer = Timer::new("t");
        drop(scope(Some(&timer), "x"));
        assert_eq!(timer.records().len(), 1);
    }
}
