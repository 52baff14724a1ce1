use std::fmt;

/// Pipeline stage a soft failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scrape,
    Enrich,
    Persist,
    Notify,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scrape => "scrape",
            Stage::Enrich => "enrich",
            Stage::Persist => "persist",
            Stage::Notify => "notify",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error isolated to one unit of work (one source, one batch, one
/// delivery) that did not abort the run.
#[derive(Debug, Clone)]
pub struct SoftFailure {
    pub stage: Stage,
    pub unit: String,
    pub message: String,
}

/// Aggregated outcome of a single run. Created empty at orchestration start,
/// appended to as stages complete, logged at the end. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub fetched: usize,
    pub digested: usize,
    pub persisted_attempted: usize,
    pub persisted_new: usize,
    pub notified: bool,
    pub soft_failures: Vec<SoftFailure>,
    /// Escalated storage failure, if any. A run with this set exits non-zero
    /// even though notification was still attempted.
    pub persistence_error: Option<String>,
}

impl RunReport {
    pub fn record_soft(&mut self, stage: Stage, unit: impl Into<String>, message: impl ToString) {
        self.soft_failures.push(SoftFailure {
            stage,
            unit: unit.into(),
            message: message.to_string(),
        });
    }

    pub fn succeeded(&self) -> bool {
        self.persistence_error.is_none()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run complete: fetched={} digested={} persisted={}/{} notified={} soft_failures={}",
            self.fetched,
            self.digested,
            self.persisted_new,
            self.persisted_attempted,
            self.notified,
            self.soft_failures.len()
        )
    }
}
