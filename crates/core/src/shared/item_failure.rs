use std::fmt;

/// Pipeline stage in which a per-item failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Converting,
    Detecting,
    Extracting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Converting => write!(f, "converting"),
            Stage::Detecting => write!(f, "detecting"),
            Stage::Extracting => write!(f, "extracting"),
        }
    }
}

/// A single photo or face group that could not be processed.
///
/// Recorded and logged, never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub stage: Stage,
    /// The photo path, or the group id for extraction failures.
    pub item: String,
    pub reason: String,
}

impl ItemFailure {
    pub fn new(stage: Stage, item: impl fmt::Display, error: &dyn std::error::Error) -> Self {
        Self {
            stage,
            item: item.to_string(),
            reason: error_chain(error),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for {}: {}", self.stage, self.item, self.reason)
    }
}

/// Renders an error with all of its sources, outermost first.
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut out = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
