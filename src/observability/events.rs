//! Observable guard events

use std::fmt;

use super::logger::Severity;

/// Events emitted while guarding queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Query skipped the explain round trip
    GuardShortCircuit,
    /// Winning plan accepted
    GuardPass,
    /// Winning plan rejected
    GuardReject,
    /// Explain round trip failed
    GuardExecutionFailed,
    /// Explain sibling model registered
    ExplainCapabilityBuilt,
    /// Configuration loaded
    ConfigLoaded,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::GuardShortCircuit => "GUARD_SHORT_CIRCUIT",
            Event::GuardPass => "GUARD_PASS",
            Event::GuardReject => "GUARD_REJECT",
            Event::GuardExecutionFailed => "GUARD_EXECUTION_FAILED",
            Event::ExplainCapabilityBuilt => "EXPLAIN_CAPABILITY_BUILT",
            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::GuardShortCircuit | Event::GuardPass => Severity::Trace,
            Event::GuardReject => Severity::Warn,
            Event::GuardExecutionFailed => Severity::Error,
            Event::ExplainCapabilityBuilt | Event::ConfigLoaded => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::GuardReject.as_str(), "GUARD_REJECT");
        assert_eq!(Event::ExplainCapabilityBuilt.to_string(), "EXPLAIN_CAPABILITY_BUILT");
    }

    #[test]
    fn test_failures_log_above_info() {
        assert!(Event::GuardReject.severity() > Severity::Info);
        assert!(Event::GuardExecutionFailed.severity() > Event::GuardReject.severity());
    }
}
