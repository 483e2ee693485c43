//! Human-readable plan report
//!
//! Renders a winning plan and its verdict deterministically.

use std::fmt;

use super::classifier::classify;
use super::node::PlanNode;

/// Plan report output
#[derive(Debug, Clone)]
pub struct PlanReport {
    /// Whether classification accepted the plan
    pub accepted: bool,
    /// One line per node, indented by depth
    pub stages: Vec<String>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl PlanReport {
    /// Classifies the plan and builds its report
    pub fn from_plan(plan: &PlanNode) -> Self {
        let stages = plan
            .walk()
            .into_iter()
            .map(|(depth, node)| {
                let mut line = format!("{}{}", "  ".repeat(depth), node.stage());
                if let Some(index) = node.details().get("indexName").and_then(|v| v.as_str()) {
                    line.push_str(&format!(" index={}", index));
                }
                if let Some(filter) = node.filter() {
                    line.push_str(&format!(" filter={}", filter));
                }
                if let Some(pattern) = node.sort_pattern() {
                    line.push_str(&format!(" sortPattern={}", pattern));
                }
                line
            })
            .collect();

        match classify(plan) {
            Ok(()) => Self {
                accepted: true,
                stages,
                rejection_reason: None,
                rejection_code: None,
            },
            Err(err) => Self {
                accepted: false,
                stages,
                rejection_reason: Some(err.to_string()),
                rejection_code: Some(err.code().to_string()),
            },
        }
    }
}

impl fmt::Display for PlanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== WINNING PLAN ===")?;
        for stage in &self.stages {
            writeln!(f, "{}", stage)?;
        }

        if self.accepted {
            writeln!(f, "Status: ACCEPTED")?;
        } else {
            writeln!(f, "Status: REJECTED")?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "Error Code: {}", code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "Reason: {}", reason)?;
            }
        }

        Ok(())
    }
}
