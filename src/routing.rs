//! Assignee → worksheet routing for mirrored lead copies.

use serde::{Deserialize, Serialize};

/// One routing rule: leads assigned to `assignee` are mirrored into `worksheet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRule {
    /// Assignee name, matched as whole case-insensitive words
    pub assignee: String,
    /// Title of the destination worksheet
    pub worksheet: String,
}

impl MirrorRule {
    /// Create a rule
    pub fn new(assignee: impl Into<String>, worksheet: impl Into<String>) -> Self {
        Self {
            assignee: assignee.into(),
            worksheet: worksheet.into(),
        }
    }

    fn matches(&self, assigned_tokens: &[String]) -> bool {
        let wanted = tokens(&self.assignee);
        !wanted.is_empty() && assigned_tokens.windows(wanted.len()).any(|window| window == wanted.as_slice())
    }
}

/// Ordered rule list; the first matching rule decides, no match means no mirror
#[derive(Debug, Clone, Default)]
pub struct AssigneeRouter {
    rules: Vec<MirrorRule>,
}

impl AssigneeRouter {
    /// Build a router from rules in priority order
    #[must_use]
    pub const fn new(rules: Vec<MirrorRule>) -> Self {
        Self { rules }
    }

    /// Worksheet that should receive a copy of a lead assigned to `assigned_to`.
    ///
    /// "Dattu" matches "Dattu", "dattu k" and "Sales - Dattu", but not "Dattus".
    #[must_use]
    pub fn route(&self, assigned_to: &str) -> Option<&str> {
        let assigned = tokens(assigned_to);
        self.rules
            .iter()
            .find(|rule| rule.matches(&assigned))
            .map(|rule| rule.worksheet.as_str())
    }

    /// Configured rules
    #[must_use]
    pub fn rules(&self) -> &[MirrorRule] {
        &self.rules
    }
}

fn tokens(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}
