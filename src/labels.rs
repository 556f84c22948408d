//! Static label taxonomy.
//!
//! Every label the bot reasons about belongs to exactly one of four groups:
//!
//! | Group | Meaning |
//! |-------|---------|
//! | status | Workflow stage (`classify`, `triage`, `needs spec`, ...) |
//! | classification | Kind of issue (`Epic`, `meta`, `release plan`) |
//! | team | Owned by a team outside the triage rotation (`data science`, ...) |
//! | skip | Pull-request exemptions (`skip news`) |
//!
//! `classify` is a status label with a special meaning: it marks an issue as
//! awaiting human triage. Any *other* status label means triage already
//! happened.

use std::fmt;

/// Workflow-stage labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Needs a human to assign a real status.
    Classify,
    Triage,
    Investigating,
    NeedsUpstreamFix,
    NeedsDecision,
    NeedsSpike,
    NeedsSpec,
    NeedsPr,
    Experimenting,
}

impl Status {
    /// All status labels.
    pub const ALL: [Status; 9] = [
        Status::Classify,
        Status::Triage,
        Status::Investigating,
        Status::NeedsUpstreamFix,
        Status::NeedsDecision,
        Status::NeedsSpike,
        Status::NeedsSpec,
        Status::NeedsPr,
        Status::Experimenting,
    ];

    /// Returns the label name as it appears on GitHub.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Status::Classify => "classify",
            Status::Triage => "triage",
            Status::Investigating => "investigating",
            Status::NeedsUpstreamFix => "needs upstream fix",
            Status::NeedsDecision => "needs decision",
            Status::NeedsSpike => "needs spike",
            Status::NeedsSpec => "needs spec",
            Status::NeedsPr => "needs PR",
            Status::Experimenting => "experimenting",
        }
    }
}

/// Issue-kind labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Epic,
    Meta,
    ReleasePlan,
}

impl Classification {
    pub const ALL: [Classification; 3] = [
        Classification::Epic,
        Classification::Meta,
        Classification::ReleasePlan,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Classification::Epic => "Epic",
            Classification::Meta => "meta",
            Classification::ReleasePlan => "release plan",
        }
    }
}

/// Team ownership labels. Issues carrying one skip auto-classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    DataScience,
    XTeam,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::DataScience, Team::XTeam];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Team::DataScience => "data science",
            Team::XTeam => "xteam",
        }
    }
}

/// Pull-request exemption labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Skip {
    /// Exempts a PR from needing a `news/` changelog entry.
    News,
}

impl Skip {
    pub const ALL: [Skip; 1] = [Skip::News];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Skip::News => "skip news",
        }
    }
}

/// The semantic group a known label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelGroup {
    Status,
    Classification,
    Team,
    Skip,
}

impl fmt::Display for LabelGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LabelGroup::Status => "status",
            LabelGroup::Classification => "classification",
            LabelGroup::Team => "team",
            LabelGroup::Skip => "skip",
        };
        f.write_str(name)
    }
}

/// Looks up which group a label name belongs to.
///
/// Returns `None` for labels outside the taxonomy (e.g. `bug`). Matching is
/// exact and case-sensitive, as GitHub label names are.
pub fn group_of(name: &str) -> Option<LabelGroup> {
    if Status::ALL.iter().any(|l| l.as_str() == name) {
        Some(LabelGroup::Status)
    } else if Classification::ALL.iter().any(|l| l.as_str() == name) {
        Some(LabelGroup::Classification)
    } else if Team::ALL.iter().any(|l| l.as_str() == name) {
        Some(LabelGroup::Team)
    } else if Skip::ALL.iter().any(|l| l.as_str() == name) {
        Some(LabelGroup::Skip)
    } else {
        None
    }
}

/// Returns true if `name` is a workflow-stage label (including `classify`).
pub fn is_status_label(name: &str) -> bool {
    group_of(name) == Some(LabelGroup::Status)
}

/// Returns true if `name` marks ownership by a team.
pub fn is_team_label(name: &str) -> bool {
    group_of(name) == Some(LabelGroup::Team)
}

/// Returns true if a label's presence means the issue needs no `classify`.
///
/// Status, classification, and team labels all count: each implies a human
/// has already looked at the issue.
pub fn implies_triaged(name: &str) -> bool {
    matches!(
        group_of(name),
        Some(LabelGroup::Status | LabelGroup::Classification | LabelGroup::Team)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn all_names() -> Vec<&'static str> {
        Status::ALL
            .iter()
            .map(Status::as_str)
            .chain(Classification::ALL.iter().map(Classification::as_str))
            .chain(Team::ALL.iter().map(Team::as_str))
            .chain(Skip::ALL.iter().map(Skip::as_str))
            .collect()
    }

    #[test]
    fn groups_are_disjoint() {
        let names = all_names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), unique.len());
    }

    #[test]
    fn classify_is_a_status_label() {
        assert!(is_status_label(Status::Classify.as_str()));
        assert!(implies_triaged(Status::Classify.as_str()));
    }

    #[test]
    fn group_lookup() {
        assert_eq!(group_of("needs spec"), Some(LabelGroup::Status));
        assert_eq!(group_of("Epic"), Some(LabelGroup::Classification));
        assert_eq!(group_of("data science"), Some(LabelGroup::Team));
        assert_eq!(group_of("skip news"), Some(LabelGroup::Skip));
        assert_eq!(group_of("bug"), None);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(group_of("epic"), None);
        assert_eq!(group_of("Triage"), None);
    }

    #[test]
    fn skip_labels_do_not_imply_triage() {
        assert!(!implies_triaged("skip news"));
        assert!(!implies_triaged("bug"));
        assert!(implies_triaged("meta"));
        assert!(implies_triaged("xteam"));
    }

    proptest! {
        #[test]
        fn prop_every_known_label_has_one_group(idx in 0usize..15) {
            let names = all_names();
            let name = names[idx % names.len()];
            prop_assert!(group_of(name).is_some());
        }

        #[test]
        fn prop_unknown_labels_have_no_group(name in "[A-Z0-9_]{1,12}") {
            // Known labels all contain a lowercase letter.
            prop_assert_eq!(group_of(&name), None);
        }
    }
}
