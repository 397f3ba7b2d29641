//! Project layout rules
//!
//! A layout rule recognizes an anchor directory by its trailing path
//! components and decides which of its subdirectories are skipped.
//! Supporting another project layout means adding a variant here.

use std::ffi::OsStr;
use std::path::{Component, Path};

use serde::Serialize;

/// Recognized sub-project layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutRule {
    /// Orchestration pipeline sources (`airflow/src`)
    Orchestration,
    /// Data-transform project (`dbt`); its `logs` output is never shipped
    Transform,
}

impl LayoutRule {
    /// Every rule, in match priority order
    pub const ALL: [LayoutRule; 2] = [LayoutRule::Orchestration, LayoutRule::Transform];

    /// Trailing path components that identify the anchor directory
    pub const fn anchor(self) -> &'static [&'static str] {
        match self {
            LayoutRule::Orchestration => &["airflow", "src"],
            LayoutRule::Transform => &["dbt"],
        }
    }

    /// Subdirectory names removed from the anchor before listing
    pub const fn excluded_dirs(self) -> &'static [&'static str] {
        match self {
            LayoutRule::Orchestration => &[],
            LayoutRule::Transform => &["logs"],
        }
    }

    /// Whether `dir` ends with this rule's anchor components
    pub fn matches(self, dir: &Path) -> bool {
        let mut components = dir
            .components()
            .rev()
            .filter(|c| !matches!(c, Component::CurDir));

        self.anchor().iter().rev().all(|expected| {
            matches!(components.next(), Some(Component::Normal(name)) if name == OsStr::new(expected))
        })
    }

    /// Whether a subdirectory called `name` is skipped under this anchor
    pub fn excludes(self, name: &OsStr) -> bool {
        self.excluded_dirs().iter().any(|d| OsStr::new(d) == name)
    }

    /// First rule whose anchor matches `dir`
    pub fn matching(dir: &Path) -> Option<LayoutRule> {
        Self::ALL.into_iter().find(|rule| rule.matches(dir))
    }

    /// Whether `dir` is an excluded subdirectory of some anchor
    pub fn is_excluded(dir: &Path) -> bool {
        match (dir.parent(), dir.file_name()) {
            (Some(parent), Some(name)) => {
                Self::matching(parent).is_some_and(|rule| rule.excludes(name))
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for LayoutRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.anchor().join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestration_anchor() {
        assert!(LayoutRule::Orchestration.matches(Path::new("proj/airflow/src")));
        assert!(LayoutRule::Orchestration.matches(Path::new("/abs/proj/airflow/src/")));
        assert!(LayoutRule::Orchestration.matches(Path::new("airflow/src")));
        assert!(!LayoutRule::Orchestration.matches(Path::new("proj/src")));
        assert!(!LayoutRule::Orchestration.matches(Path::new("proj/airflow")));
        assert!(!LayoutRule::Orchestration.matches(Path::new("proj/airflow/src/dags")));
    }

    #[test]
    fn test_transform_anchor() {
        assert!(LayoutRule::Transform.matches(Path::new("proj/dbt")));
        assert!(LayoutRule::Transform.matches(Path::new("./dbt")));
        assert!(!LayoutRule::Transform.matches(Path::new("proj/mydbt")));
        assert!(!LayoutRule::Transform.matches(Path::new("proj/dbt/models")));
    }

    #[test]
    fn test_matching() {
        assert_eq!(
            LayoutRule::matching(Path::new("a/airflow/src")),
            Some(LayoutRule::Orchestration)
        );
        assert_eq!(
            LayoutRule::matching(Path::new("a/dbt")),
            Some(LayoutRule::Transform)
        );
        assert_eq!(LayoutRule::matching(Path::new("a/docs")), None);
        assert_eq!(LayoutRule::matching(Path::new("")), None);
    }

    #[test]
    fn test_excludes_logs_only_under_transform() {
        assert!(LayoutRule::Transform.excludes(OsStr::new("logs")));
        assert!(!LayoutRule::Transform.excludes(OsStr::new("models")));
        assert!(!LayoutRule::Orchestration.excludes(OsStr::new("logs")));

        assert!(LayoutRule::is_excluded(Path::new("proj/dbt/logs")));
        assert!(!LayoutRule::is_excluded(Path::new("proj/airflow/src/logs")));
        assert!(!LayoutRule::is_excluded(Path::new("proj/dbt/models/logs")));
        assert!(!LayoutRule::is_excluded(Path::new("logs")));
    }

    #[test]
    fn test_display() {
        assert_eq!(LayoutRule::Orchestration.to_string(), "airflow/src");
        assert_eq!(LayoutRule::Transform.to_string(), "dbt");
    }
}
