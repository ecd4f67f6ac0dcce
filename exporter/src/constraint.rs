//! Per-classifier platform constraints.
//!
//! A constraint annotates the manifest entries of one classifier with the
//! operating systems and architectures the artifact applies to. An absent
//! list and an empty list are different things: the former omits the key
//! from the manifest, the latter emits `[]`.

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Platform applicability declared for a classifier.
///
/// # Examples
///
/// ```
/// use depexport::constraint::Constraint;
///
/// let constraint = Constraint::new("natives-linux").with_systems(["linux"]);
/// assert_eq!(constraint.systems(), Some(&["linux".to_owned()][..]));
/// assert_eq!(constraint.archs(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    classifier: String,
    systems: Option<Vec<String>>,
    archs: Option<Vec<String>>,
}

impl Constraint {
    /// Create a constraint with neither list declared.
    #[must_use]
    pub fn new(classifier: impl Into<String>) -> Self {
        Self {
            classifier: classifier.into(),
            systems: None,
            archs: None,
        }
    }

    /// Declare the operating system tags, in output order.
    #[must_use]
    pub fn with_systems<I, S>(mut self, systems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.systems = Some(systems.into_iter().map(Into::into).collect());
        self
    }

    /// Declare the architecture tags, in output order.
    #[must_use]
    pub fn with_archs<I, S>(mut self, archs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.archs = Some(archs.into_iter().map(Into::into).collect());
        self
    }

    /// Return the classifier this constraint applies to.
    #[must_use]
    pub fn classifier(&self) -> &str {
        &self.classifier
    }

    /// Return the declared systems, or `None` when undeclared.
    #[must_use]
    pub fn systems(&self) -> Option<&[String]> {
        self.systems.as_deref()
    }

    /// Return the declared architectures, or `None` when undeclared.
    #[must_use]
    pub fn archs(&self) -> Option<&[String]> {
        self.archs.as_deref()
    }
}

/// The lists of a constraint as written in configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConstraintFields {
    #[serde(default)]
    systems: Option<Vec<String>>,
    #[serde(default)]
    archs: Option<Vec<String>>,
}

/// Constraints keyed by classifier.
///
/// Deserializes from a table of classifier names:
///
/// ```toml
/// [natives-linux]
/// systems = ["linux"]
/// archs = ["x64", "arm64"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintTable {
    entries: BTreeMap<String, Constraint>,
}

impl ConstraintTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a constraint, replacing any previous one for its classifier.
    pub fn insert(&mut self, constraint: Constraint) {
        self.entries
            .insert(constraint.classifier.clone(), constraint);
    }

    /// Declare a constraint with both lists present.
    pub fn declare<S, A>(&mut self, classifier: &str, systems: S, archs: A)
    where
        S: IntoIterator,
        S::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        self.insert(
            Constraint::new(classifier)
                .with_systems(systems)
                .with_archs(archs),
        );
    }

    /// Find the constraint for an artifact classifier.
    ///
    /// Unclassified artifacts never match a constraint.
    #[must_use]
    pub fn find(&self, classifier: Option<&str>) -> Option<&Constraint> {
        classifier.and_then(|name| self.entries.get(name))
    }

    /// Return the number of declared constraints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return true when no constraints are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over constraints in classifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Constraint> {
        self.entries.values()
    }
}

impl<'de> Deserialize<'de> for ConstraintTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = BTreeMap::<String, ConstraintFields>::deserialize(deserializer)?;
        let entries = fields
            .into_iter()
            .map(|(classifier, lists)| {
                let constraint = Constraint {
                    classifier: classifier.clone(),
                    systems: lists.systems,
                    archs: lists.archs,
                };
                (classifier, constraint)
            })
            .collect();
        Ok(Self { entries })
    }
}

impl FromIterator<Constraint> for ConstraintTable {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        let mut table = Self::new();
        for constraint in iter {
            table.insert(constraint);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_matches_exact_classifier_only() {
        let mut table = ConstraintTable::new();
        table.declare("linux-x64", ["linux"], ["x64"]);

        assert!(table.find(Some("linux-x64")).is_some());
        assert!(table.find(Some("linux-X64")).is_none());
        assert!(table.find(Some("linux")).is_none());
        assert!(table.find(None).is_none());
    }

    #[test]
    fn insert_replaces_existing_classifier() {
        let mut table = ConstraintTable::new();
        table.insert(Constraint::new("natives").with_systems(["linux"]));
        table.insert(Constraint::new("natives").with_archs(["arm64"]));

        assert_eq!(table.len(), 1);
        let constraint = table.find(Some("natives")).expect("constraint");
        assert_eq!(constraint.systems(), None);
        assert_eq!(constraint.archs(), Some(&["arm64".to_owned()][..]));
    }

    #[test]
    fn deserializes_absent_empty_and_ordered_lists() {
        let toml = r#"
            [natives-linux]
            systems = ["linux"]
            archs = ["x64", "arm64"]

            [natives-any]
            systems = []

            [natives-macos]
        "#;
        let table: ConstraintTable = toml::from_str(toml).expect("valid constraints");

        let linux = table.find(Some("natives-linux")).expect("linux");
        assert_eq!(linux.classifier(), "natives-linux");
        assert_eq!(
            linux.archs(),
            Some(&["x64".to_owned(), "arm64".to_owned()][..])
        );

        let any = table.find(Some("natives-any")).expect("any");
        assert_eq!(any.systems(), Some(&[][..]));
        assert_eq!(any.archs(), None);

        let macos = table.find(Some("natives-macos")).expect("macos");
        assert_eq!(macos.systems(), None);
        assert_eq!(macos.archs(), None);
    }

    #[test]
    fn rejects_unknown_constraint_keys() {
        let toml = r#"
            [natives-linux]
            platforms = ["linux"]
        "#;
        assert!(toml::from_str::<ConstraintTable>(toml).is_err());
    }

    #[test]
    fn collects_from_iterator_in_classifier_order() {
        let table: ConstraintTable = [Constraint::new("b"), Constraint::new("a")]
            .into_iter()
            .collect();
        let classifiers: Vec<&str> = table.iter().map(Constraint::classifier).collect();
        assert_eq!(classifiers, ["a", "b"]);
    }
}
