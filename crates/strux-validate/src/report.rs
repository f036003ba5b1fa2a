//! # Violations and Reports
//!
//! A [`Violation`] is one failed constraint on one field. The engine
//! collects the violations of each record it visits into a
//! [`ViolationGroup`], and the groups of a whole tree into a
//! [`ValidationReport`].
//!
//! ## Text Rendering
//!
//! The flattened rendering of a report is the concatenation of its groups:
//!
//! ```text
//! Invalid properties in Order
//! reference : This value should not be blank. but got ''
//! Invalid properties in Address
//! postcode : This value is not valid. but got 'ABC'
//! ```
//!
//! Every line, the header included, is newline-terminated. Group locations
//! are structural metadata only and never appear in the text.

use std::fmt;

use strux_core::Value;

/// A single failed constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Path of the violating field relative to the record that owns it,
    /// e.g. `email` or `lines[2]`. Empty for record-level violations.
    pub property_path: String,
    /// Human-readable description of the violation.
    pub message: String,
    /// The value that failed the constraint.
    pub invalid_value: Value,
}

impl Violation {
    pub fn new(
        property_path: impl Into<String>,
        message: impl Into<String>,
        invalid_value: Value,
    ) -> Self {
        Self {
            property_path: property_path.into(),
            message: message.into(),
            invalid_value,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.property_path.is_empty() {
            "(root)"
        } else {
            self.property_path.as_str()
        };
        write!(f, "{path} : {} but got {}", self.message, self.invalid_value)
    }
}

/// The local violations of one record in the validated tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ViolationGroup {
    /// Type name of the record that produced the violations.
    pub type_name: &'static str,
    /// Where the record sits relative to the validation root: empty for the
    /// root itself, otherwise e.g. `address` or `lines[1].product`.
    pub location: String,
    /// Violations in field declaration order.
    pub violations: Vec<Violation>,
}

impl fmt::Display for ViolationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Invalid properties in {}", self.type_name)?;
        for violation in &self.violations {
            writeln!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Aggregated result of validating a record and everything it owns.
///
/// Groups appear in visiting order: a record's own group precedes the
/// groups of its nested records, nested records follow field declaration
/// order, and list elements follow sequence order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    groups: Vec<ViolationGroup>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, group: ViolationGroup) {
        self.groups.push(group);
    }

    /// Returns true if no record in the tree produced a violation.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of violation groups (records with at least one violation).
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[ViolationGroup] {
        &self.groups
    }

    /// Total number of violations across all groups.
    pub fn violation_count(&self) -> usize {
        self.groups.iter().map(|g| g.violations.len()).sum()
    }

    /// Iterate every violation with the location of the record it belongs to.
    pub fn violations(&self) -> impl Iterator<Item = (&str, &Violation)> {
        self.groups
            .iter()
            .flat_map(|g| g.violations.iter().map(move |v| (g.location.as_str(), v)))
    }

    pub fn into_inner(self) -> Vec<ViolationGroup> {
        self.groups
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for group in &self.groups {
            write!(f, "{group}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display_format() {
        let v = Violation::new("email", "This value is not a valid email address.", Value::from("x"));
        assert_eq!(
            v.to_string(),
            "email : This value is not a valid email address. but got 'x'"
        );
    }

    #[test]
    fn test_violation_display_root() {
        let v = Violation::new("", "\"kind\" is a required property", Value::Null);
        assert!(v.to_string().starts_with("(root) : "));
    }

    #[test]
    fn test_group_display_has_header_and_lines() {
        let group = ViolationGroup {
            type_name: "User",
            location: String::new(),
            violations: vec![
                Violation::new("name", "This value should not be blank.", Value::from("")),
                Violation::new("age", "This value should be 0 or more.", Value::from(-1)),
            ],
        };
        assert_eq!(
            group.to_string(),
            "Invalid properties in User\n\
             name : This value should not be blank. but got ''\n\
             age : This value should be 0 or more. but got -1\n"
        );
    }

    #[test]
    fn test_report_counts() {
        let mut report = ValidationReport::new();
        assert!(report.is_empty());
        report.push(ViolationGroup {
            type_name: "A",
            location: String::new(),
            violations: vec![Violation::new("x", "bad", Value::Null)],
        });
        report.push(ViolationGroup {
            type_name: "B",
            location: "b".to_string(),
            violations: vec![
                Violation::new("y", "bad", Value::Null),
                Violation::new("z", "bad", Value::Null),
            ],
        });
        assert_eq!(report.len(), 2);
        assert_eq!(report.violation_count(), 3);
        let locations: Vec<&str> = report.violations().map(|(loc, _)| loc).collect();
        assert_eq!(locations, vec!["", "b", "b"]);
    }
}
