//! Roster rows and the two-group partition.
//!
//! A roster row is `name, group label, contact identifier, timezone label`
//! (extra trailing columns are ignored). Rows are split into Group A and
//! Group B by their group label; anything else is dropped.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which side of the pairing a person belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Group {
    A,
    B,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Group::A => write!(f, "A"),
            Group::B => write!(f, "B"),
        }
    }
}

/// A roster entry. Identity for matching purposes is `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub group: Group,
    /// Calendar identity (an email address for Google).
    pub contact: String,
    /// Free-form location label, e.g. "Paris" or "Boston".
    pub timezone: String,
}

/// Labels used in the roster's group column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLabels {
    pub a: String,
    pub b: String,
}

impl Default for GroupLabels {
    fn default() -> Self {
        GroupLabels {
            a: "group1".to_string(),
            b: "group2".to_string(),
        }
    }
}

impl GroupLabels {
    fn group_for(&self, label: &str) -> Option<Group> {
        let label = label.trim();
        if label == self.a {
            Some(Group::A)
        } else if label == self.b {
            Some(Group::B)
        } else {
            None
        }
    }
}

/// The roster after partitioning, input order preserved within each group.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub group_a: Vec<Person>,
    pub group_b: Vec<Person>,
}

impl Roster {
    /// Split raw rows into the two groups.
    ///
    /// Rows with fewer than four fields or an unknown group label are skipped.
    pub fn partition(rows: &[Vec<String>], labels: &GroupLabels) -> Self {
        let mut roster = Roster::default();

        for row in rows {
            let [name, label, contact, timezone, ..] = row.as_slice() else {
                debug!(?row, "skipping short roster row");
                continue;
            };

            let Some(group) = labels.group_for(label) else {
                debug!(name = %name, label = %label, "skipping row with unknown group");
                continue;
            };

            let person = Person {
                name: name.trim().to_string(),
                group,
                contact: contact.trim().to_string(),
                timezone: timezone.trim().to_string(),
            };

            match group {
                Group::A => roster.group_a.push(person),
                Group::B => roster.group_b.push(person),
            }
        }

        roster
    }

    /// Number of meetings if every A × B pair got one.
    pub fn expected_meetings(&self) -> usize {
        self.group_a.len() * self.group_b.len()
    }

    pub fn has_both_groups(&self) -> bool {
        !self.group_a.is_empty() && !self.group_b.is_empty()
    }
}
