//! Candidate pairs and the order they are searched in.

use std::fmt;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::roster::{Group, Person, Roster};

/// One Group A member matched with one Group B member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub a: Person,
    pub b: Person,
}

impl Pair {
    pub fn new(a: Person, b: Person) -> Self {
        Pair { a, b }
    }

    pub fn key(&self) -> PairKey {
        PairKey::new(&self.a.name, &self.b.name)
    }

    /// The participant belonging to `group`.
    pub fn member(&self, group: Group) -> &Person {
        if self.a.group == group { &self.a } else { &self.b }
    }

    pub fn contacts(&self) -> [&str; 2] {
        [self.a.contact.as_str(), self.b.contact.as_str()]
    }
}

/// Order-independent identifier of a pair: the two names, sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(String, String);

impl PairKey {
    pub fn new(x: &str, y: &str) -> Self {
        if x <= y {
            PairKey(x.to_string(), y.to_string())
        } else {
            PairKey(y.to_string(), x.to_string())
        }
    }

    pub fn names(&self) -> (&str, &str) {
        (&self.0, &self.1)
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ↔ {}", self.0, self.1)
    }
}

/// How candidate pairs are ordered before searching.
///
/// Earlier pairs get first pick of slots and quota, so the order changes the
/// outcome of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PairOrder {
    /// Fresh random order on every run.
    #[default]
    Shuffled,
    /// Reproducible random order.
    Seeded(u64),
    /// Group A order, then Group B order (roster order).
    Identity,
}

impl PairOrder {
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or(PairOrder::Shuffled, PairOrder::Seeded)
    }

    pub fn apply(self, pairs: &mut [Pair]) {
        match self {
            PairOrder::Shuffled => pairs.shuffle(&mut rand::rng()),
            PairOrder::Seeded(seed) => pairs.shuffle(&mut ChaCha8Rng::seed_from_u64(seed)),
            PairOrder::Identity => {}
        }
    }
}

/// Full cross product of Group A × Group B, in roster order.
pub fn candidate_pairs(roster: &Roster) -> Vec<Pair> {
    roster
        .group_a
        .iter()
        .flat_map(|a| roster.group_b.iter().map(move |b| Pair::new(a.clone(), b.clone())))
        .collect()
}
