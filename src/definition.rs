//! Raw device definitions as they arrive from callers.
//!
//! Nothing in this module is trusted: a `Definition` may reference undeclared states, miss
//! transitions or repeat keys. It only becomes executable after passing through
//! [`crate::validator`].

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;

use crate::types::{AutomatonError, Direction, Kind};

/// An order-preserving list of key/value pairs read from a JSON object.
///
/// Unlike a map, duplicated keys are kept so that validation can report them instead of
/// silently keeping the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entries<K, V>(Vec<(K, V)>);

impl<K, V> Entries<K, V> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, key: K, value: V) {
        self.0.push((key, value));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.0.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: PartialEq, V> Entries<K, V> {
    /// Returns the first value stored under `key`.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

impl<K, V> Default for Entries<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Entries<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<K: Serialize, V: Serialize> Serialize for Entries<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct EntriesVisitor<K, V>(PhantomData<(K, V)>);

impl<'de, K: Deserialize<'de>, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<K, V> {
    type Value = Entries<K, V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of transitions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, value)) = access.next_entry()? {
            entries.push((key, value));
        }
        Ok(Entries(entries))
    }
}

impl<'de, K: Deserialize<'de>, V: Deserialize<'de>> Deserialize<'de> for Entries<K, V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

/// `state -> input symbol -> next state`
pub type DfaTable = Entries<String, Entries<char, String>>;
/// `state -> input symbol -> stack top -> (next state, pushed symbols)`
pub type DpdaTable = Entries<String, Entries<char, Entries<char, (String, String)>>>;
/// `state -> read symbol -> (next state, written symbol, head move)`
pub type DtmTable = Entries<String, Entries<char, (String, char, Direction)>>;

/// A deterministic finite automaton as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DfaDefinition {
    pub states: BTreeSet<String>,
    pub input_symbols: BTreeSet<char>,
    pub transitions: DfaTable,
    pub initial_state: String,
    pub final_states: BTreeSet<String>,
}

/// A deterministic pushdown automaton as supplied by a caller.
///
/// Each push string is pushed left to right, so its last character becomes the new top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DpdaDefinition {
    pub states: BTreeSet<String>,
    pub input_symbols: BTreeSet<char>,
    pub stack_symbols: BTreeSet<char>,
    pub transitions: DpdaTable,
    pub initial_state: String,
    pub initial_stack_symbol: char,
    pub final_states: BTreeSet<String>,
}

/// A deterministic tape machine as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DtmDefinition {
    pub states: BTreeSet<String>,
    pub input_symbols: BTreeSet<char>,
    pub tape_symbols: BTreeSet<char>,
    pub transitions: DtmTable,
    pub initial_state: String,
    pub final_states: BTreeSet<String>,
    pub blank_symbol: char,
}

/// A definition of any kind. As a standalone document it is tagged with `"kind"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Definition {
    Dfa(DfaDefinition),
    Dpda(DpdaDefinition),
    Dtm(DtmDefinition),
}

impl Definition {
    /// Parses a kind-specific definition body, where the kind is known out of band.
    pub fn from_json(kind: Kind, text: &str) -> Result<Self, AutomatonError> {
        Ok(match kind {
            Kind::Dfa => Definition::Dfa(serde_json::from_str(text)?),
            Kind::Dpda => Definition::Dpda(serde_json::from_str(text)?),
            Kind::Dtm => Definition::Dtm(serde_json::from_str(text)?),
        })
    }

    /// Parses a self-describing document carrying a `"kind"` field.
    pub fn from_document(text: &str) -> Result<Self, AutomatonError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn kind(&self) -> Kind {
        match self {
            Definition::Dfa(_) => Kind::Dfa,
            Definition::Dpda(_) => Kind::Dpda,
            Definition::Dtm(_) => Kind::Dtm,
        }
    }

    pub fn states(&self) -> &BTreeSet<String> {
        match self {
            Definition::Dfa(d) => &d.states,
            Definition::Dpda(d) => &d.states,
            Definition::Dtm(d) => &d.states,
        }
    }

    pub fn input_symbols(&self) -> &BTreeSet<char> {
        match self {
            Definition::Dfa(d) => &d.input_symbols,
            Definition::Dpda(d) => &d.input_symbols,
            Definition::Dtm(d) => &d.input_symbols,
        }
    }

    pub fn initial_state(&self) -> &str {
        match self {
            Definition::Dfa(d) => &d.initial_state,
            Definition::Dpda(d) => &d.initial_state,
            Definition::Dtm(d) => &d.initial_state,
        }
    }

    pub fn final_states(&self) -> &BTreeSet<String> {
        match self {
            Definition::Dfa(d) => &d.final_states,
            Definition::Dpda(d) => &d.final_states,
            Definition::Dtm(d) => &d.final_states,
        }
    }

    /// Total number of leaf transition entries, counting duplicates.
    pub fn transition_count(&self) -> usize {
        match self {
            Definition::Dfa(d) => d.transitions.iter().map(|(_, row)| row.len()).sum(),
            Definition::Dpda(d) => d
                .transitions
                .iter()
                .flat_map(|(_, row)| row.iter())
                .map(|(_, tops)| tops.len())
                .sum(),
            Definition::Dtm(d) => d.transitions.iter().map(|(_, row)| row.len()).sum(),
        }
    }
}
