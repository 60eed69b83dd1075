//! A built-in catalogue of sample devices, one or more per kind.

use crate::definition::Definition;
use crate::types::{AutomatonError, Kind};

// Default embedded samples
const SAMPLE_TEXTS: [(&str, &str); 4] = [
    ("binary-parity", include_str!("../samples/binary-parity.json")),
    ("balanced-parens", include_str!("../samples/balanced-parens.json")),
    ("unary-increment", include_str!("../samples/unary-increment.json")),
    ("binary-complement", include_str!("../samples/binary-complement.json")),
];

lazy_static::lazy_static! {
    static ref SAMPLES: Vec<Sample> = SAMPLE_TEXTS
        .iter()
        .filter_map(|&(name, text)| match Definition::from_document(text) {
            Ok(definition) => Some(Sample { name, definition }),
            Err(e) => {
                tracing::error!(sample = name, error = %e, "failed to parse embedded sample");
                None
            }
        })
        .collect();
}

/// A named sample definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: &'static str,
    pub definition: Definition,
}

pub struct Samples;

impl Samples {
    /// All samples, in catalogue order.
    pub fn all() -> &'static [Sample] {
        &SAMPLES
    }

    pub fn count() -> usize {
        SAMPLES.len()
    }

    pub fn names() -> Vec<&'static str> {
        SAMPLES.iter().map(|sample| sample.name).collect()
    }

    pub fn by_name(name: &str) -> Result<&'static Sample, AutomatonError> {
        SAMPLES
            .iter()
            .find(|sample| sample.name == name)
            .ok_or_else(|| AutomatonError::NotFound(format!("Sample '{}' not found", name)))
    }

    pub fn of_kind(kind: Kind) -> Vec<&'static Sample> {
        SAMPLES
            .iter()
            .filter(|sample| sample.definition.kind() == kind)
            .collect()
    }

    /// Returns the embedded document text of a sample.
    pub fn text(name: &str) -> Result<&'static str, AutomatonError> {
        SAMPLE_TEXTS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, text)| *text)
            .ok_or_else(|| AutomatonError::NotFound(format!("Sample '{}' not found", name)))
    }
}
