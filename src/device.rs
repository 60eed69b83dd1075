//! The executable handle handed to callers once a definition has been validated.

use std::collections::BTreeSet;

use crate::definition::Definition;
use crate::dfa::Dfa;
use crate::dpda::Dpda;
use crate::dtm::{Dtm, DtmRun};
use crate::graph;
use crate::types::{AutomatonError, InputError, Kind, Limits, Verdict};
use crate::validator::{validate, Validated, ValidationError};

/// A validated, immutable device of any kind. Runs never mutate it, so a single `Device`
/// can be shared across threads and executed concurrently.
#[derive(Debug, Clone, PartialEq)]
pub enum Device {
    Dfa(Dfa),
    Dpda(Dpda),
    Dtm(Dtm),
}

/// Parses a kind-specific definition body, validates it and builds the device.
pub fn validate_and_build(kind: Kind, definition: &str) -> Result<Device, AutomatonError> {
    let definition = Definition::from_json(kind, definition)?;
    Ok(Device::build(&definition)?)
}

impl Device {
    /// Builds a device from an already validated definition.
    pub fn from_validated(validated: Validated, limits: Limits) -> Self {
        match validated {
            Validated::Dfa(v) => Device::Dfa(Dfa::new(v)),
            Validated::Dpda(v) => Device::Dpda(Dpda::new(v)),
            Validated::Dtm(v) => Device::Dtm(Dtm::new(v, limits)),
        }
    }

    /// Validates `definition` and builds the device with default limits.
    pub fn build(definition: &Definition) -> Result<Self, ValidationError> {
        Self::build_with_limits(definition, Limits::default())
    }

    pub fn build_with_limits(
        definition: &Definition,
        limits: Limits,
    ) -> Result<Self, ValidationError> {
        validate(definition).map(|validated| Self::from_validated(validated, limits))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Device::Dfa(_) => Kind::Dfa,
            Device::Dpda(_) => Kind::Dpda,
            Device::Dtm(_) => Kind::Dtm,
        }
    }

    /// Returns a copy of the definition the device was built from.
    pub fn definition(&self) -> Definition {
        match self {
            Device::Dfa(d) => Definition::Dfa(d.definition().clone()),
            Device::Dpda(d) => Definition::Dpda(d.definition().clone()),
            Device::Dtm(d) => Definition::Dtm(d.definition().clone()),
        }
    }

    pub fn states(&self) -> &BTreeSet<String> {
        match self {
            Device::Dfa(d) => &d.definition().states,
            Device::Dpda(d) => &d.definition().states,
            Device::Dtm(d) => &d.definition().states,
        }
    }

    pub fn input_symbols(&self) -> &BTreeSet<char> {
        match self {
            Device::Dfa(d) => &d.definition().input_symbols,
            Device::Dpda(d) => &d.definition().input_symbols,
            Device::Dtm(d) => &d.definition().input_symbols,
        }
    }

    pub fn initial_state(&self) -> &str {
        match self {
            Device::Dfa(d) => &d.definition().initial_state,
            Device::Dpda(d) => &d.definition().initial_state,
            Device::Dtm(d) => &d.definition().initial_state,
        }
    }

    pub fn final_states(&self) -> &BTreeSet<String> {
        match self {
            Device::Dfa(d) => &d.definition().final_states,
            Device::Dpda(d) => &d.definition().final_states,
            Device::Dtm(d) => &d.definition().final_states,
        }
    }

    /// Returns true if the device accepts `input`. Tape machines accept by halting in a
    /// final state within their step bound.
    pub fn accepts(&self, input: &str) -> Result<bool, InputError> {
        match self {
            Device::Dfa(d) => d.accepts(input),
            Device::Dpda(d) => d.accepts(input),
            Device::Dtm(d) => d.accepts(input),
        }
    }

    /// Runs a recognizer and reports why it accepted or rejected.
    pub fn evaluate(&self, input: &str) -> Result<Verdict, AutomatonError> {
        match self {
            Device::Dfa(d) => Ok(d.evaluate(input)?),
            Device::Dpda(d) => Ok(d.evaluate(input)?),
            Device::Dtm(_) => Err(AutomatonError::Unsupported {
                operation: "evaluate",
                kind: Kind::Dtm,
            }),
        }
    }

    /// Runs a tape machine to completion.
    pub fn run(&self, input: &str) -> Result<DtmRun, AutomatonError> {
        match self {
            Device::Dtm(d) => Ok(d.run(input)?),
            other => Err(AutomatonError::Unsupported {
                operation: "run",
                kind: other.kind(),
            }),
        }
    }

    /// Renders the transition graph as DOT.
    pub fn graph(&self) -> String {
        graph::render(self)
    }

    /// Number of transition entries.
    pub fn transition_count(&self) -> usize {
        match self {
            Device::Dfa(d) => d.transitions().values().map(|row| row.len()).sum(),
            Device::Dpda(d) => d
                .transitions()
                .values()
                .flat_map(|row| row.values())
                .map(|tops| tops.len())
                .sum(),
            Device::Dtm(d) => d.transitions().values().map(|row| row.len()).sum(),
        }
    }
}
