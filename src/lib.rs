//! This crate validates, executes and renders three kinds of deterministic devices:
//! finite automata (DFA), pushdown automata (DPDA) and single-tape machines (DTM).
//! Definitions are validated once, then built into immutable devices that can be run any
//! number of times, concurrently, and rendered as Graphviz DOT.

pub mod definition;
pub mod device;
pub mod dfa;
pub mod dpda;
pub mod dtm;
pub mod graph;
pub mod loader;
pub mod registry;
pub mod samples;
pub mod types;
pub mod validator;

/// Re-exports the raw definition types from the definition module.
pub use definition::{Definition, DfaDefinition, DpdaDefinition, DtmDefinition, Entries};
/// Re-exports the `Device` handle and the `validate_and_build` entry point.
pub use device::{validate_and_build, Device};
/// Re-exports the three engines.
pub use dfa::Dfa;
pub use dpda::Dpda;
pub use dtm::{Dtm, DtmRun, Outcome};
/// Re-exports the DOT renderers from the graph module.
pub use graph::{render, render_graph};
/// Re-exports the `DefinitionLoader` struct from the loader module.
pub use loader::DefinitionLoader;
/// Re-exports the device store from the registry module.
pub use registry::{DeviceInfo, Registry};
/// Re-exports `Sample` and `Samples` from the samples module.
pub use samples::{Sample, Samples};
/// Re-exports shared types and errors from the types module.
pub use types::{
    AutomatonError, Direction, InputError, Kind, Limits, Rejection, Verdict, DEFAULT_MAX_STEPS,
    MAX_DEFINITION_SIZE,
};
/// Re-exports the `validate` function and `ValidationError` enum from the validator module.
pub use validator::{validate, Validated, ValidationError};
