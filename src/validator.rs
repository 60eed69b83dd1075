//! This module checks raw definitions for structural errors before any engine accepts them.
//! Checks run in a fixed order and stop at the first violated invariant, so the reported
//! error always names a single invariant and the key that broke it.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use thiserror::Error;

use crate::definition::{Definition, DfaDefinition, DpdaDefinition, DtmDefinition};
use crate::types::Direction;

/// Identifies one transition entry: the source state plus whichever of the read symbol
/// and stack top the entry is keyed on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransitionKey {
    pub state: String,
    pub symbol: Option<char>,
    pub stack_top: Option<char>,
}

impl TransitionKey {
    fn state(state: &str) -> Self {
        Self {
            state: state.to_string(),
            symbol: None,
            stack_top: None,
        }
    }

    fn symbol(state: &str, symbol: char) -> Self {
        Self {
            symbol: Some(symbol),
            ..Self::state(state)
        }
    }

    fn stack(state: &str, symbol: char, stack_top: char) -> Self {
        Self {
            stack_top: Some(stack_top),
            ..Self::symbol(state, symbol)
        }
    }
}

impl fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.state)?;
        if let Some(symbol) = self.symbol {
            write!(f, ", {:?}", symbol)?;
        }
        if let Some(top) = self.stack_top {
            write!(f, ", {:?}", top)?;
        }
        write!(f, ")")
    }
}

/// Represents the structural errors a definition can have.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("The set of states is empty")]
    EmptyStates,
    #[error("Initial state '{0}' is not a declared state")]
    UnknownInitialState(String),
    #[error("Final state '{0}' is not a declared state")]
    UnknownFinalState(String),
    #[error("Initial stack symbol {0:?} is not in the stack alphabet")]
    UnknownInitialStackSymbol(char),
    #[error("Blank symbol {0:?} is not in the tape alphabet")]
    UnknownBlankSymbol(char),
    #[error("Input symbol {0:?} is not in the tape alphabet")]
    InputSymbolNotOnTape(char),
    #[error("Blank symbol {0:?} must not be an input symbol")]
    BlankIsInputSymbol(char),
    #[error("Transition source state '{0}' is not a declared state")]
    UnknownSourceState(String),
    #[error("Transition {0} reads an undeclared symbol")]
    UnknownReadSymbol(TransitionKey),
    #[error("Transition {0} expects an undeclared stack symbol")]
    UnknownStackTop(TransitionKey),
    #[error("Transition {0} is defined more than once")]
    DuplicateTransition(TransitionKey),
    #[error("Transition {key} targets undeclared state '{state}'")]
    UnknownNextState { key: TransitionKey, state: String },
    #[error("Transition {key} pushes undeclared stack symbol {symbol:?}")]
    UnknownPushSymbol { key: TransitionKey, symbol: char },
    #[error("Transition {key} writes undeclared tape symbol {symbol:?}")]
    UnknownWriteSymbol { key: TransitionKey, symbol: char },
    #[error("Missing transition for {0}")]
    MissingTransition(TransitionKey),
}

/// `state -> symbol -> next state`, total over `states × input_symbols`.
pub type DfaTransitions = BTreeMap<String, BTreeMap<char, String>>;
/// `state -> input symbol -> stack top -> move`
pub type DpdaTransitions = BTreeMap<String, BTreeMap<char, BTreeMap<char, StackMove>>>;
/// `state -> read symbol -> move`
pub type DtmTransitions = BTreeMap<String, BTreeMap<char, TapeMove>>;

/// The right-hand side of a pushdown transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackMove {
    pub next_state: String,
    /// Pushed in order after popping the top; the last symbol becomes the new top.
    pub push: Vec<char>,
}

/// The right-hand side of a tape transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapeMove {
    pub next_state: String,
    pub write: char,
    pub direction: Direction,
}

/// A DFA definition that passed validation, with its transitions indexed for lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDfa {
    definition: DfaDefinition,
    transitions: DfaTransitions,
}

impl ValidatedDfa {
    pub fn definition(&self) -> &DfaDefinition {
        &self.definition
    }

    pub fn transitions(&self) -> &DfaTransitions {
        &self.transitions
    }
}

/// A DPDA definition that passed validation, with its transitions indexed for lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDpda {
    definition: DpdaDefinition,
    transitions: DpdaTransitions,
}

impl ValidatedDpda {
    pub fn definition(&self) -> &DpdaDefinition {
        &self.definition
    }

    pub fn transitions(&self) -> &DpdaTransitions {
        &self.transitions
    }
}

/// A DTM definition that passed validation, with its transitions indexed for lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedDtm {
    definition: DtmDefinition,
    transitions: DtmTransitions,
}

impl ValidatedDtm {
    pub fn definition(&self) -> &DtmDefinition {
        &self.definition
    }

    pub fn transitions(&self) -> &DtmTransitions {
        &self.transitions
    }
}

/// A definition of any kind that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Validated {
    Dfa(ValidatedDfa),
    Dpda(ValidatedDpda),
    Dtm(ValidatedDtm),
}

/// Validates a definition of any kind.
///
/// # Returns
///
/// * `Ok(Validated)` if every invariant holds.
/// * `Err(ValidationError)` naming the first violated invariant and its offending key.
pub fn validate(definition: &Definition) -> Result<Validated, ValidationError> {
    let result = match definition {
        Definition::Dfa(d) => validate_dfa(d).map(Validated::Dfa),
        Definition::Dpda(d) => validate_dpda(d).map(Validated::Dpda),
        Definition::Dtm(d) => validate_dtm(d).map(Validated::Dtm),
    };

    match &result {
        Ok(_) => tracing::debug!(kind = %definition.kind(), "definition is valid"),
        Err(e) => tracing::debug!(kind = %definition.kind(), error = %e, "definition rejected"),
    }

    result
}

pub fn validate_dfa(definition: &DfaDefinition) -> Result<ValidatedDfa, ValidationError> {
    check_states(
        &definition.states,
        &definition.initial_state,
        &definition.final_states,
    )?;

    let leaves: Vec<(TransitionKey, &String)> = definition
        .transitions
        .iter()
        .flat_map(|(state, row)| {
            row.iter()
                .map(move |(&symbol, next)| (TransitionKey::symbol(state, symbol), next))
        })
        .collect();

    check_sources(&definition.states, definition.transitions.iter().map(|(s, _)| s))?;
    for (key, _) in &leaves {
        check_symbol(key, &definition.input_symbols)?;
    }
    check_unique(
        definition
            .transitions
            .iter()
            .map(|(s, _)| TransitionKey::state(s))
            .chain(leaves.iter().map(|(key, _)| key.clone())),
    )?;
    for (key, next) in &leaves {
        check_next_state(key, next, &definition.states)?;
    }

    let mut transitions = DfaTransitions::new();
    for (key, next) in leaves {
        if let Some(symbol) = key.symbol {
            transitions
                .entry(key.state)
                .or_default()
                .insert(symbol, next.clone());
        }
    }

    // Totality: every state has a move on every input symbol.
    for state in &definition.states {
        for &symbol in &definition.input_symbols {
            let defined = transitions
                .get(state)
                .is_some_and(|row| row.contains_key(&symbol));
            if !defined {
                return Err(ValidationError::MissingTransition(TransitionKey::symbol(
                    state, symbol,
                )));
            }
        }
    }

    Ok(ValidatedDfa {
        definition: definition.clone(),
        transitions,
    })
}

pub fn validate_dpda(definition: &DpdaDefinition) -> Result<ValidatedDpda, ValidationError> {
    check_states(
        &definition.states,
        &definition.initial_state,
        &definition.final_states,
    )?;

    if !definition
        .stack_symbols
        .contains(&definition.initial_stack_symbol)
    {
        return Err(ValidationError::UnknownInitialStackSymbol(
            definition.initial_stack_symbol,
        ));
    }

    let rows: Vec<TransitionKey> = definition
        .transitions
        .iter()
        .flat_map(|(state, row)| {
            row.iter()
                .map(move |(&symbol, _)| TransitionKey::symbol(state, symbol))
        })
        .collect();
    let leaves: Vec<(TransitionKey, &(String, String))> = definition
        .transitions
        .iter()
        .flat_map(|(state, row)| {
            row.iter().flat_map(move |(&symbol, tops)| {
                tops.iter()
                    .map(move |(&top, rhs)| (TransitionKey::stack(state, symbol, top), rhs))
            })
        })
        .collect();

    check_sources(&definition.states, definition.transitions.iter().map(|(s, _)| s))?;
    for key in &rows {
        check_symbol(key, &definition.input_symbols)?;
    }
    for (key, _) in &leaves {
        if let Some(top) = key.stack_top {
            if !definition.stack_symbols.contains(&top) {
                return Err(ValidationError::UnknownStackTop(key.clone()));
            }
        }
    }
    check_unique(
        definition
            .transitions
            .iter()
            .map(|(s, _)| TransitionKey::state(s))
            .chain(rows.iter().cloned())
            .chain(leaves.iter().map(|(key, _)| key.clone())),
    )?;
    for (key, (next, push)) in &leaves {
        check_next_state(key, next, &definition.states)?;
        if let Some(symbol) = push
            .chars()
            .find(|c| !definition.stack_symbols.contains(c))
        {
            return Err(ValidationError::UnknownPushSymbol {
                key: key.clone(),
                symbol,
            });
        }
    }

    let mut transitions = DpdaTransitions::new();
    for (key, (next, push)) in leaves {
        if let (Some(symbol), Some(top)) = (key.symbol, key.stack_top) {
            transitions
                .entry(key.state)
                .or_default()
                .entry(symbol)
                .or_default()
                .insert(
                    top,
                    StackMove {
                        next_state: next.clone(),
                        push: push.chars().collect(),
                    },
                );
        }
    }

    Ok(ValidatedDpda {
        definition: definition.clone(),
        transitions,
    })
}

pub fn validate_dtm(definition: &DtmDefinition) -> Result<ValidatedDtm, ValidationError> {
    check_states(
        &definition.states,
        &definition.initial_state,
        &definition.final_states,
    )?;

    if !definition.tape_symbols.contains(&definition.blank_symbol) {
        return Err(ValidationError::UnknownBlankSymbol(definition.blank_symbol));
    }
    if let Some(&symbol) = definition
        .input_symbols
        .iter()
        .find(|s| !definition.tape_symbols.contains(s))
    {
        return Err(ValidationError::InputSymbolNotOnTape(symbol));
    }
    if definition.input_symbols.contains(&definition.blank_symbol) {
        return Err(ValidationError::BlankIsInputSymbol(definition.blank_symbol));
    }

    let leaves: Vec<(TransitionKey, &(String, char, Direction))> = definition
        .transitions
        .iter()
        .flat_map(|(state, row)| {
            row.iter()
                .map(move |(&symbol, rhs)| (TransitionKey::symbol(state, symbol), rhs))
        })
        .collect();

    check_sources(&definition.states, definition.transitions.iter().map(|(s, _)| s))?;
    for (key, _) in &leaves {
        check_symbol(key, &definition.tape_symbols)?;
    }
    check_unique(
        definition
            .transitions
            .iter()
            .map(|(s, _)| TransitionKey::state(s))
            .chain(leaves.iter().map(|(key, _)| key.clone())),
    )?;
    for (key, (next, write, _)) in &leaves {
        check_next_state(key, next, &definition.states)?;
        if !definition.tape_symbols.contains(write) {
            return Err(ValidationError::UnknownWriteSymbol {
                key: key.clone(),
                symbol: *write,
            });
        }
    }

    let mut transitions = DtmTransitions::new();
    for (key, (next, write, direction)) in leaves {
        if let Some(symbol) = key.symbol {
            transitions.entry(key.state).or_default().insert(
                symbol,
                TapeMove {
                    next_state: next.clone(),
                    write: *write,
                    direction: *direction,
                },
            );
        }
    }

    Ok(ValidatedDtm {
        definition: definition.clone(),
        transitions,
    })
}

/// Checks the state set, the initial state and the final states.
fn check_states(
    states: &BTreeSet<String>,
    initial_state: &str,
    final_states: &BTreeSet<String>,
) -> Result<(), ValidationError> {
    if states.is_empty() {
        return Err(ValidationError::EmptyStates);
    }

    if !states.contains(initial_state) {
        return Err(ValidationError::UnknownInitialState(
            initial_state.to_string(),
        ));
    }

    final_states
        .iter()
        .find(|state| !states.contains(*state))
        .map_or(Ok(()), |state| {
            Err(ValidationError::UnknownFinalState(state.clone()))
        })
}

fn check_sources<'a>(
    states: &BTreeSet<String>,
    mut sources: impl Iterator<Item = &'a String>,
) -> Result<(), ValidationError> {
    sources
        .find(|state| !states.contains(*state))
        .map_or(Ok(()), |state| {
            Err(ValidationError::UnknownSourceState(state.clone()))
        })
}

fn check_symbol(key: &TransitionKey, alphabet: &BTreeSet<char>) -> Result<(), ValidationError> {
    match key.symbol {
        Some(symbol) if !alphabet.contains(&symbol) => {
            Err(ValidationError::UnknownReadSymbol(key.clone()))
        }
        _ => Ok(()),
    }
}

/// Rejects the first key that appears twice. Keys at different levels of a table never
/// collide because they differ in which fields are set.
fn check_unique(keys: impl Iterator<Item = TransitionKey>) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key.clone()) {
            return Err(ValidationError::DuplicateTransition(key));
        }
    }
    Ok(())
}

fn check_next_state(
    key: &TransitionKey,
    next: &str,
    states: &BTreeSet<String>,
) -> Result<(), ValidationError> {
    if states.contains(next) {
        Ok(())
    } else {
        Err(ValidationError::UnknownNextState {
            key: key.clone(),
            state: next.to_string(),
        })
    }
}
