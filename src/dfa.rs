//! Deterministic finite automaton engine.

use crate::definition::DfaDefinition;
use crate::types::{InputError, Rejection, Verdict};
use crate::validator::{validate_dfa, DfaTransitions, ValidatedDfa, ValidationError};

/// An executable DFA. Holds only the validated definition; every run owns its own state.
#[derive(Debug, Clone, PartialEq)]
pub struct Dfa {
    inner: ValidatedDfa,
}

impl Dfa {
    pub fn new(validated: ValidatedDfa) -> Self {
        Self { inner: validated }
    }

    /// Validates `definition` and builds the engine from it.
    pub fn from_definition(definition: &DfaDefinition) -> Result<Self, ValidationError> {
        validate_dfa(definition).map(Self::new)
    }

    pub fn definition(&self) -> &DfaDefinition {
        self.inner.definition()
    }

    pub fn transitions(&self) -> &DfaTransitions {
        self.inner.transitions()
    }

    /// Returns the state reached from `state` on `symbol`.
    pub fn next_state(&self, state: &str, symbol: char) -> Option<&str> {
        self.inner
            .transitions()
            .get(state)
            .and_then(|row| row.get(&symbol))
            .map(String::as_str)
    }

    /// Consumes the whole input and returns the state the automaton stops in.
    pub fn final_state(&self, input: &str) -> Result<&str, InputError> {
        InputError::check(input, &self.definition().input_symbols)?;

        let mut state = self.definition().initial_state.as_str();
        for symbol in input.chars() {
            if let Some(next) = self.next_state(state, symbol) {
                tracing::trace!(from = state, symbol = %symbol, to = next, "dfa step");
                state = next;
            }
        }

        Ok(state)
    }

    /// Runs the automaton over `input`.
    ///
    /// # Returns
    ///
    /// * `Ok(Verdict::Accept)` if the whole input leads to a final state.
    /// * `Ok(Verdict::Reject(_))` otherwise.
    /// * `Err(InputError)` if the input contains a symbol outside the input alphabet.
    pub fn evaluate(&self, input: &str) -> Result<Verdict, InputError> {
        let state = self.final_state(input)?;

        let verdict = if self.definition().final_states.contains(state) {
            Verdict::Accept
        } else {
            Verdict::Reject(Rejection::NonFinalState {
                state: state.to_string(),
            })
        };

        tracing::debug!(input, ?verdict, "dfa finished");
        Ok(verdict)
    }

    pub fn accepts(&self, input: &str) -> Result<bool, InputError> {
        self.evaluate(input).map(|verdict| verdict.is_accept())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Accepts binary strings with an odd number of `1`s.
    fn odd_ones() -> Dfa {
        let definition: DfaDefinition = serde_json::from_value(json!({
            "states": ["q0", "q1"],
            "input_symbols": ["0", "1"],
            "transitions": {
                "q0": {"0": "q0", "1": "q1"},
                "q1": {"0": "q1", "1": "q0"}
            },
            "initial_state": "q0",
            "final_states": ["q1"]
        }))
        .unwrap();

        Dfa::from_definition(&definition).unwrap()
    }

    #[test]
    fn test_final_state() {
        let dfa = odd_ones();

        assert_eq!(dfa.final_state("101").unwrap(), "q0");
        assert_eq!(dfa.final_state("11").unwrap(), "q0");
        assert_eq!(dfa.final_state("100").unwrap(), "q1");
    }

    #[test]
    fn test_accepts() {
        let dfa = odd_ones();

        assert!(!dfa.accepts("101").unwrap());
        assert!(!dfa.accepts("11").unwrap());
        assert!(dfa.accepts("1").unwrap());
        assert!(dfa.accepts("0111").unwrap());
    }

    #[test]
    fn test_empty_input_depends_on_initial_state() {
        let dfa = odd_ones();
        assert!(!dfa.accepts("").unwrap());

        let mut definition = dfa.definition().clone();
        definition.final_states.insert("q0".to_string());
        let dfa = Dfa::from_definition(&definition).unwrap();
        assert!(dfa.accepts("").unwrap());
    }

    #[test]
    fn test_rejection_reports_state() {
        let dfa = odd_ones();

        assert_eq!(
            dfa.evaluate("11").unwrap(),
            Verdict::Reject(Rejection::NonFinalState {
                state: "q0".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_input_symbol() {
        let dfa = odd_ones();

        assert_eq!(
            dfa.accepts("10a1"),
            Err(InputError::UnknownSymbol {
                symbol: 'a',
                position: 2
            })
        );
    }

    #[test]
    fn test_next_state() {
        let dfa = odd_ones();

        assert_eq!(dfa.next_state("q0", '1'), Some("q1"));
        assert_eq!(dfa.next_state("q9", '1'), None);
    }
}
