//! Deterministic pushdown automaton engine.
//!
//! A run starts with the initial stack symbol alone on the stack. Every move pops exactly
//! one symbol and then pushes the transition's sequence in order, so the last pushed symbol
//! is the new top. A configuration with no move rejects immediately; acceptance is by final
//! state only.

use crate::definition::DpdaDefinition;
use crate::types::{InputError, Rejection, Verdict};
use crate::validator::{validate_dpda, DpdaTransitions, StackMove, ValidatedDpda, ValidationError};

/// An executable DPDA. Holds only the validated definition; every run owns its own stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Dpda {
    inner: ValidatedDpda,
}

/// The configuration of one DPDA run after some prefix of the input has been consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub state: String,
    /// Bottom of the stack first.
    pub stack: Vec<char>,
    /// Number of input symbols consumed so far.
    pub consumed: usize,
}

impl Configuration {
    pub fn top(&self) -> Option<char> {
        self.stack.last().copied()
    }
}

impl Dpda {
    pub fn new(validated: ValidatedDpda) -> Self {
        Self { inner: validated }
    }

    /// Validates `definition` and builds the engine from it.
    pub fn from_definition(definition: &DpdaDefinition) -> Result<Self, ValidationError> {
        validate_dpda(definition).map(Self::new)
    }

    pub fn definition(&self) -> &DpdaDefinition {
        self.inner.definition()
    }

    pub fn transitions(&self) -> &DpdaTransitions {
        self.inner.transitions()
    }

    /// The configuration every run starts from.
    pub fn initial_configuration(&self) -> Configuration {
        Configuration {
            state: self.definition().initial_state.clone(),
            stack: vec![self.definition().initial_stack_symbol],
            consumed: 0,
        }
    }

    /// Looks up the move for `(state, symbol, top)`.
    pub fn transition(&self, state: &str, symbol: char, top: char) -> Option<&StackMove> {
        self.inner
            .transitions()
            .get(state)
            .and_then(|row| row.get(&symbol))
            .and_then(|tops| tops.get(&top))
    }

    /// Applies one move to `config`, consuming `symbol`.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if a move existed and was applied.
    /// * `Err(Rejection::NoTransition)` if no move applies; `config` is left untouched.
    pub fn step(&self, config: &mut Configuration, symbol: char) -> Result<(), Rejection> {
        let top = config.top();
        let mv = top
            .and_then(|top| self.transition(&config.state, symbol, top))
            .ok_or_else(|| Rejection::NoTransition {
                state: config.state.clone(),
                symbol,
                stack_top: top,
            })?;

        config.stack.pop();
        config.stack.extend_from_slice(&mv.push);
        tracing::trace!(
            from = %config.state,
            symbol = %symbol,
            to = %mv.next_state,
            depth = config.stack.len(),
            "dpda step"
        );
        config.state.clone_from(&mv.next_state);
        config.consumed += 1;

        Ok(())
    }

    /// Runs the automaton over `input` and returns the last configuration reached together
    /// with the verdict.
    pub fn trace(&self, input: &str) -> Result<(Configuration, Verdict), InputError> {
        InputError::check(input, &self.definition().input_symbols)?;

        let mut config = self.initial_configuration();
        for symbol in input.chars() {
            if let Err(rejection) = self.step(&mut config, symbol) {
                tracing::debug!(input, ?rejection, "dpda halted without a move");
                return Ok((config, Verdict::Reject(rejection)));
            }
        }

        let verdict = if self.definition().final_states.contains(&config.state) {
            Verdict::Accept
        } else {
            Verdict::Reject(Rejection::NonFinalState {
                state: config.state.clone(),
            })
        };

        tracing::debug!(input, ?verdict, "dpda finished");
        Ok((config, verdict))
    }

    /// Runs the automaton over `input`.
    ///
    /// # Returns
    ///
    /// * `Ok(Verdict::Accept)` if all input is consumed and the final state is accepting.
    /// * `Ok(Verdict::Reject(_))` if a move is missing or the run ends in a non-final state.
    /// * `Err(InputError)` if the input contains a symbol outside the input alphabet.
    pub fn evaluate(&self, input: &str) -> Result<Verdict, InputError> {
        self.trace(input).map(|(_, verdict)| verdict)
    }

    pub fn accepts(&self, input: &str) -> Result<bool, InputError> {
        self.evaluate(input).map(|verdict| verdict.is_accept())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn build(body: Value) -> Dpda {
        let definition: DpdaDefinition = serde_json::from_value(body).unwrap();
        Dpda::from_definition(&definition).unwrap()
    }

    /// Balanced parentheses. In `q1` the nesting depth is one more than the number of `P`s.
    fn balanced_parens() -> Dpda {
        build(json!({
            "states": ["q0", "q1"],
            "input_symbols": ["(", ")"],
            "stack_symbols": ["Z", "P"],
            "transitions": {
                "q0": {"(": {"Z": ["q1", "Z"]}},
                "q1": {
                    "(": {"Z": ["q1", "ZP"], "P": ["q1", "PP"]},
                    ")": {"Z": ["q0", "Z"], "P": ["q1", ""]}
                }
            },
            "initial_state": "q0",
            "initial_stack_symbol": "Z",
            "final_states": ["q0"]
        }))
    }

    /// Reads one `a`, popping the bottom symbol and leaving the stack empty.
    fn drains_stack() -> Dpda {
        build(json!({
            "states": ["q0", "q1"],
            "input_symbols": ["a"],
            "stack_symbols": ["Z"],
            "transitions": {
                "q0": {"a": {"Z": ["q1", ""]}},
                "q1": {"a": {"Z": ["q1", "Z"]}}
            },
            "initial_state": "q0",
            "initial_stack_symbol": "Z",
            "final_states": ["q1"]
        }))
    }

    #[test]
    fn test_balanced_parentheses() {
        let dpda = balanced_parens();

        assert!(dpda.accepts("(())").unwrap());
        assert!(dpda.accepts("()()").unwrap());
        assert!(dpda.accepts("").unwrap());
        assert!(!dpda.accepts("(()").unwrap());
        assert!(!dpda.accepts("())").unwrap());
    }

    #[test]
    fn test_unmatched_close_rejects_without_move() {
        let dpda = balanced_parens();

        assert_eq!(
            dpda.evaluate("())(").unwrap(),
            Verdict::Reject(Rejection::NoTransition {
                state: "q0".to_string(),
                symbol: ')',
                stack_top: Some('Z'),
            })
        );
    }

    #[test]
    fn test_unfinished_input_rejects_in_non_final_state() {
        let dpda = balanced_parens();

        let (config, verdict) = dpda.trace("(()").unwrap();
        assert_eq!(
            verdict,
            Verdict::Reject(Rejection::NonFinalState {
                state: "q1".to_string()
            })
        );
        assert_eq!(config.stack, vec!['Z']);
        assert_eq!(config.consumed, 3);
    }

    #[test]
    fn test_push_order_puts_last_symbol_on_top() {
        let dpda = balanced_parens();

        let (config, _) = dpda.trace("(((").unwrap();
        assert_eq!(config.stack, vec!['Z', 'P', 'P']);
        assert_eq!(config.top(), Some('P'));
    }

    #[test]
    fn test_empty_stack_rejects_next_symbol() {
        let dpda = drains_stack();

        let (config, verdict) = dpda.trace("a").unwrap();
        assert!(verdict.is_accept());
        assert!(config.stack.is_empty());

        assert_eq!(
            dpda.evaluate("aa").unwrap(),
            Verdict::Reject(Rejection::NoTransition {
                state: "q1".to_string(),
                symbol: 'a',
                stack_top: None,
            })
        );
    }

    #[test]
    fn test_step_leaves_configuration_on_rejection() {
        let dpda = balanced_parens();
        let mut config = dpda.initial_configuration();

        assert!(dpda.step(&mut config, ')').is_err());
        assert_eq!(config, dpda.initial_configuration());
    }

    #[test]
    fn test_unknown_input_symbol() {
        let dpda = balanced_parens();

        assert_eq!(
            dpda.accepts("(x)"),
            Err(InputError::UnknownSymbol {
                symbol: 'x',
                position: 1
            })
        );
    }

    #[test]
    fn test_runs_are_independent() {
        let dpda = balanced_parens();

        assert!(!dpda.accepts("((").unwrap());
        assert!(dpda.accepts("()").unwrap());
        assert!(!dpda.accepts("((").unwrap());
    }
}
