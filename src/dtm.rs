//! This module defines the deterministic tape machine engine: a sparse, unbounded tape, the
//! machine configuration, and a lazy execution that yields one snapshot per step.
//!
//! A machine halts only when no transition applies to its current state and the symbol
//! under the head. Halting in a final state is an acceptance, halting anywhere else is a
//! rejection, and running into the step bound is reported separately.

use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::definition::DtmDefinition;
use crate::types::{InputError, Limits};
use crate::validator::{validate_dtm, DtmTransitions, TapeMove, ValidatedDtm, ValidationError};

/// An unbounded tape. Cells that were never written, or were overwritten with the blank
/// symbol, are not stored and read back as blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: BTreeMap<i64, char>,
    blank: char,
}

impl Tape {
    /// Creates a tape holding `input` left-aligned from cell 0.
    pub fn new(input: &str, blank: char) -> Self {
        let mut tape = Self {
            cells: BTreeMap::new(),
            blank,
        };
        for (i, symbol) in input.chars().enumerate() {
            tape.write(i as i64, symbol);
        }
        tape
    }

    pub fn blank(&self) -> char {
        self.blank
    }

    pub fn read(&self, index: i64) -> char {
        self.cells.get(&index).copied().unwrap_or(self.blank)
    }

    pub fn write(&mut self, index: i64, symbol: char) {
        if symbol == self.blank {
            self.cells.remove(&index);
        } else {
            self.cells.insert(index, symbol);
        }
    }

    /// The range of cells worth showing: every non-blank cell plus the head cell.
    pub fn span(&self, head: i64) -> RangeInclusive<i64> {
        let low = self.cells.keys().next().map_or(head, |&i| i.min(head));
        let high = self.cells.keys().next_back().map_or(head, |&i| i.max(head));
        low..=high
    }

    /// Reads the tape over [`Tape::span`] as a string.
    pub fn contents(&self, head: i64) -> String {
        self.span(head).map(|i| self.read(i)).collect()
    }
}

/// A snapshot of a running machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub state: String,
    pub tape: Tape,
    pub head: i64,
    /// Number of transitions applied so far.
    pub step: usize,
}

impl Configuration {
    /// The symbol under the head.
    pub fn symbol(&self) -> char {
        self.tape.read(self.head)
    }

    pub fn tape_contents(&self) -> String {
        self.tape.contents(self.head)
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    /// Halted in a final state.
    Accept,
    /// Halted in a non-final state.
    Reject,
    /// Still had a move after the step bound was used up.
    StepLimitExceeded,
}

/// Represents the outcome of an execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A transition was applied and the machine may continue.
    Continue,
    /// The run is over.
    Halt(Outcome),
}

/// The result of running a machine to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DtmRun {
    pub final_tape: String,
    pub final_state: String,
    /// Head position relative to the first input cell.
    pub head: i64,
    pub halted: bool,
    pub steps: usize,
    pub outcome: Outcome,
}

/// An executable tape machine. Holds only the validated definition; every run owns its tape.
#[derive(Debug, Clone, PartialEq)]
pub struct Dtm {
    inner: ValidatedDtm,
    limits: Limits,
}

impl Dtm {
    pub fn new(validated: ValidatedDtm, limits: Limits) -> Self {
        Self {
            inner: validated,
            limits,
        }
    }

    /// Validates `definition` and builds the engine with default limits.
    pub fn from_definition(definition: &DtmDefinition) -> Result<Self, ValidationError> {
        validate_dtm(definition).map(|validated| Self::new(validated, Limits::default()))
    }

    pub fn definition(&self) -> &DtmDefinition {
        self.inner.definition()
    }

    pub fn transitions(&self) -> &DtmTransitions {
        self.inner.transitions()
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Looks up the move for `(state, symbol)`.
    pub fn transition(&self, state: &str, symbol: char) -> Option<&TapeMove> {
        self.inner
            .transitions()
            .get(state)
            .and_then(|row| row.get(&symbol))
    }

    /// The configuration a run on `input` starts from.
    pub fn initial_configuration(&self, input: &str) -> Configuration {
        Configuration {
            state: self.definition().initial_state.clone(),
            tape: Tape::new(input, self.definition().blank_symbol),
            head: 0,
            step: 0,
        }
    }

    /// Starts a lazy execution on `input` bounded by the machine's configured limits.
    pub fn execute(&self, input: &str) -> Result<Execution<'_>, InputError> {
        self.execute_with_limit(input, self.limits.max_steps)
    }

    /// Starts a lazy execution on `input` that gives up after `max_steps` transitions.
    pub fn execute_with_limit(
        &self,
        input: &str,
        max_steps: usize,
    ) -> Result<Execution<'_>, InputError> {
        InputError::check(input, &self.definition().input_symbols)?;

        Ok(Execution {
            machine: self,
            config: self.initial_configuration(input),
            max_steps,
            started: false,
            outcome: None,
        })
    }

    /// Runs the machine on `input` until it halts or exceeds the configured step bound.
    pub fn run(&self, input: &str) -> Result<DtmRun, InputError> {
        self.run_with_limit(input, self.limits.max_steps)
    }

    pub fn run_with_limit(&self, input: &str, max_steps: usize) -> Result<DtmRun, InputError> {
        let mut execution = self.execute_with_limit(input, max_steps)?;
        let outcome = execution.finish();
        let config = execution.configuration();

        tracing::debug!(
            input,
            ?outcome,
            steps = config.step,
            state = %config.state,
            "dtm finished"
        );

        Ok(DtmRun {
            final_tape: config.tape_contents(),
            final_state: config.state.clone(),
            head: config.head,
            halted: outcome != Outcome::StepLimitExceeded,
            steps: config.step,
            outcome,
        })
    }

    /// Returns true if the machine halts on `input` in a final state within its bound.
    pub fn accepts(&self, input: &str) -> Result<bool, InputError> {
        self.run(input).map(|run| run.outcome == Outcome::Accept)
    }

    fn halting_outcome(&self, state: &str) -> Outcome {
        if self.definition().final_states.contains(state) {
            Outcome::Accept
        } else {
            Outcome::Reject
        }
    }
}

/// A single run of a [`Dtm`].
///
/// As an iterator it yields the initial configuration followed by one snapshot after every
/// transition, and ends when the machine halts or the step bound is reached. The reason it
/// ended is available from [`Execution::outcome`].
pub struct Execution<'a> {
    machine: &'a Dtm,
    config: Configuration,
    max_steps: usize,
    started: bool,
    outcome: Option<Outcome>,
}

impl Execution<'_> {
    /// Applies one transition.
    ///
    /// # Returns
    ///
    /// * `Step::Continue` if a transition was applied.
    /// * `Step::Halt(_)` if no transition applies or the step bound has been used up.
    pub fn step(&mut self) -> Step {
        if let Some(outcome) = self.outcome {
            return Step::Halt(outcome);
        }

        let symbol = self.config.symbol();
        let mv = match self.machine.transition(&self.config.state, symbol) {
            Some(mv) => mv,
            None => {
                let outcome = self.machine.halting_outcome(&self.config.state);
                self.outcome = Some(outcome);
                return Step::Halt(outcome);
            }
        };

        if self.config.step >= self.max_steps {
            tracing::warn!(
                max_steps = self.max_steps,
                state = %self.config.state,
                "dtm did not halt within the step bound"
            );
            self.outcome = Some(Outcome::StepLimitExceeded);
            return Step::Halt(Outcome::StepLimitExceeded);
        }

        self.config.tape.write(self.config.head, mv.write);
        self.config.head += mv.direction.offset();
        tracing::trace!(
            from = %self.config.state,
            read = %symbol,
            write = %mv.write,
            to = %mv.next_state,
            head = self.config.head,
            "dtm step"
        );
        self.config.state.clone_from(&mv.next_state);
        self.config.step += 1;

        Step::Continue
    }

    /// Steps until the run is over and returns how it ended.
    pub fn finish(&mut self) -> Outcome {
        loop {
            if let Step::Halt(outcome) = self.step() {
                return outcome;
            }
        }
    }

    /// Returns `None` while the machine can still move.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }
}

impl Iterator for Execution<'_> {
    type Item = Configuration;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            return Some(self.config.clone());
        }

        match self.step() {
            Step::Continue => Some(self.config.clone()),
            Step::Halt(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn build(body: Value) -> Dtm {
        let definition: DtmDefinition = serde_json::from_value(body).unwrap();
        Dtm::from_definition(&definition).unwrap()
    }

    /// Appends a `1` to a unary number.
    fn unary_increment() -> Dtm {
        build(json!({
            "states": ["q0", "q1"],
            "input_symbols": ["1"],
            "tape_symbols": ["1", "_"],
            "transitions": {
                "q0": {"1": ["q0", "1", "R"], "_": ["q1", "1", "N"]}
            },
            "initial_state": "q0",
            "final_states": ["q1"],
            "blank_symbol": "_"
        }))
    }

    /// Walks right over blanks forever.
    fn runaway() -> Dtm {
        build(json!({
            "states": ["q0"],
            "input_symbols": ["1"],
            "tape_symbols": ["1", "_"],
            "transitions": {"q0": {"_": ["q0", "_", "R"], "1": ["q0", "1", "R"]}},
            "initial_state": "q0",
            "final_states": [],
            "blank_symbol": "_"
        }))
    }

    #[test]
    fn test_tape_reads_blank_outside_written_cells() {
        let tape = Tape::new("ab", '_');

        assert_eq!(tape.read(0), 'a');
        assert_eq!(tape.read(1), 'b');
        assert_eq!(tape.read(2), '_');
        assert_eq!(tape.read(-5), '_');
    }

    #[test]
    fn test_tape_span_includes_head() {
        let mut tape = Tape::new("ab", '_');

        assert_eq!(tape.span(0), 0..=1);
        assert_eq!(tape.span(3), 0..=3);
        assert_eq!(tape.contents(-2), "__ab");

        tape.write(1, '_');
        assert_eq!(tape.contents(0), "a");
    }

    #[test]
    fn test_empty_tape_contents_is_single_blank() {
        let tape = Tape::new("", '_');
        assert_eq!(tape.contents(0), "_");
    }

    #[test]
    fn test_unary_increment() {
        let dtm = unary_increment();

        let run = dtm.run("111").unwrap();
        assert_eq!(run.final_tape, "1111");
        assert_eq!(run.final_state, "q1");
        assert_eq!(run.outcome, Outcome::Accept);
        assert!(run.halted);
        assert_eq!(run.steps, 4);
    }

    #[test]
    fn test_blank_input_without_move_halts_immediately() {
        let dtm = build(json!({
            "states": ["q0"],
            "input_symbols": ["1"],
            "tape_symbols": ["1", "_"],
            "transitions": {"q0": {"1": ["q0", "1", "R"]}},
            "initial_state": "q0",
            "final_states": [],
            "blank_symbol": "_"
        }));

        let run = dtm.run("").unwrap();
        assert_eq!(run.final_tape, "_");
        assert_eq!(run.steps, 0);
        assert!(run.halted);
        assert_eq!(run.outcome, Outcome::Reject);
    }

    #[test]
    fn test_execution_yields_one_snapshot_per_step() {
        let dtm = unary_increment();

        let snapshots: Vec<Configuration> = dtm.execute("11").unwrap().collect();
        assert_eq!(snapshots.len(), 4);
        assert_eq!(snapshots[0].step, 0);
        assert_eq!(snapshots[0].tape_contents(), "11");
        assert_eq!(snapshots[2].head, 2);
        assert_eq!(snapshots[3].tape_contents(), "111");
        assert_eq!(snapshots[3].state, "q1");
    }

    #[test]
    fn test_step_limit_is_reported() {
        let dtm = runaway();

        let run = dtm.run_with_limit("1", 25).unwrap();
        assert_eq!(run.outcome, Outcome::StepLimitExceeded);
        assert!(!run.halted);
        assert_eq!(run.steps, 25);
        assert_eq!(run.head, 25);
    }

    #[test]
    fn test_execution_outcome_after_iteration() {
        let dtm = runaway();

        let mut execution = dtm.execute_with_limit("", 3).unwrap();
        assert_eq!(execution.outcome(), None);
        assert_eq!(execution.by_ref().count(), 4);
        assert_eq!(execution.outcome(), Some(Outcome::StepLimitExceeded));
        assert_eq!(execution.step(), Step::Halt(Outcome::StepLimitExceeded));
    }

    #[test]
    fn test_halting_exactly_at_bound_is_not_a_limit() {
        let dtm = unary_increment();

        let run = dtm.run_with_limit("111", 4).unwrap();
        assert_eq!(run.outcome, Outcome::Accept);
        assert_eq!(run.steps, 4);
    }

    #[test]
    fn test_moving_left_of_input() {
        let dtm = build(json!({
            "states": ["q0", "q1", "q2"],
            "input_symbols": ["1"],
            "tape_symbols": ["1", "X", "_"],
            "transitions": {
                "q0": {"1": ["q1", "1", "L"]},
                "q1": {"_": ["q2", "X", "N"]}
            },
            "initial_state": "q0",
            "final_states": ["q2"],
            "blank_symbol": "_"
        }));

        let run = dtm.run("1").unwrap();
        assert_eq!(run.final_tape, "X1");
        assert_eq!(run.head, -1);
        assert!(dtm.accepts("1").unwrap());
    }

    #[test]
    fn test_unknown_input_symbol() {
        let dtm = unary_increment();

        assert_eq!(
            dtm.run("1_1").map(|run| run.outcome),
            Err(InputError::UnknownSymbol {
                symbol: '_',
                position: 1
            })
        );
    }

    #[test]
    fn test_runs_are_deterministic() {
        let dtm = unary_increment();
        assert_eq!(dtm.run("11").unwrap(), dtm.run("11").unwrap());
    }
}
