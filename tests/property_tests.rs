//! Property-based tests for the engines and the graph renderer.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated definitions and inputs.

use automata::{
    render, Definition, Device, DfaDefinition, Direction, DpdaDefinition, DtmDefinition, Entries,
    Outcome,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

const INPUT: [char; 2] = ['a', 'b'];
const STACK: [char; 2] = ['Z', 'X'];
const TAPE: [char; 3] = ['a', 'b', '_'];
const MOVES: [Direction; 3] = [Direction::Left, Direction::Right, Direction::Stay];

fn state(i: usize) -> String {
    format!("s{}", i)
}

fn state_set(n: usize) -> BTreeSet<String> {
    (0..n).map(state).collect()
}

fn finals(flags: &[bool]) -> BTreeSet<String> {
    flags
        .iter()
        .enumerate()
        .filter(|(_, is_final)| **is_final)
        .map(|(i, _)| state(i))
        .collect()
}

prop_compose! {
    /// A total DFA over `{a, b}` with up to five states.
    fn arbitrary_dfa()(n in 1usize..6)(
        targets in vec(0..n, n * INPUT.len()),
        final_flags in vec(any::<bool>(), n),
        n in Just(n),
    ) -> DfaDefinition {
        let transitions = (0..n)
            .map(|i| {
                let row = INPUT
                    .iter()
                    .enumerate()
                    .map(|(j, &symbol)| (symbol, state(targets[i * INPUT.len() + j])))
                    .collect::<Entries<_, _>>();
                (state(i), row)
            })
            .collect();

        DfaDefinition {
            states: state_set(n),
            input_symbols: INPUT.iter().copied().collect(),
            transitions,
            initial_state: state(0),
            final_states: finals(&final_flags),
        }
    }
}

prop_compose! {
    /// A partial DPDA over `{a, b}`: each `(state, symbol, top)` slot is either empty or
    /// holds a move pushing up to two stack symbols.
    fn arbitrary_dpda()(n in 1usize..4)(
        slots in vec(
            proptest::option::of((0..n, vec(0..STACK.len(), 0..3))),
            n * INPUT.len() * STACK.len(),
        ),
        final_flags in vec(any::<bool>(), n),
        n in Just(n),
    ) -> DpdaDefinition {
        let mut transitions = Entries::new();
        for i in 0..n {
            let mut row = Entries::new();
            for (j, &symbol) in INPUT.iter().enumerate() {
                let mut tops = Entries::new();
                for (k, &top) in STACK.iter().enumerate() {
                    let slot = &slots[(i * INPUT.len() + j) * STACK.len() + k];
                    if let Some((target, push)) = slot {
                        let push: String = push.iter().map(|&p| STACK[p]).collect();
                        tops.push(top, (state(*target), push));
                    }
                }
                if !tops.is_empty() {
                    row.push(symbol, tops);
                }
            }
            if !row.is_empty() {
                transitions.push(state(i), row);
            }
        }

        DpdaDefinition {
            states: state_set(n),
            input_symbols: INPUT.iter().copied().collect(),
            stack_symbols: STACK.iter().copied().collect(),
            transitions,
            initial_state: state(0),
            initial_stack_symbol: 'Z',
            final_states: finals(&final_flags),
        }
    }
}

prop_compose! {
    /// A partial DTM over tape `{a, b, _}`: each `(state, read)` slot is either empty or holds
    /// a move writing any tape symbol.
    fn arbitrary_dtm()(n in 1usize..5)(
        slots in vec(
            proptest::option::of((0..n, 0..TAPE.len(), 0..MOVES.len())),
            n * TAPE.len(),
        ),
        final_flags in vec(any::<bool>(), n),
        n in Just(n),
    ) -> DtmDefinition {
        let mut transitions = Entries::new();
        for i in 0..n {
            let row = TAPE
                .iter()
                .enumerate()
                .filter_map(|(j, &read)| {
                    slots[i * TAPE.len() + j]
                        .map(|(target, write, mv)| (read, (state(target), TAPE[write], MOVES[mv])))
                })
                .collect::<Entries<_, _>>();
            if !row.is_empty() {
                transitions.push(state(i), row);
            }
        }

        DtmDefinition {
            states: state_set(n),
            input_symbols: INPUT.iter().copied().collect(),
            tape_symbols: TAPE.iter().copied().collect(),
            transitions,
            initial_state: state(0),
            final_states: finals(&final_flags),
            blank_symbol: '_',
        }
    }
}

fn input_string() -> impl Strategy<Value = String> {
    vec(proptest::sample::select(INPUT.to_vec()), 0..24).prop_map(|s| s.into_iter().collect())
}

/// Counts `(node declarations, transition edges)` in a DOT document.
fn count_dot(dot: &str) -> (usize, usize) {
    let nodes = dot
        .lines()
        .filter(|line| line.starts_with('"') && !line.contains(" -> "))
        .count();
    let edges = dot
        .lines()
        .filter(|line| line.starts_with('"') && line.contains(" -> "))
        .count();
    (nodes, edges)
}

proptest! {
    #[test]
    fn dfa_accepts_is_total(definition in arbitrary_dfa(), input in input_string()) {
        let device = Device::build(&Definition::Dfa(definition)).unwrap();
        prop_assert!(device.accepts(&input).is_ok());
    }

    #[test]
    fn dfa_is_deterministic(definition in arbitrary_dfa(), input in input_string()) {
        let device = Device::build(&Definition::Dfa(definition)).unwrap();
        prop_assert_eq!(device.accepts(&input), device.accepts(&input));
    }

    #[test]
    fn dpda_never_errors_on_alphabet_input(definition in arbitrary_dpda(), input in input_string()) {
        let device = Device::build(&Definition::Dpda(definition)).unwrap();
        let first = device.evaluate(&input);
        prop_assert!(first.is_ok());
        prop_assert_eq!(first, device.evaluate(&input));
    }

    #[test]
    fn dfa_graph_counts(definition in arbitrary_dfa()) {
        let states = definition.states.len();
        let definition = Definition::Dfa(definition);
        let transitions = definition.transition_count();
        let device = Device::build(&definition).unwrap();

        let (nodes, edges) = count_dot(&render(&device));
        prop_assert_eq!(nodes, states);
        prop_assert_eq!(edges, transitions);
    }

    #[test]
    fn dpda_graph_counts(definition in arbitrary_dpda()) {
        let states = definition.states.len();
        let definition = Definition::Dpda(definition);
        let transitions = definition.transition_count();
        let device = Device::build(&definition).unwrap();

        let (nodes, edges) = count_dot(&render(&device));
        prop_assert_eq!(nodes, states);
        prop_assert_eq!(edges, transitions);
        prop_assert_eq!(edges, device.transition_count());
    }

    #[test]
    fn dtm_graph_counts(definition in arbitrary_dtm()) {
        let states = definition.states.len();
        let definition = Definition::Dtm(definition);
        let transitions = definition.transition_count();
        let device = Device::build(&definition).unwrap();

        let (nodes, edges) = count_dot(&render(&device));
        prop_assert_eq!(nodes, states);
        prop_assert_eq!(edges, transitions);
        prop_assert_eq!(edges, device.transition_count());
    }

    #[test]
    fn dtm_run_is_deterministic_and_bounded(ones in 0usize..40, bound in 0usize..60) {
        let definition: DtmDefinition = serde_json::from_str(include_str!("../samples/unary-increment.json")).unwrap();
        let device = Device::build(&Definition::Dtm(definition)).unwrap();
        let machine = match &device {
            Device::Dtm(machine) => machine,
            _ => unreachable!(),
        };

        let input = "1".repeat(ones);
        let first = machine.run_with_limit(&input, bound).unwrap();
        prop_assert_eq!(&first, &machine.run_with_limit(&input, bound).unwrap());
        prop_assert!(first.steps <= bound);

        if bound > ones {
            prop_assert_eq!(first.outcome, Outcome::Accept);
            prop_assert_eq!(first.final_tape, "1".repeat(ones + 1));
        } else {
            prop_assert_eq!(first.outcome, Outcome::StepLimitExceeded);
            prop_assert!(!first.halted);
        }
    }
}
