//! Renders devices as Graphviz DOT.
//!
//! Output is deterministic: states and transitions are emitted in sorted order. Every
//! transition entry becomes its own edge, so parallel edges between the same pair of
//! states are never merged.

use std::collections::BTreeSet;

use crate::definition::Definition;
use crate::device::Device;
use crate::types::Limits;
use crate::validator::{validate, ValidationError};

/// Preferred name of the invisible node whose only edge points at the initial state.
pub const START_NODE: &str = "__start0";

/// One labelled edge of the transition graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: String,
}

/// Validates `definition` and renders it.
pub fn render_graph(definition: &Definition) -> Result<String, ValidationError> {
    let validated = validate(definition)?;
    Ok(render(&Device::from_validated(validated, Limits::default())))
}

/// Renders an already built device.
pub fn render(device: &Device) -> String {
    let mut out = header(device.states(), device.final_states(), device.initial_state());

    out.extend(edges(device).into_iter().map(|edge| {
        format!(
            "{} -> {} [label={}];",
            quote(&edge.from),
            quote(&edge.to),
            quote(&edge.label)
        )
    }));

    out.push("}".to_string());
    out.join("\n")
}

/// Lists one edge per transition entry, labelled the way each kind of device reads them:
/// `a` for DFAs, `a,Z/push` for DPDAs and `read/write,move` for DTMs.
pub fn edges(device: &Device) -> Vec<Edge> {
    let edge = |from: &str, to: &str, label: String| Edge {
        from: from.to_string(),
        to: to.to_string(),
        label,
    };

    match device {
        Device::Dfa(dfa) => dfa
            .transitions()
            .iter()
            .flat_map(|(from, row)| {
                row.iter()
                    .map(move |(symbol, to)| edge(from, to, symbol.to_string()))
            })
            .collect(),
        Device::Dpda(dpda) => dpda
            .transitions()
            .iter()
            .flat_map(|(from, row)| {
                row.iter().flat_map(move |(symbol, tops)| {
                    tops.iter().map(move |(top, mv)| {
                        let push: String = mv.push.iter().collect();
                        edge(from, &mv.next_state, format!("{},{}/{}", symbol, top, push))
                    })
                })
            })
            .collect(),
        Device::Dtm(dtm) => dtm
            .transitions()
            .iter()
            .flat_map(|(from, row)| {
                row.iter().map(move |(read, mv)| {
                    edge(
                        from,
                        &mv.next_state,
                        format!("{}/{},{}", read, mv.write, mv.direction.letter()),
                    )
                })
            })
            .collect(),
    }
}

fn header(
    states: &BTreeSet<String>,
    final_states: &BTreeSet<String>,
    initial_state: &str,
) -> Vec<String> {
    let mut out = vec![
        "digraph {".to_string(),
        "rankdir=LR;".to_string(),
        "node [shape=circle];".to_string(),
    ];

    for state in states {
        let shape = if final_states.contains(state) {
            "doublecircle"
        } else {
            "circle"
        };
        out.push(format!("{} [shape={}];", quote(state), shape));
    }

    let start = start_node(states);
    out.push(format!("{} [label=\"\", shape=none];", start));
    out.push(format!("{} -> {};", start, quote(initial_state)));
    out
}

/// Picks an entry node id that no declared state uses. DOT treats `x` and `"x"` as the same
/// node, so the id is padded with `_` until it is free.
fn start_node(states: &BTreeSet<String>) -> String {
    let mut id = START_NODE.to_string();
    while states.contains(&id) {
        id.push('_');
    }
    id
}

/// Quotes a DOT identifier, escaping embedded quotes and backslashes.
fn quote(id: &str) -> String {
    let mut quoted = String::with_capacity(id.len() + 2);
    quoted.push('"');
    for c in id.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
