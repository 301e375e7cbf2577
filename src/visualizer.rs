use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

use crate::fa::FA;

// States that take part in the automaton. The unused slot of a one-based automaton is left out.
fn live_states<T: FA>(fa: &T) -> BTreeSet<usize> {
    let mut live = BTreeSet::new();
    live.insert(fa.get_start_state());
    live.extend(fa.get_acceptor_states().iter_ones());

    for state_idx in 0..=fa.get_num_states() {
        let transitions = fa.get_state_transitions(state_idx);
        if !transitions.is_empty() {
            live.insert(state_idx);
        }
        live.extend(transitions.iter().map(|(_, target)| *target));
    }
    live
}

fn node_label<T: FA>(fa: &T, state_idx: usize) -> String {
    let mut label = String::new();
    if state_idx == fa.get_start_state() {
        label.push_str("Start\n");
    }
    if fa.is_accepting(state_idx) {
        label.push_str("Accept\n");
    }
    let _ = write!(label, "State {}", state_idx);
    label
}

/// Build a graph of the automaton with one node per state and one edge per pair of connected
/// states. Parallel transitions share an edge whose label lists all their symbols.
pub fn generate_graph<T: FA>(fa: &T) -> DiGraph<String, String> {
    let mut graph: DiGraph<String, String> = DiGraph::new();

    let mut node_map: HashMap<usize, NodeIndex> = HashMap::new();
    let mut edge_map: HashMap<(NodeIndex, NodeIndex), EdgeIndex> = HashMap::new();

    for state_idx in live_states(fa) {
        let node = graph.add_node(node_label(fa, state_idx));
        node_map.insert(state_idx, node);
    }

    for state_idx in 0..=fa.get_num_states() {
        for (symbol, target) in fa.get_state_transitions(state_idx) {
            let (Some(&from), Some(&to)) = (node_map.get(&state_idx), node_map.get(&target))
            else {
                continue;
            };

            match edge_map.get(&(from, to)) {
                Some(&edge_idx) => {
                    if let Some(label) = graph.edge_weight_mut(edge_idx) {
                        let _ = write!(label, ", {}", symbol);
                    }
                }
                None => {
                    let edge_idx = graph.add_edge(from, to, symbol.to_string());
                    edge_map.insert((from, to), edge_idx);
                }
            }
        }
    }

    graph
}

/// Render the finite automaton provided in Graphviz DOT format
pub fn to_dot<T: FA>(fa: &T) -> String {
    let graph = generate_graph(fa);
    format!("{}", Dot::new(&graph))
}

#[cfg(test)]
mod visualizer_tests {
    use super::*;
    use crate::dfa::DFA;
    use crate::nfa::NFA;
    use crate::regex::RegEx;

    #[test]
    fn test_dfa_graph() {
        let dfa = DFA::from_spec("2\nab\n0 a 1\n0 b 0\n1 a 1\n1 b 0\n0\n1\n").unwrap();
        let graph = generate_graph(&dfa);

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 4);

        let labels: Vec<&String> = graph.node_weights().collect();
        assert_eq!(labels, vec!["Start\nState 0", "Accept\nState 1"]);
    }

    #[test]
    fn test_parallel_edges_are_merged() {
        // a over {a, b}: the reject state loops on both symbols
        let regex = RegEx::new(&['a', 'b'], "a").unwrap();
        let graph = generate_graph(regex.dfa());

        assert_eq!(graph.node_count(), 3);
        let labels: Vec<&String> = graph.edge_weights().collect();
        assert!(labels.contains(&&"a, b".to_string()), "{labels:?}");
    }

    #[test]
    fn test_epsilon_edges() {
        let nfa = NFA::from_spec("2\na\n1 e 2\n\n1\n2\n").unwrap();
        let dot = to_dot(&nfa);

        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("ε"));
        assert!(dot.contains("State 2"));
        assert!(!dot.contains("State 0"));
    }
}
