//! Cycle detection and topological ordering over entity edges.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::Edge;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnStack,
    Done,
}

fn adjacency<'a>(edges: &'a [Edge]) -> BTreeMap<&'a str, Vec<&'a str>> {
    let mut adj: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for edge in edges {
        adj.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
    }
    adj
}

/// Find cycles with an iterative depth-first search from every unvisited node.
///
/// One cycle is recorded per back-edge, as the stack path from the revisited
/// node to the node that closes the loop. An empty result means the graph is
/// acyclic.
pub fn detect_cycles<'a>(
    nodes: impl IntoIterator<Item = &'a str>,
    edges: &'a [Edge],
) -> Vec<Vec<String>> {
    let adj = adjacency(edges);
    let mut state: HashMap<&str, Visit> = HashMap::new();
    let mut cycles = Vec::new();

    for start in nodes {
        if state.contains_key(start) {
            continue;
        }
        state.insert(start, Visit::OnStack);
        let mut stack: Vec<(&str, usize)> = vec![(start, 0)];

        while let Some(&(node, next_idx)) = stack.last() {
            let next = adj.get(node).and_then(|n| n.get(next_idx)).copied();
            let Some(next) = next else {
                state.insert(node, Visit::Done);
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            match state.get(next) {
                Some(Visit::OnStack) => {
                    if let Some(pos) = stack.iter().position(|(n, _)| *n == next) {
                        cycles.push(stack[pos..].iter().map(|(n, _)| n.to_string()).collect());
                    }
                }
                Some(Visit::Done) => {}
                None => {
                    state.insert(next, Visit::OnStack);
                    stack.push((next, 0));
                }
            }
        }
    }

    cycles
}

/// Kahn's algorithm, taking ready nodes in name order. `None` if cyclic.
pub fn topological_order<'a>(
    nodes: impl IntoIterator<Item = &'a str>,
    edges: &'a [Edge],
) -> Option<Vec<String>> {
    let mut in_degree: BTreeMap<&str, usize> = nodes.into_iter().map(|n| (n, 0)).collect();
    for edge in edges {
        in_degree.entry(edge.from.as_str()).or_insert(0);
        *in_degree.entry(edge.to.as_str()).or_insert(0) += 1;
    }
    let adj = adjacency(edges);

    let mut ready: BTreeSet<&str> = in_degree
        .iter()
        .filter(|(_, d)| **d == 0)
        .map(|(n, _)| *n)
        .collect();
    let mut order = Vec::with_capacity(in_degree.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.to_string());
        for next in adj.get(node).map(Vec::as_slice).unwrap_or_default() {
            if let Some(d) = in_degree.get_mut(next) {
                *d -= 1;
                if *d == 0 {
                    ready.insert(*next);
                }
            }
        }
    }

    (order.len() == in_degree.len()).then_some(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Relationship;

    fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs
            .iter()
            .map(|(from, to)| Edge {
                from: from.to_string(),
                to: to.to_string(),
                relationship: Relationship::Uses,
            })
            .collect()
    }

    #[test]
    fn acyclic_graph_has_order() {
        let e = edges(&[("a", "b"), ("b", "c"), ("a", "c")]);
        assert!(detect_cycles(["a", "b", "c"], &e).is_empty());
        assert_eq!(
            topological_order(["a", "b", "c"], &e),
            Some(vec!["a".into(), "b".into(), "c".into()])
        );
    }

    #[test]
    fn back_edge_reported_as_cycle() {
        let e = edges(&[("a", "b"), ("b", "c"), ("c", "a"), ("c", "d")]);
        let cycles = detect_cycles(["a", "b", "c", "d"], &e);
        assert_eq!(cycles, vec![vec!["a".to_string(), "b".into(), "c".into()]]);
        assert_eq!(topological_order(["a", "b", "c", "d"], &e), None);
    }

    #[test]
    fn each_back_edge_counted_once() {
        let e = edges(&[("a", "b"), ("b", "a"), ("b", "c"), ("c", "b")]);
        let cycles = detect_cycles(["a", "b", "c"], &e);
        assert_eq!(cycles.len(), 2);
        assert_eq!(cycles[1], vec!["b".to_string(), "c".into()]);
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let names: Vec<String> = (0..20_000).map(|i| format!("n{i:05}")).collect();
        let e: Vec<Edge> = names
            .windows(2)
            .map(|w| Edge {
                from: w[0].clone(),
                to: w[1].clone(),
                relationship: Relationship::Uses,
            })
            .collect();
        assert!(detect_cycles(names.iter().map(String::as_str), &e).is_empty());
    }
}
