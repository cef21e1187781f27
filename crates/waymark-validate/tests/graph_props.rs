use proptest::prelude::*;
use waymark_validate::{validate_ordering, DependencyGraph, GraphError, OrderSlot, OrderingIssue};

fn name(i: usize) -> String {
    format!("logic{i}")
}

/// Graph with edges only from lower to higher index, hence acyclic.
fn forward_graph(node_count: usize, edges: &[(usize, usize)]) -> DependencyGraph {
    let mut adjacency: Vec<Vec<String>> = vec![Vec::new(); node_count];
    for &(a, b) in edges {
        let (a, b) = (a % node_count, b % node_count);
        if a < b {
            adjacency[a].push(name(b));
        }
    }

    let mut graph = DependencyGraph::new();
    for (i, deps) in adjacency.into_iter().enumerate() {
        graph.add_node(name(i), deps);
    }
    graph
}

proptest! {
    #[test]
    fn prop_acyclic_graph_has_no_cycle_anywhere(
        node_count in 1..16usize,
        edges in proptest::collection::vec((0..16usize, 0..16usize), 0..40)
    ) {
        let graph = forward_graph(node_count, &edges);

        for i in 0..node_count {
            prop_assert!(!graph.has_cycle(&name(i)));
        }
        prop_assert!(graph.ensure_acyclic().is_ok());
        prop_assert!(graph.nodes_on_cycles().is_empty());
    }

    #[test]
    fn prop_back_edge_puts_whole_path_on_cycle(
        node_count in 2..16usize,
        path_len in 2..16usize,
        edges in proptest::collection::vec((0..16usize, 0..16usize), 0..40)
    ) {
        let path_len = path_len.min(node_count);
        let mut chain: Vec<(usize, usize)> = (0..path_len - 1).map(|i| (i, i + 1)).collect();
        chain.extend(edges);

        let mut graph = forward_graph(node_count, &chain);
        let last = path_len - 1;
        let mut deps = graph.dependencies(&name(last)).to_vec();
        deps.push(name(0));
        graph.add_node(name(last), deps);

        for i in 0..path_len {
            prop_assert!(graph.has_cycle(&name(i)), "{} should be on the cycle", name(i));
        }
        let on_cycles = graph.nodes_on_cycles();
        for i in 0..path_len {
            prop_assert!(on_cycles.contains(&name(i)));
        }
        let is_cycle_error = matches!(graph.ensure_acyclic(), Err(GraphError::CycleDetected { .. }));
        prop_assert!(is_cycle_error);
    }

    #[test]
    fn prop_topological_order_respects_every_edge(
        node_count in 1..16usize,
        edges in proptest::collection::vec((0..16usize, 0..16usize), 0..40)
    ) {
        let graph = forward_graph(node_count, &edges);
        let order = graph.topological_order().unwrap();
        prop_assert_eq!(order.len(), node_count);

        let position = |n: &str| order.iter().position(|o| o == n);
        for i in 0..node_count {
            for dep in graph.dependencies(&name(i)) {
                prop_assert!(position(dep) < position(&name(i)));
            }
        }
    }

    #[test]
    fn prop_contiguous_orders_are_clean(len in 1..30u32, rotate in 0..30usize) {
        let mut slots: Vec<OrderSlot> = (1..=len)
            .map(|o| OrderSlot::new(format!("step{o}"), Some(o)))
            .collect();
        let shift = rotate % slots.len();
        slots.rotate_left(shift);

        prop_assert!(validate_ordering("scope", &slots).is_clean());
    }

    #[test]
    fn prop_any_missing_order_short_circuits(
        orders in proptest::collection::vec(proptest::option::of(1..10u32), 1..20)
    ) {
        prop_assume!(orders.iter().any(Option::is_none));
        let slots: Vec<OrderSlot> = orders
            .iter()
            .enumerate()
            .map(|(i, o)| OrderSlot::new(format!("step{i}"), *o))
            .collect();

        let report = validate_ordering("scope", &slots);
        prop_assert_eq!(report.issues.len(), 1);
        let is_missing = matches!(report.issues[0], OrderingIssue::MissingOrder { .. });
        prop_assert!(is_missing);
    }
}
