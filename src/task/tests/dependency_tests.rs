//! Tests for cycle detection and the dependency graph.

use crate::task::domain::{
    CycleSearch, DependencyGraph, DependencyKind, SearchStep, TaskDomainError, TaskId,
    would_create_cycle,
};
use rstest::rstest;
use std::collections::{HashMap, HashSet};

const BLOCKS: DependencyKind = DependencyKind::Blocks;

type Edges = HashMap<TaskId, Vec<TaskId>>;

fn lookup(edges: &Edges) -> impl FnMut(TaskId) -> Result<Vec<TaskId>, TaskId> + '_ {
    |task| edges.get(&task).cloned().ok_or(task)
}

fn ids<const N: usize>() -> [TaskId; N] {
    std::array::from_fn(|_| TaskId::new())
}

#[rstest]
fn self_edge_is_a_cycle_without_lookup() {
    let [a] = ids();
    let result: Result<bool, TaskId> =
        would_create_cycle(a, a, |_| panic!("lookup must not run for a self edge"));
    assert_eq!(result, Ok(true));
}

#[rstest]
fn chain_closing_edge_is_detected() {
    let [a, b, c] = ids();
    let edges = Edges::from([(a, vec![b]), (b, vec![c]), (c, vec![])]);

    assert_eq!(would_create_cycle(c, a, lookup(&edges)), Ok(true));
    assert_eq!(would_create_cycle(a, c, lookup(&edges)), Ok(false));
}

#[rstest]
fn diamond_is_legal_and_each_node_visited_once() {
    let [top, left, right, bottom] = ids();
    let edges = Edges::from([
        (top, vec![left, right]),
        (left, vec![bottom]),
        (right, vec![bottom]),
        (bottom, vec![]),
    ]);

    let mut calls = 0;
    let result = would_create_cycle(TaskId::new(), top, |task| {
        calls += 1;
        lookup(&edges)(task)
    });

    assert_eq!(result, Ok(false));
    assert_eq!(calls, 4);
}

#[rstest]
fn lookup_failure_is_propagated() {
    let [a, b, missing] = ids();
    let edges = Edges::from([(a, vec![]), (b, vec![missing])]);

    assert_eq!(would_create_cycle(a, b, lookup(&edges)), Err(missing));
}

#[rstest]
fn cycle_search_is_driven_step_by_step() {
    let [a, b, c] = ids();
    let mut search = CycleSearch::new(a, b);

    assert_eq!(search.next_step(), SearchStep::Expand(b));
    search.expand([c]);
    assert_eq!(search.next_step(), SearchStep::Expand(c));
    search.expand([a]);
    assert_eq!(search.next_step(), SearchStep::Found);
    assert_eq!(search.visited_count(), 2);
}

fn set(tasks: impl IntoIterator<Item = TaskId>) -> HashSet<TaskId> {
    tasks.into_iter().collect()
}

#[rstest]
fn graph_rejects_the_edge_closing_a_chain() {
    let [a, b, c] = ids();
    let mut graph = DependencyGraph::new();

    graph.add_edge(a, b, BLOCKS).expect("a depends on b");
    graph.add_edge(b, c, BLOCKS).expect("b depends on c");

    assert_eq!(
        graph.add_edge(c, a, BLOCKS),
        Err(TaskDomainError::DependencyCycle {
            dependent: c,
            dependency: a,
        })
    );
    assert!(graph.dependencies_of(c).is_empty());
}

#[rstest]
fn graph_rejects_self_edges() {
    let [a] = ids();
    let mut graph = DependencyGraph::new();
    assert_eq!(
        graph.add_edge(a, a, BLOCKS),
        Err(TaskDomainError::SelfDependency(a))
    );
    assert!(graph.is_empty());
}

#[rstest]
fn graph_tracks_both_directions() {
    let [a, b, c] = ids();
    let mut graph = DependencyGraph::from_edges([(a, vec![b, c]), (b, vec![c])])
        .expect("acyclic input");

    assert_eq!(graph.len(), 3);
    assert_eq!(set(graph.dependencies_of(a)), set([b, c]));
    assert_eq!(set(graph.dependents_of(c)), set([a, b]));

    graph
        .add_edge(a, b, DependencyKind::RelatesTo)
        .expect("duplicate edge is a no-op");
    assert_eq!(graph.dependencies_of(a).len(), 2);
    assert_eq!(graph.edge_kind(a, b), Some(BLOCKS));

    graph.remove_edge(a, c);
    assert_eq!(graph.dependencies_of(a), vec![b]);
    assert_eq!(graph.dependents_of(c), vec![b]);
    assert_eq!(graph.edge_kind(a, c), None);
    assert!(graph.would_create_cycle(c, a));
    assert!(!graph.would_create_cycle(a, TaskId::new()));
}

#[rstest]
fn transitive_dependencies_visit_shared_tasks_once() {
    let [a, b, c, d] = ids();
    let graph = DependencyGraph::from_edges([(a, vec![b, d]), (b, vec![c]), (d, vec![c])])
        .expect("acyclic input");

    let reached = graph.transitive_dependencies(a);

    assert_eq!(reached.len(), 3);
    assert_eq!(set(reached), set([b, c, d]));
    assert_eq!(graph.transitive_dependencies(c), Vec::<TaskId>::new());
    assert!(graph.transitive_dependencies(TaskId::new()).is_empty());
}

#[rstest]
fn topological_order_puts_dependencies_first() {
    let [a, b, c, d] = ids();
    let graph = DependencyGraph::from_edges([(a, vec![b, c]), (b, vec![d]), (c, vec![d])])
        .expect("acyclic input");

    let order = graph.topological_order();
    let position = |task: TaskId| order.iter().position(|id| *id == task);

    assert_eq!(order.len(), 4);
    assert!(position(d) < position(b));
    assert!(position(d) < position(c));
    assert!(position(b) < position(a));
    assert!(position(c) < position(a));
}

#[rstest]
fn accepted_edges_never_form_a_cycle() {
    let tasks: [TaskId; 6] = ids();
    let mut graph = DependencyGraph::new();
    let mut rejected = 0;
    for from in tasks {
        for to in tasks {
            if graph.add_edge(from, to, BLOCKS).is_err() {
                rejected += 1;
            }
        }
    }

    // Self edges plus the reverse of every accepted pair.
    assert_eq!(rejected, 6 + 15);
    assert_eq!(graph.topological_order().len(), tasks.len());
}
