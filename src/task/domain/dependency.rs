//! Dependency edges and acyclicity checks.
//!
//! An edge `dependent → dependency` means the dependent task cannot be
//! considered complete until the dependency is resolved. The relation must
//! stay acyclic; diamonds (two paths to the same task) are legal.
//!
//! Cycle detection is a depth-first search from the prospective dependency
//! looking for the dependent. It is exposed three ways:
//!
//! - [`CycleSearch`], a resumable traversal that asks its driver for the
//!   outgoing edges of one task at a time, so async callers can fetch edges
//!   from storage between steps;
//! - [`would_create_cycle`], which drives a [`CycleSearch`] with a
//!   synchronous lookup function;
//! - [`DependencyGraph`], a `petgraph` graph built from loaded records for
//!   whole-graph queries such as topological ordering.

use super::{TaskDomainError, TaskId, TaskRecord};
use petgraph::{
    Direction,
    algo::{has_path_connecting, toposort},
    graph::{DiGraph, NodeIndex},
    visit::{Dfs, Reversed},
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Caller-defined classification of a dependency edge.
///
/// The kind has no effect on cycle detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// The dependency blocks completion of the dependent.
    #[default]
    Blocks,
    /// Informational link.
    RelatesTo,
    /// The dependent duplicates the dependency.
    Duplicates,
}

impl DependencyKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::RelatesTo => "relates_to",
            Self::Duplicates => "duplicates",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outgoing dependency edge stored on the dependent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskDependency {
    /// Task depended upon.
    pub task: TaskId,
    /// Edge classification.
    pub kind: DependencyKind,
}

impl TaskDependency {
    /// Creates an edge to `task`.
    #[must_use]
    pub const fn new(task: TaskId, kind: DependencyKind) -> Self {
        Self { task, kind }
    }
}

/// Outcome of a single [`CycleSearch::next_step`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStep {
    /// The dependent is reachable: the edge would close a cycle.
    Found,
    /// Every reachable task has been visited without meeting the dependent.
    Exhausted,
    /// The driver must supply the outgoing edges of this task through
    /// [`CycleSearch::expand`].
    Expand(TaskId),
}

/// Resumable depth-first search deciding whether `dependent → dependency`
/// would close a cycle.
///
/// Each task is expanded at most once, so the search terminates even on
/// graphs with shared subgraphs.
#[derive(Debug, Clone)]
pub struct CycleSearch {
    dependent: TaskId,
    stack: Vec<TaskId>,
    visited: HashSet<TaskId>,
    found: bool,
}

impl CycleSearch {
    /// Starts a search for the edge `dependent → dependency`.
    #[must_use]
    pub fn new(dependent: TaskId, dependency: TaskId) -> Self {
        Self {
            dependent,
            stack: vec![dependency],
            visited: HashSet::new(),
            found: dependent == dependency,
        }
    }

    /// Advances the search to its next decision point.
    pub fn next_step(&mut self) -> SearchStep {
        if self.found {
            return SearchStep::Found;
        }
        while let Some(current) = self.stack.pop() {
            if current == self.dependent {
                self.found = true;
                return SearchStep::Found;
            }
            if self.visited.insert(current) {
                return SearchStep::Expand(current);
            }
        }
        SearchStep::Exhausted
    }

    /// Feeds the outgoing edges of the task last returned by
    /// [`SearchStep::Expand`].
    pub fn expand(&mut self, dependencies: impl IntoIterator<Item = TaskId>) {
        self.stack.extend(
            dependencies
                .into_iter()
                .filter(|dependency| !self.visited.contains(dependency)),
        );
    }

    /// Returns how many tasks have been expanded so far.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Returns `true` when adding `dependent → dependency` would create a cycle.
///
/// `lookup` returns the outgoing dependency targets of a task. Its errors
/// (for example a dangling edge to a deleted task) are propagated rather
/// than skipped.
///
/// # Errors
///
/// Returns the first error produced by `lookup`.
pub fn would_create_cycle<F, E>(
    dependent: TaskId,
    dependency: TaskId,
    mut lookup: F,
) -> Result<bool, E>
where
    F: FnMut(TaskId) -> Result<Vec<TaskId>, E>,
{
    let mut search = CycleSearch::new(dependent, dependency);
    loop {
        match search.next_step() {
            SearchStep::Found => return Ok(true),
            SearchStep::Exhausted => return Ok(false),
            SearchStep::Expand(task) => {
                let edges = lookup(task)?;
                search.expand(edges);
            }
        }
    }
}

/// In-memory dependency graph over task nodes.
///
/// Graph edges point from a dependency to its dependent, so a topological
/// sort yields dependencies first. Edges are checked on insertion and the
/// graph is acyclic at all times.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<TaskId, DependencyKind>,
    index: HashMap<TaskId, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from `(task, dependency targets)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::SelfDependency`] or
    /// [`TaskDomainError::DependencyCycle`] when the input is not acyclic.
    pub fn from_edges<I, D>(entries: I) -> Result<Self, TaskDomainError>
    where
        I: IntoIterator<Item = (TaskId, D)>,
        D: IntoIterator<Item = TaskId>,
    {
        let mut graph = Self::new();
        for (task, dependencies) in entries {
            graph.add_task(task);
            for dependency in dependencies {
                graph.add_edge(task, dependency, DependencyKind::Blocks)?;
            }
        }
        Ok(graph)
    }

    /// Builds a graph from stored task records, keeping edge kinds.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::DependencyCycle`] when the stored edges
    /// are not acyclic.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a TaskRecord>,
    ) -> Result<Self, TaskDomainError> {
        let mut graph = Self::new();
        for record in records {
            graph.add_task(record.id());
            for edge in record.dependencies() {
                graph.add_edge(record.id(), edge.task, edge.kind)?;
            }
        }
        Ok(graph)
    }

    /// Inserts `task` as a node if absent.
    pub fn add_task(&mut self, task: TaskId) -> NodeIndex {
        *self
            .index
            .entry(task)
            .or_insert_with(|| self.graph.add_node(task))
    }

    /// Returns `true` when `task` is a node of the graph.
    #[must_use]
    pub fn contains(&self, task: TaskId) -> bool {
        self.index.contains_key(&task)
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns `true` when the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns `true` when adding `dependent → dependency` would create a
    /// cycle.
    #[must_use]
    pub fn would_create_cycle(&self, dependent: TaskId, dependency: TaskId) -> bool {
        if dependent == dependency {
            return true;
        }
        match (self.index.get(&dependent), self.index.get(&dependency)) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }

    /// Adds `dependent → dependency`, inserting missing nodes.
    ///
    /// Adding an edge that already exists is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::SelfDependency`] for a self edge or
    /// [`TaskDomainError::DependencyCycle`] when the edge would close a cycle.
    pub fn add_edge(
        &mut self,
        dependent: TaskId,
        dependency: TaskId,
        kind: DependencyKind,
    ) -> Result<(), TaskDomainError> {
        if dependent == dependency {
            return Err(TaskDomainError::SelfDependency(dependent));
        }
        if self.would_create_cycle(dependent, dependency) {
            return Err(TaskDomainError::DependencyCycle {
                dependent,
                dependency,
            });
        }
        let from = self.add_task(dependency);
        let to = self.add_task(dependent);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, kind);
        }
        Ok(())
    }

    /// Removes `dependent → dependency` if present.
    pub fn remove_edge(&mut self, dependent: TaskId, dependency: TaskId) {
        let (Some(&from), Some(&to)) = (self.index.get(&dependency), self.index.get(&dependent))
        else {
            return;
        };
        if let Some(edge) = self.graph.find_edge(from, to) {
            self.graph.remove_edge(edge);
        }
    }

    /// Returns the direct dependencies of `task`.
    #[must_use]
    pub fn dependencies_of(&self, task: TaskId) -> Vec<TaskId> {
        self.neighbours(task, Direction::Incoming)
    }

    /// Returns the tasks that directly depend on `task`.
    #[must_use]
    pub fn dependents_of(&self, task: TaskId) -> Vec<TaskId> {
        self.neighbours(task, Direction::Outgoing)
    }

    /// Returns the kind of the edge `dependent → dependency`, if present.
    #[must_use]
    pub fn edge_kind(&self, dependent: TaskId, dependency: TaskId) -> Option<DependencyKind> {
        let from = *self.index.get(&dependency)?;
        let to = *self.index.get(&dependent)?;
        let edge = self.graph.find_edge(from, to)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Returns every task reachable from `task` through dependency edges,
    /// each at most once and excluding `task` itself.
    #[must_use]
    pub fn transitive_dependencies(&self, task: TaskId) -> Vec<TaskId> {
        let Some(&start) = self.index.get(&task) else {
            return Vec::new();
        };
        let reversed = Reversed(&self.graph);
        let mut dfs = Dfs::new(reversed, start);
        let mut reached = Vec::new();
        while let Some(node) = dfs.next(reversed) {
            if node != start {
                reached.extend(self.graph.node_weight(node).copied());
            }
        }
        reached
    }

    /// Returns all tasks ordered so every dependency precedes its
    /// dependents.
    #[must_use]
    pub fn topological_order(&self) -> Vec<TaskId> {
        // Insertion rejects cycles, so the sort cannot fail.
        toposort(&self.graph, None)
            .map(|nodes| {
                nodes
                    .into_iter()
                    .filter_map(|node| self.graph.node_weight(node).copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn neighbours(&self, task: TaskId, direction: Direction) -> Vec<TaskId> {
        self.index.get(&task).map_or_else(Vec::new, |&node| {
            self.graph
                .neighbors_directed(node, direction)
                .filter_map(|neighbour| self.graph.node_weight(neighbour).copied())
                .collect()
        })
    }
}
