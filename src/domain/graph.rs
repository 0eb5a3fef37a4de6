//! Dependency graph view over a set of ToDos
//!
//! Builds a petgraph `DiGraph` from the ID links stored on each task. Used to
//! validate freshly loaded documents (unknown IDs, cycles) and to produce a
//! topological order. The manager's own link sets stay the source of truth;
//! this graph is rebuilt on demand.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use super::error::TodoError;
use super::id::TodoId;
use super::todo::ToDo;

/// A dependency graph for tasks
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Edge direction is dependency -> dependent
    graph: DiGraph<TodoId, ()>,

    node_map: HashMap<TodoId, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a collection of tasks
    ///
    /// Fails with `CorruptData` if a task lists an unknown dependency and with
    /// `Cycle` if the listed edges are not acyclic.
    pub fn from_todos<'a>(todos: impl IntoIterator<Item = &'a ToDo>) -> Result<Self, TodoError> {
        let mut graph = Self::new();

        // First pass: add all nodes
        let todos: Vec<_> = todos.into_iter().collect();
        for todo in &todos {
            graph.add_task(todo.id().clone());
        }

        // Second pass: add all edges
        for todo in &todos {
            for dep_id in todo.dependencies() {
                graph.add_dependency(todo.id(), dep_id).map_err(|e| match e {
                    TodoError::NotFound(missing) => TodoError::corrupt(format!(
                        "task {} depends on unknown task {}",
                        todo.id(),
                        missing
                    )),
                    other => other,
                })?;
            }
        }

        Ok(graph)
    }

    pub fn add_task(&mut self, task_id: TodoId) {
        if !self.node_map.contains_key(&task_id) {
            let idx = self.graph.add_node(task_id.clone());
            self.node_map.insert(task_id, idx);
        }
    }

    /// Adds the edge `task` depends on `depends_on`, rejecting self-loops and cycles
    pub fn add_dependency(&mut self, task: &TodoId, depends_on: &TodoId) -> Result<(), TodoError> {
        let cycle = || TodoError::Cycle {
            task: task.clone(),
            depends_on: depends_on.clone(),
        };

        let task_idx = *self
            .node_map
            .get(task)
            .ok_or_else(|| TodoError::NotFound(task.clone()))?;
        let dep_idx = *self
            .node_map
            .get(depends_on)
            .ok_or_else(|| TodoError::NotFound(depends_on.clone()))?;

        if task_idx == dep_idx {
            return Err(cycle());
        }

        // A path task -> depends_on means depends_on already (transitively) depends on task
        if has_path_connecting(&self.graph, task_idx, dep_idx, None) {
            return Err(cycle());
        }

        self.graph.update_edge(dep_idx, task_idx, ());
        Ok(())
    }

    /// All tasks with every dependency before its dependents
    pub fn topological_order(&self) -> Result<Vec<TodoId>, TodoError> {
        toposort(&self.graph, None)
            .map(|order| {
                order
                    .into_iter()
                    .filter_map(|idx| self.graph.node_weight(idx).cloned())
                    .collect()
            })
            .map_err(|cycle| {
                let id = self.graph[cycle.node_id()].clone();
                TodoError::Cycle {
                    task: id.clone(),
                    depends_on: id,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_id(s: &str) -> TodoId {
        s.parse().unwrap()
    }

    fn graph_with(ids: &[&TodoId]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for id in ids {
            graph.add_task((*id).clone());
        }
        graph
    }

    #[test]
    fn empty_graph() {
        let graph = DependencyGraph::new();
        assert!(graph.topological_order().unwrap().is_empty());
    }

    #[test]
    fn add_dependency() {
        let id1 = make_id("t-1");
        let id2 = make_id("t-2");
        let mut graph = graph_with(&[&id1, &id2]);

        // id2 depends on id1
        graph.add_dependency(&id2, &id1).unwrap();

        assert_eq!(graph.graph.edge_count(), 1);
        assert_eq!(graph.topological_order().unwrap(), vec![id1, id2]);
    }

    #[test]
    fn repeated_edge_is_stored_once() {
        let id1 = make_id("t-1");
        let id2 = make_id("t-2");
        let mut graph = graph_with(&[&id1, &id2]);

        graph.add_dependency(&id2, &id1).unwrap();
        graph.add_dependency(&id2, &id1).unwrap();

        assert_eq!(graph.graph.edge_count(), 1);
    }

    #[test]
    fn cycle_detection() {
        let id1 = make_id("t-1");
        let id2 = make_id("t-2");
        let id3 = make_id("t-3");
        let mut graph = graph_with(&[&id1, &id2, &id3]);

        graph.add_dependency(&id2, &id1).unwrap();
        graph.add_dependency(&id3, &id2).unwrap();
        let result = graph.add_dependency(&id1, &id3);

        assert_eq!(
            result,
            Err(TodoError::Cycle {
                task: id1.clone(),
                depends_on: id3.clone()
            })
        );
        assert_eq!(graph.graph.edge_count(), 2);
    }

    #[test]
    fn self_dependency_rejected() {
        let id1 = make_id("t-1");
        let mut graph = graph_with(&[&id1]);

        let result = graph.add_dependency(&id1, &id1);
        assert!(matches!(result, Err(TodoError::Cycle { .. })));
    }

    #[test]
    fn unknown_task_returns_error() {
        let id1 = make_id("t-1");
        let id2 = make_id("t-2");
        let mut graph = graph_with(&[&id1]);

        let result = graph.add_dependency(&id1, &id2);
        assert_eq!(result, Err(TodoError::NotFound(id2)));
    }

    #[test]
    fn topological_order() {
        let id1 = make_id("t-1");
        let id2 = make_id("t-2");
        let id3 = make_id("t-3");
        let mut graph = graph_with(&[&id1, &id2, &id3]);

        // id1 depends on id2, id2 depends on id3
        graph.add_dependency(&id1, &id2).unwrap();
        graph.add_dependency(&id2, &id3).unwrap();

        let order = graph.topological_order().unwrap();
        let pos = |id: &TodoId| order.iter().position(|x| x == id).unwrap();

        assert!(pos(&id3) < pos(&id2));
        assert!(pos(&id2) < pos(&id1));
    }

    #[test]
    fn from_todos_reports_unknown_dependency_as_corrupt() {
        let mut task = ToDo::new("Orphan").unwrap();
        task.add_dependency(make_id("missing-id"));

        let result = DependencyGraph::from_todos([&task]);
        assert!(matches!(result, Err(TodoError::CorruptData(_))));
    }

    #[test]
    fn from_todos_rejects_cycles() {
        let mut a = ToDo::new("A").unwrap();
        let mut b = ToDo::new("B").unwrap();
        a.add_dependency(b.id().clone());
        b.add_dependency(a.id().clone());

        let result = DependencyGraph::from_todos([&a, &b]);
        assert!(matches!(result, Err(TodoError::Cycle { .. })));
    }

    #[test]
    fn performance_500_tasks() {
        use std::time::Instant;

        let ids: Vec<_> = (1..=500).map(|i| make_id(&format!("t-{}", i))).collect();
        let mut graph = DependencyGraph::new();
        for id in &ids {
            graph.add_task(id.clone());
        }

        let start = Instant::now();
        for i in 1..500 {
            graph.add_dependency(&ids[i], &ids[i - 1]).unwrap();
        }
        let order = graph.topological_order().unwrap();
        let duration = start.elapsed();

        assert_eq!(order.first(), Some(&ids[0]));
        assert!(duration.as_millis() < 1000, "Building chain took {:?}", duration);
    }
}
