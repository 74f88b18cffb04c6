// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::plan::Step;
use crate::engine::TaskName;
use crate::errors::{PipelineError, Result};
use crate::types::AssetClass;

/// What a graph node does when it is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Empty the destination tree.
    Clean,
    /// Run the transform chain for one asset class.
    Transform(AssetClass),
    /// Start the watch session. Never completes.
    Watch,
}

impl TaskKind {
    /// Name used when a plan does not give one explicitly.
    pub fn default_name(&self) -> TaskName {
        match self {
            TaskKind::Clean => "clean".to_string(),
            TaskKind::Transform(class) => class.as_str().to_string(),
            TaskKind::Watch => "watch".to_string(),
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Clean => f.write_str("clean"),
            TaskKind::Transform(class) => write!(f, "transform({class})"),
            TaskKind::Watch => f.write_str("watch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNode {
    pub name: TaskName,
    pub kind: TaskKind,
}

impl TaskNode {
    pub fn new(kind: TaskKind) -> Self {
        Self {
            name: kind.default_name(),
            kind,
        }
    }

    pub fn named(name: impl Into<TaskName>, kind: TaskKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Internal node structure: the task plus immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagNode {
    node: TaskNode,
    /// Direct dependencies: tasks that must complete before this one can run.
    deps: Vec<TaskName>,
    /// Direct dependents: tasks that depend on this one.
    dependents: Vec<TaskName>,
}

/// Validated DAG of build tasks keyed by task name.
///
/// An edge `(a, b)` means "`a` must complete before `b` starts".
#[derive(Debug, Clone)]
pub struct BuildGraph {
    nodes: BTreeMap<TaskName, DagNode>,
}

impl BuildGraph {
    /// Build and validate a graph.
    ///
    /// Fails on duplicate node names, edges naming unknown nodes, self edges,
    /// and cycles.
    pub fn new(tasks: Vec<TaskNode>, edges: Vec<(TaskName, TaskName)>) -> Result<Self> {
        let mut nodes: BTreeMap<TaskName, DagNode> = BTreeMap::new();

        for node in tasks {
            if nodes.contains_key(&node.name) {
                return Err(PipelineError::ConfigError(format!(
                    "duplicate task '{}' in build graph",
                    node.name
                )));
            }
            nodes.insert(
                node.name.clone(),
                DagNode {
                    node,
                    deps: Vec::new(),
                    dependents: Vec::new(),
                },
            );
        }

        let mut seen: BTreeSet<(TaskName, TaskName)> = BTreeSet::new();
        for (from, to) in edges {
            for endpoint in [&from, &to] {
                if !nodes.contains_key(endpoint) {
                    return Err(PipelineError::TaskNotFound(endpoint.clone()));
                }
            }
            if from == to {
                return Err(PipelineError::DagCycle(format!(
                    "task '{from}' cannot depend on itself"
                )));
            }
            if !seen.insert((from.clone(), to.clone())) {
                continue;
            }
            if let Some(n) = nodes.get_mut(&to) {
                n.deps.push(from.clone());
            }
            if let Some(n) = nodes.get_mut(&from) {
                n.dependents.push(to);
            }
        }

        let graph = Self { nodes };
        graph.check_acyclic()?;
        Ok(graph)
    }

    /// Lower a composition plan into a validated graph.
    pub fn from_plan(plan: &Step) -> Result<Self> {
        let (tasks, edges) = plan.lower();
        Self::new(tasks, edges)
    }

    fn check_acyclic(&self) -> Result<()> {
        // Edge direction: dep -> task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (name, node) in self.nodes.iter() {
            for dep in node.deps.iter() {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(PipelineError::DagCycle(format!(
                "cycle detected in build graph involving task '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Return all task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn node(&self, name: &str) -> Option<&TaskNode> {
        self.nodes.get(name).map(|n| &n.node)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Immediate dependencies of a task.
    pub fn dependencies_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Tasks with no dependencies.
    pub fn roots(&self) -> Vec<TaskName> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.deps.is_empty())
            .map(|(name, _)| name.clone())
            .collect()
    }
}
