// src/dag/plan.rs

//! Sequential/parallel task composition.
//!
//! A plan is a tree of [`Step`]s. It is lowered into graph nodes and
//! "must complete before" edges, which [`BuildGraph`](crate::dag::BuildGraph)
//! then validates.

use crate::dag::graph::{TaskKind, TaskNode};
use crate::engine::TaskName;
use crate::types::AssetClass;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Task(TaskNode),
    /// Each child starts only after the previous one has succeeded.
    Series(Vec<Step>),
    /// All children start together; the group succeeds iff all succeed.
    Parallel(Vec<Step>),
}

/// Entry and exit points of a lowered sub-plan.
#[derive(Debug, Default)]
struct Endpoints {
    sources: Vec<TaskName>,
    sinks: Vec<TaskName>,
}

impl Step {
    pub fn task(kind: TaskKind) -> Self {
        Step::Task(TaskNode::new(kind))
    }

    /// All task nodes in the plan, in declaration order.
    pub fn nodes(&self) -> Vec<TaskNode> {
        let mut out = Vec::new();
        self.collect_nodes(&mut out);
        out
    }

    fn collect_nodes(&self, out: &mut Vec<TaskNode>) {
        match self {
            Step::Task(node) => out.push(node.clone()),
            Step::Series(steps) | Step::Parallel(steps) => {
                for step in steps {
                    step.collect_nodes(out);
                }
            }
        }
    }

    /// Lower the plan into nodes plus edges.
    pub fn lower(&self) -> (Vec<TaskNode>, Vec<(TaskName, TaskName)>) {
        let mut edges = Vec::new();
        self.lower_into(&mut edges);
        (self.nodes(), edges)
    }

    fn lower_into(&self, edges: &mut Vec<(TaskName, TaskName)>) -> Endpoints {
        match self {
            Step::Task(node) => Endpoints {
                sources: vec![node.name.clone()],
                sinks: vec![node.name.clone()],
            },
            Step::Series(steps) => {
                let mut result: Option<Endpoints> = None;
                for step in steps {
                    let next = step.lower_into(edges);
                    if next.sources.is_empty() {
                        continue;
                    }
                    result = Some(match result {
                        None => next,
                        Some(prev) => {
                            for sink in prev.sinks.iter() {
                                for source in next.sources.iter() {
                                    edges.push((sink.clone(), source.clone()));
                                }
                            }
                            Endpoints {
                                sources: prev.sources,
                                sinks: next.sinks,
                            }
                        }
                    });
                }
                result.unwrap_or_default()
            }
            Step::Parallel(steps) => {
                let mut out = Endpoints::default();
                for step in steps {
                    let child = step.lower_into(edges);
                    out.sources.extend(child.sources);
                    out.sinks.extend(child.sinks);
                }
                out
            }
        }
    }
}

/// The default top-level plan:
/// clean → markup → (styles ∥ scripts ∥ images) → watch.
///
/// With `with_watch == false` the trailing watch node is left out, which is
/// what `build --once` runs.
pub fn default_build_plan(with_watch: bool) -> Step {
    let mut steps = vec![
        Step::task(TaskKind::Clean),
        Step::task(TaskKind::Transform(AssetClass::Markup)),
        Step::Parallel(vec![
            Step::task(TaskKind::Transform(AssetClass::Styles)),
            Step::task(TaskKind::Transform(AssetClass::Scripts)),
            Step::task(TaskKind::Transform(AssetClass::Images)),
        ]),
    ];
    if with_watch {
        steps.push(Step::task(TaskKind::Watch));
    }
    Step::Series(steps)
}

/// Plan that runs exactly one task.
pub fn single_task_plan(kind: TaskKind) -> Step {
    Step::task(kind)
}
