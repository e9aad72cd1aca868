use log::error;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;

/// An edge `from -> to` that closes a dependency cycle. Both ends lie on the cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
#[error("dependency cycle: `{from}` -> `{to}`")]
pub struct CycleError {
    pub from: String,
    pub to: String,
}

/// Reference graph, name -> names it calls.
pub type DependencyGraph = BTreeMap<String, BTreeSet<String>>;

/// Depth-first search over every node of `graph`.
///
/// Only edges between known nodes are followed. Errors accumulate so that the
/// whole graph is checked in one pass.
pub fn detect_cycles(graph: &DependencyGraph) -> Vec<CycleError> {
    let mut search = CycleSearch {
        graph,
        visited: HashSet::new(),
        stack: HashSet::new(),
        errors: vec![],
    };

    for name in graph.keys() {
        if !search.visited.contains(name.as_str()) {
            search.visit(name);
        }
    }

    for err in &search.errors {
        error!("{}", err);
    }

    search.errors
}

struct CycleSearch<'g> {
    graph: &'g DependencyGraph,
    visited: HashSet<&'g str>,
    // names on the current DFS path
    stack: HashSet<&'g str>,
    errors: Vec<CycleError>,
}

impl<'g> CycleSearch<'g> {
    fn visit(&mut self, name: &'g str) {
        let graph = self.graph;

        self.visited.insert(name);
        self.stack.insert(name);

        if let Some(dependencies) = graph.get(name) {
            for dependency in dependencies {
                let dependency = dependency.as_str();

                if !graph.contains_key(dependency) {
                    continue;
                }

                if self.stack.contains(dependency) {
                    self.errors.push(CycleError {
                        from: name.to_string(),
                        to: dependency.to_string(),
                    });
                } else if !self.visited.contains(dependency) {
                    self.visit(dependency);
                }
            }
        }

        self.stack.remove(name);
    }
}
