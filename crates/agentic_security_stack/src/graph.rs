use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{Result, StackError};
use crate::resources::{
    AccessGrant, ComputeResource, DeploymentSync, ExecutionRole, OutputBinding, Resource,
    StorageResource,
};

/// The declared resources of one stack plus its output bindings.
///
/// A graph is only handed out by the builder after every reference has been
/// checked against the declared resources, so consumers never see dangling
/// references or partial graphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceGraph {
    stack_name: String,
    description: String,
    resources: Vec<Resource>,
    outputs: Vec<OutputBinding>,
}

impl ResourceGraph {
    pub(crate) fn new(stack_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            description: description.into(),
            resources: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub(crate) fn add_resource(&mut self, resource: Resource) -> Result<()> {
        if self.resource(resource.logical_id()).is_some() {
            return Err(StackError::NamingConflict {
                name: resource.logical_id().to_string(),
                scope: format!("stack {}", self.stack_name),
            });
        }
        tracing::debug!(
            logical_id = resource.logical_id(),
            resource_type = resource.resource_type(),
            "declared resource"
        );
        self.resources.push(resource);
        Ok(())
    }

    pub(crate) fn add_output(&mut self, output: OutputBinding) -> Result<()> {
        if self.outputs.iter().any(|existing| existing.name == output.name) {
            return Err(StackError::NamingConflict {
                name: output.name,
                scope: format!("outputs of stack {}", self.stack_name),
            });
        }
        self.outputs.push(output);
        Ok(())
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn outputs(&self) -> &[OutputBinding] {
        &self.outputs
    }

    pub fn resource(&self, logical_id: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|resource| resource.logical_id() == logical_id)
    }

    pub fn output(&self, name: &str) -> Option<&OutputBinding> {
        self.outputs.iter().find(|output| output.name == name)
    }

    pub fn role(&self) -> Option<&ExecutionRole> {
        self.resources.iter().find_map(|resource| match resource {
            Resource::Role(role) => Some(role),
            _ => None,
        })
    }

    pub fn storage(&self) -> Option<&StorageResource> {
        self.resources.iter().find_map(|resource| match resource {
            Resource::Storage(storage) => Some(storage),
            _ => None,
        })
    }

    pub fn compute(&self) -> Option<&ComputeResource> {
        self.resources.iter().find_map(|resource| match resource {
            Resource::Compute(compute) => Some(compute),
            _ => None,
        })
    }

    pub fn sync(&self) -> Option<&DeploymentSync> {
        self.resources.iter().find_map(|resource| match resource {
            Resource::Sync(sync) => Some(sync),
            _ => None,
        })
    }

    pub fn grant(&self) -> Option<&AccessGrant> {
        self.resources.iter().find_map(|resource| match resource {
            Resource::Grant(grant) => Some(grant),
            _ => None,
        })
    }

    /// Dependency edges as `(dependency, dependent)` pairs.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.resources
            .iter()
            .flat_map(|resource| {
                resource
                    .dependencies()
                    .into_iter()
                    .map(move |dependency| (dependency, resource.logical_id()))
            })
            .collect()
    }

    /// Every resource and output reference must name a declared resource.
    pub(crate) fn validate_references(&self) -> Result<()> {
        let declared: BTreeSet<&str> = self.resources.iter().map(Resource::logical_id).collect();

        for (dependency, dependent) in self.edges() {
            if !declared.contains(dependency) {
                return Err(StackError::validation(format!(
                    "resource '{dependent}' references undeclared resource '{dependency}'"
                )));
            }
        }
        for output in &self.outputs {
            for target in output.value.referenced_resources() {
                if !declared.contains(target) {
                    return Err(StackError::validation(format!(
                        "output '{}' references undeclared resource '{target}'",
                        output.name
                    )));
                }
            }
        }
        Ok(())
    }

    /// Logical IDs with every dependency ahead of its dependents. Ties are
    /// broken by declaration order so the result is stable across runs.
    pub fn deployment_order(&self) -> Result<Vec<&str>> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
        for resource in &self.resources {
            let id = resource.logical_id();
            nodes.insert(id, graph.add_node(id));
        }
        for (dependency, dependent) in self.edges() {
            if let (Some(&from), Some(&to)) = (nodes.get(dependency), nodes.get(dependent)) {
                graph.update_edge(from, to, ());
            }
        }

        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|idx| graph.neighbors_directed(idx, Direction::Incoming).count())
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(idx, _)| Reverse(idx))
            .collect();

        let mut order = Vec::with_capacity(graph.node_count());
        while let Some(Reverse(idx)) = ready.pop() {
            let node = NodeIndex::new(idx);
            order.push(graph[node]);
            for next in graph.neighbors_directed(node, Direction::Outgoing) {
                let degree = &mut in_degree[next.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse(next.index()));
                }
            }
        }

        if order.len() != graph.node_count() {
            return Err(StackError::validation(format!(
                "dependency cycle detected in stack {}",
                self.stack_name
            )));
        }
        Ok(order)
    }
}
