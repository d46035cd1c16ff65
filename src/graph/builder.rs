use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use crate::analyzer::extract_dependencies;
use crate::dependency::{Dependency, Dependent};
use crate::survey::{BindingError, Component, InstructionKind};

/// Dependency map and its inverse, the impact map.
///
/// Edges are keyed by the same `code` strings as the tree; the tree itself holds no graph
/// edges. Dependencies keep the order in which they first appear in the expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyGraph {
    dependency_map: BTreeMap<Dependent, Vec<Dependency>>,
    impact_map: BTreeMap<Dependency, BTreeSet<Dependent>>,
    targets: BTreeMap<Dependent, Dependency>,
    producers: BTreeMap<Dependency, Dependent>,
}

/// Result of [`DependencyGraph::build`]: the graph plus errors for instructions that do not parse.
#[derive(Debug, Clone, Default)]
pub struct GraphBuild {
    pub graph: DependencyGraph,
    pub errors: Vec<(Dependent, BindingError)>,
}

impl GraphBuild {
    /// Attach the collected errors to their instructions.
    pub fn attach_errors(&self, tree: &mut Component) {
        for (dependent, error) in &self.errors {
            let instruction = tree
                .find_mut(&dependent.component_code)
                .and_then(|component| {
                    component
                        .instructions
                        .iter_mut()
                        .find(|i| i.code == dependent.instruction_code)
                });
            if let Some(instruction) = instruction {
                instruction.add_error(error.clone());
            }
        }
    }
}

impl DependencyGraph {
    /// Scan every instruction in document order. Does not touch the tree; an instruction that
    /// does not parse is registered with no dependencies and reported in [`GraphBuild::errors`].
    pub fn build(tree: &Component) -> GraphBuild {
        let mut graph = DependencyGraph::default();
        let mut errors = Vec::new();

        for component in tree.walk() {
            for instruction in &component.instructions {
                let dependent = instruction.dependent(&component.code);
                if graph.dependency_map.contains_key(&dependent) {
                    // duplicate identity, flagged structurally; first one wins
                    continue;
                }

                let dependencies = if !instruction.is_active {
                    Vec::new()
                } else {
                    match &instruction.kind {
                        InstructionKind::SimpleState { text, .. } => {
                            match extract_dependencies(text) {
                                Ok(dependencies) => dependencies,
                                Err(e) => {
                                    debug!("instruction {} does not parse: {}", dependent, e);
                                    errors.push((dependent.clone(), BindingError::syntax_error(e.to_string())));
                                    Vec::new()
                                }
                            }
                        }
                        InstructionKind::Reference { references, .. } => {
                            let mut dependencies = Vec::new();
                            for reference in references {
                                match reference.parse::<Dependency>() {
                                    Ok(dependency) if !dependencies.contains(&dependency) => {
                                        dependencies.push(dependency)
                                    }
                                    Ok(_) => {}
                                    Err(e) => errors.push((
                                        dependent.clone(),
                                        BindingError::syntax_error(e.to_string()),
                                    )),
                                }
                            }
                            dependencies
                        }
                    }
                };

                graph.insert(dependent, instruction.produces(&component.code), dependencies);
            }
        }

        GraphBuild { graph, errors }
    }

    fn insert(&mut self, dependent: Dependent, target: Dependency, dependencies: Vec<Dependency>) {
        for dependency in &dependencies {
            self.impact_map
                .entry(dependency.clone())
                .or_default()
                .insert(dependent.clone());
        }
        self.producers
            .entry(target.clone())
            .or_insert_with(|| dependent.clone());
        self.targets.insert(dependent.clone(), target);
        self.dependency_map.insert(dependent, dependencies);
    }

    pub fn dependency_map(&self) -> &BTreeMap<Dependent, Vec<Dependency>> {
        &self.dependency_map
    }

    pub fn impact_map(&self) -> &BTreeMap<Dependency, BTreeSet<Dependent>> {
        &self.impact_map
    }

    pub fn dependencies_of(&self, dependent: &Dependent) -> &[Dependency] {
        self.dependency_map
            .get(dependent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn impacted_by(&self, dependency: &Dependency) -> impl Iterator<Item = &Dependent> {
        self.impact_map.get(dependency).into_iter().flatten()
    }

    /// Slot written by `dependent`.
    pub fn target_of(&self, dependent: &Dependent) -> Option<&Dependency> {
        self.targets.get(dependent)
    }

    /// First instruction declaring `dependency`.
    pub fn producer_of(&self, dependency: &Dependency) -> Option<&Dependent> {
        self.producers.get(dependency)
    }

    /// Every slot that must be recomputed when `changed` slots change: the transitive
    /// closure of the impact map, expressed as target slots.
    pub fn affected_by<'a>(
        &self,
        changed: impl IntoIterator<Item = &'a Dependency>,
    ) -> BTreeSet<Dependency> {
        let mut affected = BTreeSet::new();
        let mut queue: VecDeque<Dependency> = changed.into_iter().cloned().collect();

        while let Some(dependency) = queue.pop_front() {
            for dependent in self.impacted_by(&dependency) {
                if let Some(target) = self.target_of(dependent) {
                    if affected.insert(target.clone()) {
                        queue.push_back(target.clone());
                    }
                }
            }
        }
        affected
    }

    /// Both maps are exact inverses of one another.
    pub fn is_consistent(&self) -> bool {
        let forward = self.dependency_map.iter().all(|(dependent, dependencies)| {
            dependencies.iter().all(|dependency| {
                self.impact_map
                    .get(dependency)
                    .is_some_and(|set| set.contains(dependent))
            })
        });
        let backward = self.impact_map.iter().all(|(dependency, dependents)| {
            dependents
                .iter()
                .all(|dependent| self.dependencies_of(dependent).contains(dependency))
        });
        forward && backward
    }
}
