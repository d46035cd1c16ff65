//! Use cases: the author-time validation pass and the respondent-time navigation pass.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{CodeMatcher, EngineConfig};
use crate::dependency::{Dependency, Dependent, Property, ReservedCode};
use crate::error::{EngineResult, Error};
use crate::graph::{self, sanitize, DependencyGraph, EvaluationOrder};
use crate::navigation::{NavigationDirection, NavigationIndex, NavigationPlan, NavigationResult};
use crate::runtime::RuntimeContextBuilder;
use crate::script::{
    bundle, ExpressionRuntime, NavigateParams, NavigateResult, ProgramRegistry, ScriptCheck,
    ScriptEvaluator, ScriptMethod, ScriptReport, StatementFailure,
};
use crate::survey::{
    attach_structural_errors, BindingError, Component, ComponentError, ComponentIndex,
    ComponentKind,
};
use crate::value::{Bindings, Value};

/// An error found while validating, located for the author.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum AuthoringError {
    Component {
        component: String,
        error: ComponentError,
    },
    Instruction {
        component: String,
        instruction: String,
        error: BindingError,
    },
}

/// Output of [`SurveyEngine::validate`], ready for any number of navigation passes.
#[derive(Debug, Clone)]
pub struct ValidatedSurvey {
    /// The authored tree with every error attached.
    pub survey: Component,
    /// The executable part of the tree.
    pub sanitized: Component,
    pub components: ComponentIndex,
    pub graph: DependencyGraph,
    pub order: EvaluationOrder,
    pub plan: NavigationPlan,
    pub program_key: String,
    /// Slots filled from submitted values.
    inputs: BTreeSet<Dependency>,
    /// Slots written by the compiled program, in bundle order.
    computed: Vec<Dependency>,
}

impl ValidatedSurvey {
    pub fn errors(&self) -> Vec<AuthoringError> {
        let mut errors = Vec::new();
        for component in self.survey.walk() {
            for error in &component.errors {
                errors.push(AuthoringError::Component {
                    component: component.code.clone(),
                    error: error.clone(),
                });
            }
            for instruction in &component.instructions {
                for error in &instruction.errors {
                    errors.push(AuthoringError::Instruction {
                        component: component.code.clone(),
                        instruction: instruction.code.clone(),
                        error: error.clone(),
                    });
                }
            }
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.survey.error_count() == 0
    }

    pub fn inputs(&self) -> &BTreeSet<Dependency> {
        &self.inputs
    }

    pub fn computed(&self) -> &[Dependency] {
        &self.computed
    }

    pub fn survey_code(&self) -> &str {
        &self.sanitized.code
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationRequest {
    /// Step the respondent is on; `None` before the first step.
    #[serde(default)]
    pub index: Option<NavigationIndex>,
    #[serde(default)]
    pub direction: NavigationDirection,
    /// Values submitted for the current step.
    #[serde(default)]
    pub values: Bindings,
    /// Bindings returned by the previous pass; enables incremental recomputation.
    #[serde(default)]
    pub previous: Option<Bindings>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationOutput {
    pub bindings: Bindings,
    pub navigation_index: NavigationIndex,
    pub failures: Vec<StatementFailure>,
}

pub struct SurveyEngine {
    config: EngineConfig,
    evaluator: Arc<dyn ScriptEvaluator>,
    registry: Arc<ProgramRegistry>,
    matcher: CodeMatcher,
}

impl SurveyEngine {
    pub fn new(
        config: EngineConfig,
        evaluator: Arc<dyn ScriptEvaluator>,
        registry: Arc<ProgramRegistry>,
    ) -> EngineResult<Self> {
        let matcher = config.codes.matcher()?;
        Ok(Self {
            config,
            evaluator,
            registry,
            matcher,
        })
    }

    /// Engine backed by the built-in [`ExpressionRuntime`] and a fresh registry.
    pub fn with_builtin_runtime(config: EngineConfig) -> EngineResult<Self> {
        let evaluator = Arc::new(ExpressionRuntime::new(config.runtime.clone()));
        Self::new(config, evaluator, Arc::new(ProgramRegistry::new()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ProgramRegistry> {
        &self.registry
    }

    /// Attach every authoring error, drop what cannot run, compile and register the rest.
    pub fn validate(&self, survey: Component) -> EngineResult<ValidatedSurvey> {
        info!("validating survey {}", survey.code);
        let mut survey = survey;

        attach_structural_errors(&mut survey);

        let build = DependencyGraph::build(&survey);
        build.attach_errors(&mut survey);

        self.check_scripts(&mut survey)?;

        let order = EvaluationOrder::build(&survey);
        let flagged = graph::check(&mut survey, &build.graph, &order);
        debug!("dependency check flagged {} instruction(s)", flagged);

        let sanitized = sanitize(&survey).ok_or_else(|| Error::InvalidSurvey(survey.code.clone()))?;
        let graph = DependencyGraph::build(&sanitized).graph;
        let order = EvaluationOrder::build(&sanitized);
        let components = ComponentIndex::build(&sanitized, &self.matcher);
        let plan = NavigationPlan::new(self.config.navigation_mode, &components);

        let mut inputs = BTreeSet::new();
        let mut computed = Vec::new();
        let instructions = instruction_table(&sanitized);
        for dependent in order.sequence() {
            if let Some((target, is_active)) = instructions.get(dependent) {
                if *is_active {
                    computed.push(target.clone());
                } else {
                    inputs.insert(target.clone());
                }
            }
        }

        let source = bundle::generate(&sanitized, &order);
        let program = self.evaluator.compile(&source)?;
        let program_key = sanitized.code.clone();
        if self.registry.register(&program_key, program).is_some() {
            info!("replaced compiled program for survey {}", program_key);
        }

        let validated = ValidatedSurvey {
            survey,
            sanitized,
            components,
            graph,
            order,
            plan,
            program_key,
            inputs,
            computed,
        };
        info!(
            "survey {} validated: {} error(s), {} computed slot(s)",
            validated.program_key,
            validated.survey.error_count(),
            validated.computed.len()
        );
        Ok(validated)
    }

    /// Ask the evaluator to check every script still error-free and attach its verdicts.
    fn check_scripts(&self, survey: &mut Component) -> EngineResult<()> {
        let mut keys: HashMap<String, Dependent> = HashMap::new();
        let mut checks = Vec::new();
        for component in survey.walk() {
            for instruction in &component.instructions {
                let Some(script) = instruction.script() else {
                    continue;
                };
                if instruction.has_errors() {
                    continue;
                }
                let dependent = instruction.dependent(&component.code);
                let key = dependent.to_string();
                checks.push(ScriptCheck {
                    key: key.clone(),
                    script: script.to_string(),
                });
                keys.insert(key, dependent);
            }
        }
        if checks.is_empty() {
            return Ok(());
        }

        let program = self.evaluator.compile("")?;
        let raw = self.evaluator.execute(
            &program,
            ScriptMethod::Validate,
            &serde_json::to_string(&checks)?,
        )?;
        let reports: Vec<ScriptReport> = serde_json::from_str(&raw)?;

        for report in reports {
            let Some(result_type) = report.result_type.failure() else {
                continue;
            };
            let Some(dependent) = keys.get(&report.key) else {
                warn!("evaluator reported on unknown script {}", report.key);
                continue;
            };
            let instruction = survey
                .find_mut(&dependent.component_code)
                .and_then(|component| {
                    component
                        .instructions
                        .iter_mut()
                        .find(|i| i.code == dependent.instruction_code)
                });
            if let Some(instruction) = instruction {
                instruction.add_error(BindingError::script_failure(
                    result_type,
                    report.message.unwrap_or_default(),
                ));
            }
        }
        Ok(())
    }

    /// Evaluate submitted values, move the index and derive the runtime bindings.
    pub fn navigate(
        &self,
        survey: &ValidatedSurvey,
        request: NavigationRequest,
    ) -> EngineResult<NavigationOutput> {
        let program = self
            .registry
            .get(&survey.program_key)
            .ok_or_else(|| Error::ProgramNotRegistered(survey.program_key.clone()))?;
        if let Some(index) = &request.index {
            survey.plan.position(index)?;
        }
        debug!(
            "navigating survey {} from {:?} with {:?}",
            survey.program_key, request.index, request.direction
        );

        let previous = request.previous;
        let mut values = previous.clone().unwrap_or_default();
        for (dependency, value) in request.values {
            if !survey.inputs.contains(&dependency) {
                warn!("ignoring submitted value for non-input slot {}", dependency);
                continue;
            }
            values.insert(dependency, value);
        }
        seed_defaults(&mut values, survey);

        let targets = previous
            .as_ref()
            .map(|previous| recompute_targets(survey, previous, &values));
        if let Some(targets) = &targets {
            debug!("recomputing {} of {} slot(s)", targets.len(), survey.computed.len());
        }

        let params = serde_json::to_string(&NavigateParams { values, targets })?;
        let raw = self
            .evaluator
            .execute(&program, ScriptMethod::Navigate, &params)?;
        let result: NavigateResult = serde_json::from_str(&raw)?;
        for failure in &result.failures {
            warn!(
                "{} failed at runtime ({}): {}",
                failure.key, failure.result_type, failure.message
            );
        }

        let mut bindings: Bindings = result
            .bindings
            .into_iter()
            .map(|(dependency, value)| {
                if dependency.property.is_boolean() {
                    let truthy = value.is_truthy();
                    (dependency, Value::Boolean(truthy))
                } else {
                    (dependency, value)
                }
            })
            .collect();
        seed_defaults(&mut bindings, survey);
        propagate_irrelevance(&mut bindings, &survey.components)?;

        let builder = RuntimeContextBuilder::new(&survey.components, &survey.plan, &bindings);
        let root_validity = Dependency::validity(survey.survey_code());

        let current_valid = match &request.index {
            Some(index) => builder
                .add_validity_instruction(index)?
                .get(&root_validity)
                .map(Value::as_bool)
                .transpose()
                .map_err(|e| Error::internal(e.to_string()))?
                .ok_or_else(|| Error::internal("survey validity was not derived"))?,
            None => true,
        };
        let attempted_next = request.direction == NavigationDirection::Next;

        let navigation_index = match &request.index {
            Some(current)
                if attempted_next && !current_valid && self.config.runtime.block_next_on_invalid =>
            {
                info!("next blocked: {} is invalid", current);
                current.clone()
            }
            current => survey.plan.move_index(current.as_ref(), &request.direction, |index| {
                is_step_relevant(&bindings, index)
            })?,
        };

        let validity = builder.add_validity_instruction(&navigation_index)?;
        let show_errors = builder.add_show_errors_instruction(current_valid || !attempted_next);
        let before_after = builder.add_before_after_nav(&navigation_index)?;

        bindings.merge(validity);
        bindings.merge(show_errors);
        bindings.merge(before_after);

        Ok(NavigationOutput {
            bindings,
            navigation_index,
            failures: result.failures,
        })
    }
}

/// `(target, is_active)` of every instruction, keyed by its identity.
fn instruction_table(tree: &Component) -> HashMap<Dependent, (Dependency, bool)> {
    tree.walk()
        .into_iter()
        .flat_map(|component| {
            component.instructions.iter().map(move |instruction| {
                (
                    instruction.dependent(&component.code),
                    (instruction.produces(&component.code), instruction.is_active),
                )
            })
        })
        .collect()
}

/// Relevance and validity default to `true` on components with no instruction for them.
fn seed_defaults(bindings: &mut Bindings, survey: &ValidatedSurvey) {
    for code in survey.components.codes() {
        for slot in [Dependency::relevance(code), Dependency::validity(code)] {
            if !survey.order.is_declared(&slot) {
                bindings.insert(slot, true);
            }
        }
    }
}

/// Slots to recompute given the previous pass.
///
/// Besides the impact closure of changed slots this always includes the slots the runtime
/// rewrites after evaluation (every declared relevance, group and survey validity) and
/// statements that never ran.
fn recompute_targets(
    survey: &ValidatedSurvey,
    previous: &Bindings,
    values: &Bindings,
) -> Vec<Dependency> {
    let changed: Vec<&Dependency> = values
        .iter()
        .filter(|(dependency, value)| previous.get(dependency) != Some(*value))
        .map(|(dependency, _)| dependency)
        .collect();

    let rewritten: Vec<&Dependency> = survey
        .computed
        .iter()
        .filter(|slot| is_rewritten_by_runtime(slot, &survey.components))
        .collect();

    let mut targets = survey
        .graph
        .affected_by(changed.into_iter().chain(rewritten.iter().copied()));
    targets.extend(rewritten.into_iter().cloned());
    targets.extend(
        survey
            .computed
            .iter()
            .filter(|slot| !previous.contains(slot))
            .cloned(),
    );

    // keep bundle order for readability of the params
    survey
        .computed
        .iter()
        .filter(|slot| targets.contains(*slot))
        .cloned()
        .collect()
}

fn is_rewritten_by_runtime(slot: &Dependency, components: &ComponentIndex) -> bool {
    match slot.property {
        Property::Reserved(ReservedCode::Relevance) => true,
        Property::Reserved(ReservedCode::Validity) => matches!(
            components.kind(&slot.component_code),
            Some(ComponentKind::Group | ComponentKind::Survey)
        ),
        _ => false,
    }
}

/// A component under an irrelevant parent is irrelevant. Codes come in document order, so
/// parents are settled before their children.
fn propagate_irrelevance(bindings: &mut Bindings, components: &ComponentIndex) -> EngineResult<()> {
    for code in components.codes() {
        let Some(parent) = components.parent(code) else {
            continue;
        };
        if !bindings.require_bool(&Dependency::relevance(parent))? {
            bindings.insert(Dependency::relevance(code), false);
        }
    }
    Ok(())
}

fn is_step_relevant(bindings: &Bindings, index: &NavigationIndex) -> NavigationResult<bool> {
    let codes = index.codes();
    if codes.is_empty() {
        return Ok(true);
    }
    for code in codes {
        if bindings.require_bool(&Dependency::relevance(code))? {
            return Ok(true);
        }
    }
    Ok(false)
}

