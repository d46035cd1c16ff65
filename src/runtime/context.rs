use std::collections::BTreeSet;

use super::{RuntimeError, RuntimeResult};
use crate::dependency::{Dependency, ReservedCode};
use crate::navigation::{NavigationIndex, NavigationPlan, NavigationResult};
use crate::survey::ComponentIndex;
use crate::value::{Bindings, Value};

/// Derives the runtime-only bindings from one bindings snapshot.
///
/// Each operation is pure with respect to the snapshot and returns a delta that the caller
/// merges into the store.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeContextBuilder<'a> {
    components: &'a ComponentIndex,
    plan: &'a NavigationPlan,
    bindings: &'a Bindings,
}

impl<'a> RuntimeContextBuilder<'a> {
    pub fn new(components: &'a ComponentIndex, plan: &'a NavigationPlan, bindings: &'a Bindings) -> Self {
        Self {
            components,
            plan,
            bindings,
        }
    }

    fn survey_code(&self) -> &'a str {
        self.components.root().unwrap_or_default()
    }

    fn lookup<T>(&self, index: &NavigationIndex, found: NavigationResult<T>) -> RuntimeResult<T> {
        found.map_err(|_| RuntimeError::UnknownStep(index.clone()))
    }

    fn is_relevant(&self, code: &str) -> RuntimeResult<bool> {
        self.bindings.require_bool(&Dependency::relevance(code))
    }

    /// `InCurrentNavigation` for every component, plus group and survey `Validity` for the step.
    ///
    /// Survey validity is the AND over every relevant question in navigation; a group's is
    /// the AND over its relevant children in navigation. Both also carry their own validity
    /// slot, so an authored group constraint is kept. Irrelevant components are skipped
    /// rather than counted as invalid, and an empty reduction is `true`.
    pub fn add_validity_instruction(&self, index: &NavigationIndex) -> RuntimeResult<Bindings> {
        let members = self.lookup(index, self.plan.in_navigation(index))?;
        let mut delta = Bindings::new();

        for code in self.components.codes() {
            delta.insert(
                Dependency::reserved(code, ReservedCode::InCurrentNavigation),
                members.contains(code),
            );
        }

        // innermost groups first, so nested groups are aggregated before their parents
        for group in self.components.groups().into_iter().rev() {
            if !members.contains(group) {
                continue;
            }
            let valid = self.group_validity(group, members, &delta)?;
            delta.insert(Dependency::validity(group), valid);
        }

        let survey = self.survey_code();
        let mut survey_valid = self.bindings.require_bool(&Dependency::validity(survey))?;
        for question in self.components.questions() {
            if !members.contains(question) || !self.is_relevant(question)? {
                continue;
            }
            survey_valid &= self.bindings.require_bool(&Dependency::validity(question))?;
        }
        delta.insert(Dependency::validity(survey), survey_valid);

        Ok(delta)
    }

    fn group_validity(
        &self,
        group: &str,
        members: &BTreeSet<String>,
        aggregated: &Bindings,
    ) -> RuntimeResult<bool> {
        let mut valid = self.bindings.require_bool(&Dependency::validity(group))?;
        let children = self
            .components
            .get(group)
            .map(|entry| entry.children.as_slice())
            .unwrap_or_default();

        for child in children {
            if !members.contains(child) || !self.is_relevant(child)? {
                continue;
            }
            let validity = Dependency::validity(child.as_str());
            valid &= match aggregated.get(&validity) {
                Some(value) => value.as_bool().map_err(|source| RuntimeError::InvalidBinding {
                    dependency: validity.clone(),
                    source,
                })?,
                None => self.bindings.require_bool(&validity)?,
            };
        }
        Ok(valid)
    }

    /// `ShowErrors` on the survey: set once an attempt to move on found the step invalid.
    pub fn add_show_errors_instruction(&self, is_survey_valid: bool) -> Bindings {
        let mut delta = Bindings::new();
        delta.insert(
            Dependency::reserved(self.survey_code(), ReservedCode::ShowErrors),
            !is_survey_valid,
        );
        delta
    }

    /// `BeforeNavigation`, `AfterNavigation`, `HasPrevious` and `HasNext`, from one snapshot.
    pub fn add_before_after_nav(&self, index: &NavigationIndex) -> RuntimeResult<Bindings> {
        let before = self.lookup(index, self.plan.codes_before(index))?;
        let after = self.lookup(index, self.plan.codes_after(index))?;

        let has_previous = self.any_relevant(&before)?;
        let has_next = self.any_relevant(&after)?;

        let survey = self.survey_code();
        let mut delta = Bindings::new();
        delta.insert(
            Dependency::reserved(survey, ReservedCode::BeforeNavigation),
            code_list(&before),
        );
        delta.insert(
            Dependency::reserved(survey, ReservedCode::AfterNavigation),
            code_list(&after),
        );
        delta.insert(Dependency::reserved(survey, ReservedCode::HasPrevious), has_previous);
        delta.insert(Dependency::reserved(survey, ReservedCode::HasNext), has_next);
        Ok(delta)
    }

    fn any_relevant(&self, codes: &[&str]) -> RuntimeResult<bool> {
        for code in codes {
            if self.is_relevant(code)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn code_list(codes: &[&str]) -> Value {
    Value::List(codes.iter().map(|code| Value::from(*code)).collect())
}
