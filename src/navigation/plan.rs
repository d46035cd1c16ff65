use std::collections::BTreeSet;

use super::{NavigationDirection, NavigationError, NavigationIndex, NavigationMode, NavigationResult};
use crate::survey::ComponentIndex;

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationStep {
    pub index: NavigationIndex,
    /// Components shown by this step: its own, their descendants and their ancestors.
    pub members: BTreeSet<String>,
}

/// Navigable steps of a survey, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPlan {
    mode: NavigationMode,
    steps: Vec<NavigationStep>,
}

impl NavigationPlan {
    pub fn new(mode: NavigationMode, components: &ComponentIndex) -> Self {
        let indices: Vec<NavigationIndex> = match mode {
            NavigationMode::AllInOne => vec![NavigationIndex::Groups(
                components.groups().into_iter().map(str::to_string).collect(),
            )],
            NavigationMode::GroupByGroup => components
                .groups()
                .into_iter()
                .map(|code| NavigationIndex::Group(code.to_string()))
                .collect(),
            NavigationMode::QuestionByQuestion => components
                .questions()
                .into_iter()
                .map(|code| NavigationIndex::Question(code.to_string()))
                .collect(),
        };

        let steps = indices
            .into_iter()
            .map(|index| {
                let mut members = BTreeSet::new();
                for code in index.codes() {
                    members.insert(code.to_string());
                    members.extend(components.descendants(code).into_iter().map(str::to_string));
                    members.extend(components.ancestors(code).into_iter().map(str::to_string));
                }
                if let Some(root) = components.root() {
                    members.insert(root.to_string());
                }
                NavigationStep { index, members }
            })
            .collect();

        Self { mode, steps }
    }

    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    pub fn steps(&self) -> &[NavigationStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn position(&self, index: &NavigationIndex) -> NavigationResult<usize> {
        self.steps
            .iter()
            .position(|step| &step.index == index)
            .ok_or_else(|| NavigationError::UnknownStep(index.clone()))
    }

    pub fn step(&self, index: &NavigationIndex) -> NavigationResult<&NavigationStep> {
        Ok(&self.steps[self.position(index)?])
    }

    /// Components currently in navigation for `index`.
    pub fn in_navigation(&self, index: &NavigationIndex) -> NavigationResult<&BTreeSet<String>> {
        Ok(&self.step(index)?.members)
    }

    /// Step codes strictly before `index`, in document order.
    pub fn codes_before(&self, index: &NavigationIndex) -> NavigationResult<Vec<&str>> {
        let position = self.position(index)?;
        Ok(self.steps[..position]
            .iter()
            .flat_map(|step| step.index.codes())
            .collect())
    }

    /// Step codes strictly after `index`, in document order.
    pub fn codes_after(&self, index: &NavigationIndex) -> NavigationResult<Vec<&str>> {
        let position = self.position(index)?;
        Ok(self.steps[position + 1..]
            .iter()
            .flat_map(|step| step.index.codes())
            .collect())
    }

    /// Resolve the step reached from `current` by `direction`, skipping irrelevant steps.
    ///
    /// Without a current step every direction except `Jump` starts from the beginning.
    /// A `Jump` to an irrelevant step lands on the next relevant step after it.
    /// When no relevant step exists in the requested direction the index stays put.
    pub fn move_index<F>(
        &self,
        current: Option<&NavigationIndex>,
        direction: &NavigationDirection,
        is_relevant: F,
    ) -> NavigationResult<NavigationIndex>
    where
        F: Fn(&NavigationIndex) -> NavigationResult<bool>,
    {
        if self.steps.is_empty() {
            return Err(NavigationError::NoSteps(self.mode));
        }

        let current = match (current, direction) {
            (current, NavigationDirection::Jump(target)) => {
                let position = self.position(target)?;
                if is_relevant(target)? {
                    return Ok(target.clone());
                }
                return match (self.find_forward(position + 1, &is_relevant)?, current) {
                    (Some(found), _) => Ok(found),
                    (None, Some(current)) => Ok(current.clone()),
                    (None, None) => self.first_relevant(0, &is_relevant),
                };
            }
            (_, NavigationDirection::Start) | (None, _) => {
                return self.first_relevant(0, &is_relevant)
            }
            (Some(current), _) => current,
        };
        let position = self.position(current)?;

        let moved = match direction {
            NavigationDirection::Next => self.find_forward(position + 1, &is_relevant)?,
            NavigationDirection::Previous => self.find_backward(position, &is_relevant)?,
            NavigationDirection::Resume if !is_relevant(current)? => {
                self.find_forward(position + 1, &is_relevant)?
            }
            _ => None,
        };
        Ok(moved.unwrap_or_else(|| current.clone()))
    }

    fn first_relevant<F>(&self, from: usize, is_relevant: &F) -> NavigationResult<NavigationIndex>
    where
        F: Fn(&NavigationIndex) -> NavigationResult<bool>,
    {
        Ok(self
            .find_forward(from, is_relevant)?
            .unwrap_or_else(|| self.steps[0].index.clone()))
    }

    fn find_forward<F>(&self, from: usize, is_relevant: &F) -> NavigationResult<Option<NavigationIndex>>
    where
        F: Fn(&NavigationIndex) -> NavigationResult<bool>,
    {
        for step in self.steps.iter().skip(from) {
            if is_relevant(&step.index)? {
                return Ok(Some(step.index.clone()));
            }
        }
        Ok(None)
    }

    fn find_backward<F>(&self, before: usize, is_relevant: &F) -> NavigationResult<Option<NavigationIndex>>
    where
        F: Fn(&NavigationIndex) -> NavigationResult<bool>,
    {
        for step in self.steps[..before].iter().rev() {
            if is_relevant(&step.index)? {
                return Ok(Some(step.index.clone()));
            }
        }
        Ok(None)
    }
}
