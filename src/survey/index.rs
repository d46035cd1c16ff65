use std::collections::HashMap;

use super::component::{Component, ComponentKind};
use crate::config::CodeMatcher;

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentEntry {
    pub code: String,
    pub kind: ComponentKind,
    pub parent: Option<String>,
    /// Position in the pre-order walk.
    pub position: usize,
    pub children: Vec<String>,
}

/// Side table over a component tree, keyed by code.
///
/// The tree only owns parent-to-child edges; everything that needs to look upwards
/// (ancestors, in-navigation sets) goes through this index instead.
/// When a code is duplicated the first occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct ComponentIndex {
    entries: HashMap<String, ComponentEntry>,
    order: Vec<String>,
    root: Option<String>,
}

impl ComponentIndex {
    pub fn build(root: &Component, matcher: &CodeMatcher) -> Self {
        let mut index = Self {
            root: Some(root.code.clone()),
            ..Self::default()
        };
        index.insert(root, None, matcher);
        index
    }

    fn insert(
        &mut self,
        component: &Component,
        parent: Option<&str>,
        matcher: &CodeMatcher,
    ) {
        if !self.entries.contains_key(&component.code) {
            let kind = if parent.is_none() {
                ComponentKind::Survey
            } else {
                matcher.kind_of(&component.code)
            };
            self.entries.insert(
                component.code.clone(),
                ComponentEntry {
                    code: component.code.clone(),
                    kind,
                    parent: parent.map(str::to_string),
                    position: self.order.len(),
                    children: component.children.iter().map(|c| c.code.clone()).collect(),
                },
            );
            self.order.push(component.code.clone());
        }
        for child in &component.children {
            self.insert(child, Some(&component.code), matcher);
        }
    }

    pub fn root(&self) -> Option<&str> {
        self.root.as_deref()
    }

    pub fn get(&self, code: &str) -> Option<&ComponentEntry> {
        self.entries.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    pub fn kind(&self, code: &str) -> Option<ComponentKind> {
        self.get(code).map(|e| e.kind)
    }

    pub fn parent(&self, code: &str) -> Option<&str> {
        self.get(code).and_then(|e| e.parent.as_deref())
    }

    /// Ancestors from the closest parent up to the root.
    pub fn ancestors(&self, code: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut current = self.parent(code);
        while let Some(code) = current {
            out.push(code);
            current = self.parent(code);
        }
        out
    }

    /// All descendants in document order, excluding `code` itself.
    pub fn descendants(&self, code: &str) -> Vec<&str> {
        let mut out = Vec::new();
        if let Some(entry) = self.get(code) {
            for child in &entry.children {
                if let Some(child_entry) = self.get(child) {
                    out.push(child_entry.code.as_str());
                    out.extend(self.descendants(child));
                }
            }
        }
        out
    }

    /// Codes in document order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn codes_of_kind(&self, kind: ComponentKind) -> Vec<&str> {
        self.codes().filter(|c| self.kind(c) == Some(kind)).collect()
    }

    pub fn groups(&self) -> Vec<&str> {
        self.codes_of_kind(ComponentKind::Group)
    }

    pub fn questions(&self) -> Vec<&str> {
        self.codes_of_kind(ComponentKind::Question)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
