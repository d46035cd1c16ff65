use std::sync::Arc;

use dashmap::DashMap;

use super::CompiledProgram;

/// Compiled programs keyed by survey code.
///
/// Writes replace a slot atomically; reads clone the handle, so navigation calls running in
/// parallel share one compiled program.
#[derive(Debug, Clone, Default)]
pub struct ProgramRegistry {
    programs: Arc<DashMap<String, CompiledProgram>>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `program` under `key`, returning the program it replaced.
    pub fn register(&self, key: &str, program: CompiledProgram) -> Option<CompiledProgram> {
        self.programs.insert(key.to_string(), program)
    }

    pub fn get(&self, key: &str) -> Option<CompiledProgram> {
        self.programs.get(key).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, key: &str) -> Option<CompiledProgram> {
        self.programs.remove(key).map(|(_, program)| program)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.programs.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.programs.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
