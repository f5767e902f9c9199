use std::{collections::HashMap, sync::Arc, time::Duration};

use crate::engine::{
    config::EngineConfig,
    models::ExecutionMode,
    sandbox::{Language, Toolchain},
};

#[derive(Clone)]
pub struct LanguageProfile {
    pub id: &'static str,
    pub timeout: Duration,
    pub judge_timeout: Duration,
    pub toolchain: Arc<dyn Toolchain>,
}

impl LanguageProfile {
    pub fn timeout_for(&self, mode: ExecutionMode) -> Duration {
        match mode {
            ExecutionMode::Run => self.timeout,
            ExecutionMode::Judge => self.judge_timeout,
        }
    }
}

impl std::fmt::Debug for LanguageProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LanguageProfile")
            .field("id", &self.id)
            .field("timeout", &self.timeout)
            .field("judge_timeout", &self.judge_timeout)
            .finish_non_exhaustive()
    }
}

/// Canonical language id to profile. Built once at startup, read-only after.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    profiles: HashMap<&'static str, LanguageProfile>,
}

impl ProfileTable {
    pub fn new(timeout: Duration, judge_timeout: Option<Duration>) -> Self {
        let mut table = Self::default();
        for language in Language::ALL {
            table.insert(LanguageProfile {
                id: language.id(),
                timeout,
                judge_timeout: judge_timeout.unwrap_or(timeout),
                toolchain: Arc::new(language),
            });
        }
        table
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.execution_timeout, config.judge_timeout)
    }

    pub fn insert(&mut self, profile: LanguageProfile) {
        self.profiles.insert(profile.id, profile);
    }

    pub fn lookup(&self, id: &str) -> Option<&LanguageProfile> {
        self.profiles.get(id)
    }

    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids = self.profiles.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::normalize::normalize_language;

    #[test]
    fn every_canonical_id_has_a_profile() {
        let table = ProfileTable::new(Duration::from_secs(10), None);
        for alias in ["golang", "javascript", "py", "c++", "clang", "java17"] {
            let id = normalize_language(alias);
            assert!(table.lookup(&id).is_some(), "{alias} -> {id}");
        }
        assert_eq!(table.ids(), vec!["c", "cpp", "go", "java", "js", "python"]);
    }

    #[test]
    fn unknown_language_is_not_found() {
        let table = ProfileTable::new(Duration::from_secs(10), None);
        assert!(table.lookup("brainfuck").is_none());
    }

    #[test]
    fn judge_timeout_defaults_to_run_timeout() {
        let table = ProfileTable::new(Duration::from_secs(10), None);
        let python = table.lookup("python").unwrap();
        assert_eq!(python.timeout_for(ExecutionMode::Judge), Duration::from_secs(10));

        let table = ProfileTable::new(Duration::from_secs(10), Some(Duration::from_secs(30)));
        let python = table.lookup("python").unwrap();
        assert_eq!(python.timeout_for(ExecutionMode::Run), Duration::from_secs(10));
        assert_eq!(python.timeout_for(ExecutionMode::Judge), Duration::from_secs(30));
    }
}
