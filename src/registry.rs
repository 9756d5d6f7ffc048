use crate::config::{Config, Persona, Provider};
use crate::error::{ConfigError, RunError};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// A persona resolved against config defaults.
#[derive(Debug, Clone)]
pub struct Reviewer {
    pub persona: Persona,
    pub provider: Provider,
    pub timeout: Duration,
}

/// Public view of a reviewer; never exposes the system prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewerSummary {
    pub id: String,
    pub label: String,
}

/// The set of reviewers a deployment knows about.
///
/// Built once from config and handed to the orchestrator; there is no global
/// instance.
#[derive(Debug, Clone)]
pub struct ReviewerRegistry {
    reviewers: Vec<Reviewer>,
    index: HashMap<String, usize>,
}

impl ReviewerRegistry {
    pub fn new(reviewers: Vec<Reviewer>) -> Result<Self, ConfigError> {
        let mut index = HashMap::new();
        for (pos, reviewer) in reviewers.iter().enumerate() {
            if index.insert(reviewer.persona.id.clone(), pos).is_some() {
                return Err(ConfigError::DuplicatePersona(reviewer.persona.id.clone()));
            }
        }
        Ok(Self { reviewers, index })
    }

    /// Enabled personas from config, with provider and timeout defaults applied
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let reviewers = config
            .personas
            .iter()
            .filter(|p| p.enabled)
            .map(|p| Reviewer {
                persona: p.clone(),
                provider: p.provider.unwrap_or(config.default_provider),
                timeout: Duration::from_secs(p.timeout_sec.unwrap_or(config.timeout_sec)),
            })
            .collect();
        Self::new(reviewers)
    }

    pub fn get(&self, id: &str) -> Option<&Reviewer> {
        self.index.get(id).map(|&pos| &self.reviewers[pos])
    }

    pub fn len(&self) -> usize {
        self.reviewers.len()
    }

    pub fn summaries(&self) -> Vec<ReviewerSummary> {
        self.reviewers
            .iter()
            .map(|r| ReviewerSummary {
                id: r.persona.id.clone(),
                label: r.persona.label.clone(),
            })
            .collect()
    }

    /// Resolve requested ids, all-or-nothing, preserving request order.
    pub fn resolve(&self, ids: &[String]) -> Result<Vec<&Reviewer>, RunError> {
        if ids.is_empty() {
            return Err(RunError::NoPersonas);
        }

        let unknown: Vec<String> = ids
            .iter()
            .filter(|id| !self.index.contains_key(id.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(RunError::UnknownPersonas(unknown));
        }

        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(RunError::DuplicatePersona(id.clone()));
            }
            if let Some(reviewer) = self.get(id) {
                resolved.push(reviewer);
            }
        }

        Ok(resolved)
    }
}
