use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storyline::Storyline;

const BUILTIN_STORYLINES: &str = include_str!("../../../fixtures/storylines.yaml");

pub const MIN_ARC_LENGTH: usize = 2;
pub const MAX_ARC_LENGTH: usize = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("storyline has an empty id")]
    EmptyId,
    #[error("storyline {0} has an empty name")]
    EmptyName(String),
    #[error("duplicate storyline id: {0}")]
    DuplicateId(String),
    #[error("storyline {id} declares length {declared} but has {actual} steps")]
    LengthMismatch { id: String, declared: usize, actual: usize },
    #[error("storyline {id} has {len} steps but arcs run 2 to 3 steps")]
    BadLength { id: String, len: usize },
    #[error("storyline {id} step {step} has an empty narrative template")]
    EmptyNarrative { id: String, step: usize },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFile {
    pub storylines: Vec<Storyline>,
}

/// Static library of arc templates.
#[derive(Clone, Debug, Default)]
pub struct StorylineCatalog {
    storylines: Vec<Storyline>,
}

pub fn validate_storyline(s: &Storyline) -> Result<(), CatalogError> {
    if s.id.trim().is_empty() {
        return Err(CatalogError::EmptyId);
    }
    if s.name.trim().is_empty() {
        return Err(CatalogError::EmptyName(s.id.clone()));
    }
    if s.length != s.len() {
        return Err(CatalogError::LengthMismatch { id: s.id.clone(), declared: s.length, actual: s.len() });
    }
    if !(MIN_ARC_LENGTH..=MAX_ARC_LENGTH).contains(&s.len()) {
        return Err(CatalogError::BadLength { id: s.id.clone(), len: s.len() });
    }
    for (i, step) in s.mission_sequence.iter().enumerate() {
        if step.narrative_template.trim().is_empty() {
            return Err(CatalogError::EmptyNarrative { id: s.id.clone(), step: i + 1 });
        }
    }
    Ok(())
}

impl StorylineCatalog {
    pub fn new(storylines: Vec<Storyline>) -> Result<Self, CatalogError> {
        let mut seen = BTreeSet::new();
        for s in &storylines {
            validate_storyline(s)?;
            if !seen.insert(s.id.clone()) {
                return Err(CatalogError::DuplicateId(s.id.clone()));
            }
        }
        Ok(Self { storylines })
    }

    /// Catalog embedded from `fixtures/storylines.yaml`.
    pub fn builtin() -> Self {
        Self::from_yaml_str(BUILTIN_STORYLINES).expect("builtin storyline fixture is valid")
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(s).context("parse storyline catalog yaml")?;
        Ok(Self::new(file.storylines)?)
    }

    pub fn storylines(&self) -> &[Storyline] {
        &self.storylines
    }

    pub fn get(&self, id: &str) -> Option<&Storyline> {
        self.storylines.iter().find(|s| s.id == id)
    }

    /// None only when the catalog is empty.
    pub fn random_storyline<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Storyline> {
        self.storylines.choose(rng)
    }

    pub fn len(&self) -> usize {
        self.storylines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storylines.is_empty()
    }
}

pub fn load_catalog(path: &Path) -> Result<StorylineCatalog> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read storyline catalog: {}", path.display()))?;
    StorylineCatalog::from_yaml_str(&s).with_context(|| format!("load {}", path.display()))
}
