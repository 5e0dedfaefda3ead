use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use jf_core::{Client, ClientId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::traits::ClientDirectory;

const BUILTIN_CLIENTS: &str = include_str!("../../../fixtures/clients.yaml");

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("client directory is empty")]
    Empty,
    #[error("duplicate client id: {0}")]
    DuplicateId(String),
    #[error("client {0} has an empty name")]
    EmptyName(String),
    #[error("client {0} has an empty industry")]
    EmptyIndustry(String),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientFile {
    pub clients: Vec<Client>,
}

/// Directory held in memory, keyed by id so iteration order is stable.
#[derive(Clone, Debug, Default)]
pub struct InMemoryDirectory {
    clients: BTreeMap<ClientId, Client>,
}

impl InMemoryDirectory {
    pub fn new(clients: Vec<Client>) -> Result<Self, DirectoryError> {
        if clients.is_empty() {
            return Err(DirectoryError::Empty);
        }
        let mut map = BTreeMap::new();
        for c in clients {
            if c.name.trim().is_empty() {
                return Err(DirectoryError::EmptyName(c.id.0));
            }
            if c.industry.trim().is_empty() {
                return Err(DirectoryError::EmptyIndustry(c.id.0));
            }
            if map.contains_key(&c.id) {
                return Err(DirectoryError::DuplicateId(c.id.0));
            }
            map.insert(c.id.clone(), c);
        }
        Ok(Self { clients: map })
    }

    /// Directory embedded from `fixtures/clients.yaml`.
    pub fn builtin() -> Self {
        Self::from_yaml_str(BUILTIN_CLIENTS).expect("builtin client fixture is valid")
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let file: ClientFile = serde_yaml::from_str(s).context("parse client directory yaml")?;
        Ok(Self::new(file.clients)?)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

pub fn load_directory(path: &Path) -> Result<InMemoryDirectory> {
    let s = std::fs::read_to_string(path).with_context(|| format!("read client directory: {}", path.display()))?;
    InMemoryDirectory::from_yaml_str(&s).with_context(|| format!("load {}", path.display()))
}

impl ClientDirectory for InMemoryDirectory {
    fn all_clients(&self) -> Vec<Client> {
        self.clients.values().cloned().collect()
    }

    fn client_by_id(&self, id: &ClientId) -> Option<Client> {
        self.clients.get(id).cloned()
    }

    fn clients_by_industry(&self, industry: &str) -> Vec<Client> {
        self.clients.values().filter(|c| c.industry == industry).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::io::Write;

    use jf_core::{seeded_rng, ClientTier};
    use proptest::prelude::*;

    use super::*;

    fn client(id: &str, min_reputation: i32) -> Client {
        Client {
            id: ClientId::from_str(id),
            name: format!("Client {id}"),
            industry: "retail".to_string(),
            client_type: ClientTier::Individual,
            min_reputation,
            location: None,
        }
    }

    #[test]
    fn builtin_directory_loads() {
        let dir = InMemoryDirectory::builtin();
        assert!(dir.len() >= 12);
        assert!(dir.accessible_clients(1).len() >= 4);
        assert!(!dir.clients_by_industry("banking").is_empty());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = InMemoryDirectory::new(vec![client("a", 1), client("a", 2)]).unwrap_err();
        assert_eq!(err, DirectoryError::DuplicateId("a".to_string()));
    }

    #[test]
    fn rejects_empty_directory() {
        assert_eq!(InMemoryDirectory::new(vec![]).unwrap_err(), DirectoryError::Empty);
    }

    #[test]
    fn accessibility_is_strict_gate() {
        let dir = InMemoryDirectory::new(vec![client("a", 1), client("b", 3), client("c", 4)]).unwrap();
        let ids: Vec<String> = dir.accessible_clients(3).into_iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec!["a", "b"]);
        let locked: Vec<String> = dir.locked_clients(3).into_iter().map(|c| c.id.0).collect();
        assert_eq!(locked, vec!["c"]);
    }

    #[test]
    fn random_accessible_client_respects_exclusions() {
        let dir = InMemoryDirectory::new(vec![client("a", 1), client("b", 1), client("c", 5)]).unwrap();
        let mut rng = seeded_rng(3);
        let exclude: BTreeSet<ClientId> = [ClientId::from_str("a")].into_iter().collect();
        for _ in 0..20 {
            let picked = dir.random_accessible_client(1, &exclude, &mut rng).unwrap();
            assert_eq!(picked.id.as_str(), "b");
        }
        let all: BTreeSet<ClientId> = [ClientId::from_str("a"), ClientId::from_str("b")].into_iter().collect();
        assert!(dir.random_accessible_client(1, &all, &mut rng).is_none());
    }

    #[test]
    fn loads_directory_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "clients:\n  - id: solo\n    name: Solo Client\n    industry: legal\n    clientType: enterprise\n    minReputation: 2\n"
        )
        .unwrap();
        let dir = load_directory(f.path()).unwrap();
        assert_eq!(dir.len(), 1);
        let solo = dir.client_by_id(&ClientId::from_str("solo")).unwrap();
        assert_eq!(solo.client_type, ClientTier::Enterprise);
        assert!(solo.location.is_none());
    }

    proptest! {
        #[test]
        fn accessible_set_grows_with_reputation(r1 in -2i32..10, delta in 0i32..10) {
            let dir = InMemoryDirectory::builtin();
            let r2 = r1 + delta;
            let low: BTreeSet<ClientId> = dir.accessible_clients(r1).into_iter().map(|c| c.id).collect();
            let high: BTreeSet<ClientId> = dir.accessible_clients(r2).into_iter().map(|c| c.id).collect();
            prop_assert!(low.is_subset(&high));
        }
    }
}
