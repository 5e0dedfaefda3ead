use std::collections::BTreeSet;

use jf_core::{Client, ClientId};
use rand::seq::SliceRandom;
use rand::RngCore;

/// Read-only view of the client directory. The engine queries it but never owns
/// or mutates client records.
pub trait ClientDirectory: Send + Sync {
    fn all_clients(&self) -> Vec<Client>;
    fn client_by_id(&self, id: &ClientId) -> Option<Client>;
    fn clients_by_industry(&self, industry: &str) -> Vec<Client>;

    /// Clients whose gate is met: `min_reputation <= reputation`, nothing looser.
    fn accessible_clients(&self, reputation: i32) -> Vec<Client> {
        self.all_clients().into_iter().filter(|c| c.is_accessible(reputation)).collect()
    }

    fn locked_clients(&self, reputation: i32) -> Vec<Client> {
        self.all_clients().into_iter().filter(|c| !c.is_accessible(reputation)).collect()
    }

    /// Uniform pick among accessible clients not in `exclude`.
    fn random_accessible_client(
        &self,
        reputation: i32,
        exclude: &BTreeSet<ClientId>,
        rng: &mut dyn RngCore,
    ) -> Option<Client> {
        let candidates: Vec<Client> = self
            .accessible_clients(reputation)
            .into_iter()
            .filter(|c| !exclude.contains(&c.id))
            .collect();
        candidates.choose(rng).cloned()
    }
}
