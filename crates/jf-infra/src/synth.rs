use jf_core::{Archetype, Client, FileSystem, FileSystemId, Network, NetworkId};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::names::{hostname, random_files};

const BANDWIDTHS_MBPS: [u32; 5] = [50, 100, 250, 500, 1000];

#[derive(Clone, Debug)]
pub struct InfraRequest<'a> {
    pub client: &'a Client,
    pub archetype: Archetype,
    pub file_count: usize,
    /// Mark every source file corrupted (repair jobs).
    pub corrupted: bool,
    /// Add a destination network with an empty file system.
    pub second_network: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Infrastructure {
    pub networks: Vec<Network>,
}

impl Infrastructure {
    pub fn primary(&self) -> &Network {
        &self.networks[0]
    }

    pub fn secondary(&self) -> Option<&Network> {
        self.networks.get(1)
    }

    pub fn source_host(&self) -> &FileSystem {
        &self.primary().file_systems[0]
    }

    pub fn source_file_names(&self) -> Vec<String> {
        self.source_host().files.iter().map(|f| f.name.clone()).collect()
    }
}

fn purposes(archetype: Archetype) -> (&'static str, &'static str) {
    match archetype {
        Archetype::Repair => ("fileserver", "recovery"),
        Archetype::Backup => ("fileserver", "backup"),
        Archetype::Transfer => ("archive", "migration"),
    }
}

fn random_subnet<R: Rng + ?Sized>(rng: &mut R) -> [u8; 3] {
    match rng.gen_range(0..3) {
        0 => [10, rng.gen(), rng.gen()],
        1 => [172, rng.gen_range(16..=31), rng.gen()],
        _ => [192, 168, rng.gen()],
    }
}

fn cidr(prefix: [u8; 3]) -> String {
    format!("{}.{}.{}.0/24", prefix[0], prefix[1], prefix[2])
}

fn host_ip<R: Rng + ?Sized>(prefix: [u8; 3], rng: &mut R) -> String {
    format!("{}.{}.{}.{}", prefix[0], prefix[1], prefix[2], rng.gen_range(10..=250u8))
}

fn build_network<R: Rng + ?Sized>(
    client: &Client,
    label: &str,
    purpose: &str,
    prefix: [u8; 3],
    files: Vec<jf_core::FileEntry>,
    rng: &mut R,
) -> Network {
    let bandwidth = *BANDWIDTHS_MBPS.choose(rng).unwrap_or(&100);
    Network {
        network_id: NetworkId::generate(rng),
        network_name: format!("{} {}", client.name, label),
        address: cidr(prefix),
        bandwidth,
        revoke_on_complete: true,
        file_systems: vec![FileSystem {
            id: FileSystemId::generate(rng),
            ip: host_ip(prefix, rng),
            name: hostname(client.id.as_str(), &client.name, purpose),
            files,
        }],
    }
}

/// Build the fake topology a job runs against: one or two /24 subnets that
/// never overlap, one host each, files on the first host only.
pub fn synthesize<R: Rng + ?Sized>(req: &InfraRequest<'_>, rng: &mut R) -> Infrastructure {
    let (source_purpose, dest_purpose) = purposes(req.archetype);
    let source_prefix = random_subnet(rng);
    let files = random_files(&req.client.industry, req.file_count, req.corrupted, rng);

    let mut networks = vec![build_network(req.client, "Primary", source_purpose, source_prefix, files, rng)];

    if req.second_network {
        let mut dest_prefix = random_subnet(rng);
        while dest_prefix == source_prefix {
            dest_prefix = random_subnet(rng);
        }
        let label = match req.archetype {
            Archetype::Backup => "Backup Site",
            Archetype::Transfer => "Migration Target",
            Archetype::Repair => "Recovery",
        };
        networks.push(build_network(req.client, label, dest_purpose, dest_prefix, vec![], rng));
    }

    debug!(
        client = %req.client.id,
        archetype = %req.archetype,
        networks = networks.len(),
        files = req.file_count,
        "synthesized infrastructure"
    );
    Infrastructure { networks }
}

#[cfg(test)]
mod tests {
    use jf_core::{seeded_rng, ClientId, ClientTier};

    use super::*;

    fn client(industry: &str) -> Client {
        Client {
            id: ClientId::from_str("client-x"),
            name: "Northgate Savings Bank".to_string(),
            industry: industry.to_string(),
            client_type: ClientTier::MidMarket,
            min_reputation: 1,
            location: None,
        }
    }

    #[test]
    fn single_network_for_repair() {
        let c = client("banking");
        let mut rng = seeded_rng(1);
        let infra = synthesize(
            &InfraRequest { client: &c, archetype: Archetype::Repair, file_count: 5, corrupted: true, second_network: false },
            &mut rng,
        );
        assert_eq!(infra.networks.len(), 1);
        assert_eq!(infra.source_host().files.len(), 5);
        assert!(infra.source_host().files.iter().all(|f| f.corrupted));
        assert!(infra.primary().address.ends_with(".0/24"));
        assert!(infra.primary().revoke_on_complete);
    }

    #[test]
    fn second_network_never_overlaps_and_starts_empty() {
        let c = client("legal");
        for seed in 0..200 {
            let mut rng = seeded_rng(seed);
            let infra = synthesize(
                &InfraRequest { client: &c, archetype: Archetype::Transfer, file_count: 4, corrupted: false, second_network: true },
                &mut rng,
            );
            let dest = infra.secondary().unwrap();
            assert_ne!(infra.primary().address, dest.address);
            assert!(dest.file_systems[0].files.is_empty());
            assert!(infra.source_host().files.iter().all(|f| !f.corrupted));
        }
    }

    #[test]
    fn host_ip_lives_in_its_subnet() {
        let c = client("media");
        let mut rng = seeded_rng(9);
        let infra = synthesize(
            &InfraRequest { client: &c, archetype: Archetype::Backup, file_count: 3, corrupted: false, second_network: true },
            &mut rng,
        );
        for net in &infra.networks {
            let prefix = net.address.trim_end_matches("0/24");
            assert!(net.file_systems[0].ip.starts_with(prefix));
        }
    }
}
