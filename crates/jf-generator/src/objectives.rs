use jf_core::{Archetype, FileOperation, Network, Objective, ObjectiveId, ObjectiveKind, ObjectiveStatus};
use jf_infra::Infrastructure;
use rand::Rng;

struct Builder<'r, R: Rng> {
    rng: &'r mut R,
    out: Vec<Objective>,
}

impl<'r, R: Rng> Builder<'r, R> {
    fn push(&mut self, description: String, kind: ObjectiveKind) {
        self.out.push(Objective {
            id: ObjectiveId::generate(&mut *self.rng),
            description,
            kind,
            status: ObjectiveStatus::Pending,
            required: true,
        });
    }

    fn connect(&mut self, net: &Network) {
        self.push(
            format!("Connect to {}", net.network_name),
            ObjectiveKind::NetworkConnection { network_id: net.network_id.clone() },
        );
    }

    fn scan(&mut self, net: &Network) {
        let host = net.file_systems[0].name.clone();
        self.push(
            format!("Scan {} and locate {}", net.address, host),
            ObjectiveKind::NetworkScan { network_id: net.network_id.clone(), expected_host: host },
        );
    }

    fn connect_host(&mut self, net: &Network) {
        let fs = &net.file_systems[0];
        self.push(
            format!("Connect to file system {} ({})", fs.name, fs.ip),
            ObjectiveKind::FileSystemConnection { file_system_id: fs.id.clone(), ip: fs.ip.clone() },
        );
    }

    fn file_op(&mut self, operation: FileOperation, files: &[String], destination: Option<&Network>, description: String) {
        self.push(
            description,
            ObjectiveKind::FileOperation {
                operation,
                target_files: files.to_vec(),
                count: files.len(),
                destination: destination.map(|n| n.file_systems[0].id.clone()),
            },
        );
    }

    fn finish(mut self) -> Vec<Objective> {
        self.push("Report back to the client for verification".to_string(), ObjectiveKind::Verification);
        self.out
    }
}

/// Ordered objectives for a job: connect, scan, connect to the host, the file
/// work, and always a trailing verification.
pub fn build_objectives<R: Rng>(archetype: Archetype, infra: &Infrastructure, rng: &mut R) -> Vec<Objective> {
    let mut b = Builder { rng, out: Vec::new() };
    let source = infra.primary();
    let files = infra.source_file_names();

    b.connect(source);
    b.scan(source);
    b.connect_host(source);

    match (archetype, infra.secondary()) {
        (Archetype::Repair, _) => {
            b.file_op(FileOperation::Repair, &files, None, format!("Repair {} corrupted files", files.len()));
        }
        (Archetype::Backup, Some(dest)) => {
            b.file_op(FileOperation::Copy, &files, None, format!("Copy {} files from {}", files.len(), source.file_systems[0].name));
            b.connect(dest);
            b.connect_host(dest);
            b.file_op(
                FileOperation::Paste,
                &files,
                Some(dest),
                format!("Paste the backup onto {}", dest.file_systems[0].name),
            );
        }
        (Archetype::Transfer, Some(dest)) => {
            b.file_op(FileOperation::Copy, &files, None, format!("Copy {} files for migration", files.len()));
            b.connect(dest);
            b.connect_host(dest);
            b.file_op(
                FileOperation::Paste,
                &files,
                Some(dest),
                format!("Paste the files onto {}", dest.file_systems[0].name),
            );
            b.file_op(
                FileOperation::Delete,
                &files,
                None,
                format!("Remove the originals from {}", source.file_systems[0].name),
            );
        }
        // Copy jobs without a destination degrade to an in-place copy.
        (Archetype::Backup | Archetype::Transfer, None) => {
            b.file_op(FileOperation::Copy, &files, None, format!("Copy {} files", files.len()));
        }
    }

    b.finish()
}
