use jf_core::{
    ArcId, ArcStep, Attachment, Client, ClientId, ClientTier, FileEntry, FileSystem, FileSystemId, Location,
    LocationType, Network, NetworkCredential, NetworkId, Objective, ObjectiveId, ObjectiveKind, ObjectiveStatus,
};

fn sample_network() -> Network {
    Network {
        network_id: NetworkId::from_str("net-1"),
        network_name: "Harbor Credit Union Primary".to_string(),
        address: "10.14.3.0/24".to_string(),
        bandwidth: 250,
        revoke_on_complete: true,
        file_systems: vec![FileSystem {
            id: FileSystemId::from_str("fs-1"),
            ip: "10.14.3.41".to_string(),
            name: "harbor-credit-union-fileserver-3f2a".to_string(),
            files: vec![FileEntry { name: "ledger_2024_q1.db".to_string(), size: "2.4 MB".to_string(), corrupted: true }],
        }],
    }
}

#[test]
fn test_client_accessibility_gate() {
    let client = Client {
        id: ClientId::from_str("client-1"),
        name: "Harbor Credit Union".to_string(),
        industry: "banking".to_string(),
        client_type: ClientTier::SmallBusiness,
        min_reputation: 3,
        location: Some(Location {
            region: "north".to_string(),
            location_type: LocationType::Branch,
            country: "Avalon".to_string(),
        }),
    };
    assert!(!client.is_accessible(2));
    assert!(client.is_accessible(3));
    assert!(client.is_accessible(9));
}

#[test]
fn test_network_address_attachment_wire_shape() {
    let attachment = Attachment::NetworkAddress(NetworkCredential::from(&sample_network()));
    let v = serde_json::to_value(&attachment).unwrap();
    assert_eq!(v["type"], "networkAddress");
    assert_eq!(v["networkId"], "net-1");
    assert_eq!(v["networkName"], "Harbor Credit Union Primary");
    assert_eq!(v["address"], "10.14.3.0/24");
    assert_eq!(v["bandwidth"], 250);
    assert_eq!(v["fileSystems"][0]["ip"], "10.14.3.41");
    assert_eq!(v["fileSystems"][0]["files"][0]["corrupted"], true);
}

#[test]
fn test_objective_flattens_type_specific_fields() {
    let objective = Objective {
        id: ObjectiveId::from_str("obj-1"),
        description: "Connect to the client network".to_string(),
        kind: ObjectiveKind::NetworkConnection { network_id: NetworkId::from_str("net-1") },
        status: ObjectiveStatus::Pending,
        required: true,
    };
    let v = serde_json::to_value(&objective).unwrap();
    assert_eq!(v["type"], "networkConnection");
    assert_eq!(v["networkId"], "net-1");
    assert_eq!(v["status"], "pending");

    let back: Objective = serde_json::from_value(v).unwrap();
    assert_eq!(back, objective);
}

#[test]
fn test_objective_required_defaults_to_true() {
    let v = serde_json::json!({
        "id": "obj-9",
        "description": "Verify",
        "type": "verification"
    });
    let objective: Objective = serde_json::from_value(v).unwrap();
    assert!(objective.required);
    assert!(objective.is_verification());
    assert_eq!(objective.status, ObjectiveStatus::Pending);
}

#[test]
fn test_last_arc_step() {
    let step = ArcStep {
        arc_id: ArcId::from_str("arc-1"),
        arc_name: "Paper Trail".to_string(),
        sequence: 2,
        total: 2,
        requires_completed_mission: None,
    };
    assert!(step.is_last());
}
