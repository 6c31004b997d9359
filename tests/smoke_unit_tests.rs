//! Smoke Screen Unit tests for the tendering components
//!
//! These span the public API and mostly test the happy path of each piece
//! in isolation: ids, status sets, merge rules, config and error helpers.

use tendering::{
    EntityError,
    config::{CollisionPolicy, ControllerConfig, StoreConfig},
    entity::{Entity, Patch, Payload, Snapshot},
    kind::{EntityKind, StatusSet},
    proposal::{Proposal, ProposalFields, ProposalStatus},
    tender::{ServiceType, Tender, TenderFields, TenderPatch, TenderStatus},
    types::TimeStamp,
    utils::new_uuid_to_bech32,
};

// UTILS MODULE TESTS
mod utils_tests {
    use super::*;

    /// new_uuid_to_bech32 produces a bech32 string with the requested prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let encoded = new_uuid_to_bech32(Tender::HRP).unwrap();
        assert!(encoded.starts_with("tender_1"));
        assert!(encoded.len() > 10);
    }

    #[test]
    fn handles_empty_hrp() {
        assert!(new_uuid_to_bech32("").is_err());
    }

    #[test]
    fn generates_unique_ids() {
        let id1 = new_uuid_to_bech32(Proposal::HRP).unwrap();
        let id2 = new_uuid_to_bech32(Proposal::HRP).unwrap();
        assert_ne!(id1, id2);
    }
}

// KIND TESTS
mod kind_tests {
    use super::*;

    /// Every status round-trips through its wire spelling
    #[test]
    fn statuses_round_trip_through_wire_names() {
        for status in [TenderStatus::Created, TenderStatus::Published, TenderStatus::Closed] {
            assert_eq!(TenderStatus::parse(status.as_str()), Some(status));
        }
        for status in [
            ProposalStatus::Created,
            ProposalStatus::Published,
            ProposalStatus::Canceled,
        ] {
            assert_eq!(ProposalStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn both_kinds_start_created() {
        assert_eq!(TenderStatus::INITIAL, TenderStatus::Created);
        assert_eq!(ProposalStatus::INITIAL, ProposalStatus::Created);
    }

    /// Enumerations are per kind
    #[test]
    fn statuses_do_not_leak_between_kinds() {
        assert_eq!(TenderStatus::parse("CANCELED"), None);
        assert_eq!(ProposalStatus::parse("CLOSED"), None);
    }

    #[test]
    fn kinds_use_separate_trees() {
        let trees = [
            Tender::RECORD_TREE,
            Tender::LEDGER_TREE,
            Proposal::RECORD_TREE,
            Proposal::LEDGER_TREE,
        ];
        for (i, a) in trees.iter().enumerate() {
            for b in &trees[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn service_type_parses_wire_names() {
        assert_eq!(ServiceType::parse("it"), Some(ServiceType::It));
        assert_eq!(ServiceType::parse("SUPPLY"), Some(ServiceType::Supply));
        assert_eq!(ServiceType::parse("catering"), None);
        assert_eq!(TenderFields::new().service_type, ServiceType::Consulting);
    }

    #[test]
    fn full_patch_replaces_every_field() {
        let fields = TenderFields::new()
            .set_title("old")
            .set_description("old")
            .set_service_type(ServiceType::Supply);
        let patch = TenderPatch::new()
            .set_title("new title")
            .set_description("new description")
            .set_service_type("construction");

        let merged = Tender::merge(&fields, &patch).unwrap();
        assert_eq!(
            merged,
            TenderFields::new()
                .set_title("new title")
                .set_description("new description")
                .set_service_type(ServiceType::Construction)
        );
    }

    #[test]
    fn proposal_requires_tender() {
        let res = Proposal::validate(&ProposalFields::new(""));
        assert!(matches!(res, Err(EntityError::InvalidPayload(_))));
    }
}

// ENTITY TESTS
mod entity_tests {
    use super::*;

    #[test]
    fn patch_builder_sets_status() {
        let patch: Patch<TenderPatch> = Patch::new().set_status("PUBLISHED");
        assert_eq!(patch.status.as_deref(), Some("PUBLISHED"));
        assert!(patch.fields.title.is_none());
    }

    #[test]
    fn snapshot_digest_tracks_payload() {
        let entity = Entity {
            id: "proposal_1".to_string(),
            owner: "org_1".to_string(),
            payload: Payload::new(ProposalStatus::Published, ProposalFields::new("tender_1")),
            version: 3,
            created_at: TimeStamp::new(),
            updated_at: TimeStamp::new(),
        };

        let a = Snapshot::capture("snapshot_a".into(), &entity).unwrap();
        let b = Snapshot::capture("snapshot_b".into(), &entity).unwrap();
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.digest, entity.payload.digest().unwrap());
        assert_eq!(a.digest.len(), 64);
    }
}

// CONFIG AND ERROR TESTS
mod config_tests {
    use super::*;

    #[test]
    fn builder_methods_apply() {
        let config = ControllerConfig::default()
            .with_max_retries(3)
            .with_strict_transitions(true)
            .with_collision_policy(CollisionPolicy::Reject);

        assert_eq!(config.max_retries, 3);
        assert!(config.strict_transitions);
        assert_eq!(config.on_snapshot_collision, CollisionPolicy::Reject);
    }

    #[test]
    fn temporary_store_opens() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            temporary: true,
            ..StoreConfig::new(temp_dir.path().join("smoke.db"))
        };
        let db = config.open().unwrap();
        assert!(db.is_empty());
    }

    #[test]
    fn only_conflicts_are_retryable() {
        let conflict = EntityError::VersionConflict {
            id: "tender_1".into(),
            version: 2,
            collision: false,
        };
        let collision = EntityError::VersionConflict {
            id: "tender_1".into(),
            version: 2,
            collision: true,
        };
        let missing = EntityError::VersionNotFound {
            kind: "tender",
            id: "tender_1".into(),
            version: 2,
        };

        assert!(conflict.is_retryable());
        assert!(!collision.is_retryable());
        assert!(!missing.is_retryable());
        assert_eq!(
            missing.to_string(),
            "tender tender_1 has no snapshot for version 2"
        );
    }
}
