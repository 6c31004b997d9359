//! Concurrent writers against one record
//!
//! Edits race on the same record from many threads. Whatever the interleaving,
//! successful edits must hand out distinct, gap-free versions and each must
//! build on the one before it.

use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::tempdir;
use tendering::{
    VersionedEntityController,
    config::ControllerConfig,
    entity::Patch,
    gate::Directory,
    kind::EntityKind,
    store::{MemoryStore, SledStore, VersionedStore},
    tender::{Tender, TenderFields, TenderPatch},
};

const ORG: &str = "org_race";
const THREADS: usize = 8;
const EDITS_PER_THREAD: usize = 10;

fn directory() -> Arc<Directory> {
    let directory = Arc::new(Directory::new());
    directory.add_organization(ORG);
    for n in 0..THREADS {
        directory.add_member(ORG, &format!("writer_{n}"));
    }
    directory
}

/// Runs THREADS x EDITS_PER_THREAD edits on one tender.
///
/// Returns the version each edit produced alongside the title it wrote.
fn race<S>(store: S) -> (Arc<VersionedEntityController<Tender, S>>, String, Vec<(u32, String)>)
where
    S: VersionedStore<Tender> + 'static,
{
    let directory = directory();
    // generous retry budget so every edit eventually lands
    let config = ControllerConfig::default().with_max_retries(10_000);
    let ctl = Arc::new(VersionedEntityController::new(
        store,
        directory.clone(),
        directory,
        config,
    ));

    let tender = ctl
        .create(
            ORG,
            TenderFields::new()
                .set_title("Contended")
                .set_description("Edited from many threads"),
            None,
        )
        .unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|n| {
            let ctl = ctl.clone();
            let barrier = barrier.clone();
            let id = tender.id.clone();
            thread::spawn(move || {
                barrier.wait();
                let caller = format!("writer_{n}");
                (0..EDITS_PER_THREAD)
                    .map(|i| {
                        let title = format!("{caller} #{i}");
                        let patch = Patch::new().with_fields(TenderPatch::new().set_title(&title));
                        (ctl.edit(&id, &patch, &caller).unwrap().version, title)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let edits = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    (ctl, tender.id, edits)
}

fn assert_gap_free<K: EntityKind, S: VersionedStore<K>>(
    ctl: &VersionedEntityController<K, S>,
    id: &str,
    edits: &[(u32, String)],
) {
    let total = (THREADS * EDITS_PER_THREAD) as u32;
    let versions: Vec<u32> = edits.iter().map(|(v, _)| *v).collect();

    let unique: BTreeSet<u32> = versions.iter().copied().collect();
    assert_eq!(unique.len(), versions.len(), "duplicate versions handed out");
    assert_eq!(unique, (2..=total + 1).collect::<BTreeSet<_>>());

    assert_eq!(ctl.get(id).unwrap().version, total + 1);
    let ledger: Vec<u32> = ctl.history(id).unwrap().iter().map(|s| s.version).collect();
    assert_eq!(ledger, (1..=total).collect::<Vec<_>>());
}

#[test]
fn concurrent_edits_in_memory() {
    let (ctl, id, edits) = race(MemoryStore::<Tender>::new());
    assert_gap_free(&ctl, &id, &edits);
}

#[test]
fn concurrent_edits_on_sled() {
    let temp_dir = tempdir().unwrap();
    let db = sled::open(temp_dir.path().join("race.db")).unwrap();
    let (ctl, id, edits) = race(SledStore::<Tender>::open(&db).unwrap());
    assert_gap_free(&ctl, &id, &edits);
}

#[test]
fn no_edit_is_lost() {
    let (ctl, id, edits) = race(MemoryStore::<Tender>::new());
    let total = (THREADS * EDITS_PER_THREAD) as u32;

    // each edit's title is what the next edit captured, or the head for the last one
    for (version, title) in &edits {
        let written = if *version == total + 1 {
            ctl.get(&id).unwrap().payload.fields.title
        } else {
            ctl.snapshot(&id, *version).unwrap().payload.fields.title
        };
        assert_eq!(&written, title, "edit at version {version} was overwritten");
    }
}

#[test]
fn tight_retry_budget_surfaces_conflicts() {
    let directory = directory();
    let ctl = Arc::new(VersionedEntityController::<Tender, _>::new(
        MemoryStore::new(),
        directory.clone(),
        directory,
        ControllerConfig::default().with_max_retries(1),
    ));
    let tender = ctl
        .create(
            ORG,
            TenderFields::new().set_title("t").set_description("d"),
            None,
        )
        .unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|n| {
            let ctl = ctl.clone();
            let barrier = barrier.clone();
            let id = tender.id.clone();
            thread::spawn(move || {
                barrier.wait();
                let caller = format!("writer_{n}");
                (0..EDITS_PER_THREAD)
                    .filter_map(|_| {
                        let patch = Patch::new().with_fields(TenderPatch::new().set_title(&caller));
                        match ctl.edit(&id, &patch, &caller) {
                            Ok(t) => Some(t.version),
                            Err(e) => {
                                assert!(e.is_retryable(), "unexpected error: {e}");
                                None
                            }
                        }
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let versions: Vec<u32> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    // whether or not anything lost, the winners still form a gap-free run
    let unique: BTreeSet<u32> = versions.iter().copied().collect();
    assert_eq!(unique.len(), versions.len());
    let latest = ctl.get(&tender.id).unwrap().version;
    assert_eq!(unique, (2..=latest).collect::<BTreeSet<_>>());
}
