//! Walks one tender and one proposal through edits and rollbacks against a sled database.
//!
//! The database location and controller behaviour come from `TENDERING_*`
//! environment variables; `RUST_LOG` controls log output.
use anyhow::Context;
use tracing_subscriber::prelude::*;

use tendering::TenderingService;
use tendering::config::{ControllerConfig, StoreConfig};
use tendering::tender::{ServiceType, TenderFields, TenderPatch};

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tendering=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let service = TenderingService::open(&StoreConfig::from_env(), ControllerConfig::from_env())
        .context("failed to open database")?;

    let directory = service.directory();
    directory.add_organization("org_buyer");
    directory.add_organization("org_supplier");
    directory.add_member("org_buyer", "alice");
    directory.add_member("org_supplier", "bob");

    let tender = service.create_tender(
        "org_buyer",
        TenderFields::new()
            .set_title("Warehouse roof")
            .set_description("Replace 2000m2 of roofing")
            .set_service_type(ServiceType::Construction),
        None,
    )?;
    println!("created {} v{}", tender.id, tender.version);

    let tender = service.edit_tender(
        &tender.id,
        TenderPatch::new().set_title("Warehouse roof and gutters"),
        None,
        "alice",
    )?;
    let tender = service.edit_tender(&tender.id, TenderPatch::new(), Some("PUBLISHED"), "alice")?;
    println!(
        "edited to v{}: {:?} / {:?}",
        tender.version,
        tender.fields().title,
        tender.status()
    );

    for snapshot in service.tender_history(&tender.id)? {
        println!(
            "  v{} {:?} {:?}",
            snapshot.version, snapshot.payload.fields.title, snapshot.payload.status
        );
    }

    let proposal = service.submit_proposal(&tender.id, "org_supplier", None)?;
    let proposal = service.edit_proposal(&proposal.id, Some("PUBLISHED"), "bob")?;
    println!("proposal {} v{} {:?}", proposal.id, proposal.version, proposal.status());

    if let Err(e) = service.edit_tender(&tender.id, TenderPatch::new(), Some("CLOSED"), "bob") {
        println!("bob cannot close the tender: {e}");
    }

    let tender = service.rollback_tender(&tender.id, 1, "alice")?;
    println!(
        "rolled back to v{}: {:?} / {:?}",
        tender.version,
        tender.fields().title,
        tender.status()
    );

    service.flush()?;
    Ok(())
}
