//! Service layer API for tender and proposal operations
use std::sync::Arc;

use crate::config::{ControllerConfig, StoreConfig};
use crate::controller::VersionedEntityController;
use crate::entity::{Patch, Record, SnapshotOf};
use crate::error::{EntityError, Result};
use crate::gate::Directory;
use crate::proposal::{Proposal, ProposalFields, ProposalPatch};
use crate::store::SledStore;
use crate::tender::{Tender, TenderFields, TenderPatch};

pub type TenderController = VersionedEntityController<Tender, SledStore<Tender>>;
pub type ProposalController = VersionedEntityController<Proposal, SledStore<Proposal>>;

/// Both record kinds over one sled database, sharing one organization directory.
pub struct TenderingService {
    instance: Arc<sled::Db>,
    directory: Arc<Directory>,
    tenders: TenderController,
    proposals: ProposalController,
}

impl TenderingService {
    pub fn new(
        instance: Arc<sled::Db>,
        directory: Arc<Directory>,
        config: ControllerConfig,
    ) -> Result<Self> {
        let tenders = VersionedEntityController::new(
            SledStore::open(&instance)?,
            directory.clone(),
            directory.clone(),
            config.clone(),
        );
        let proposals = VersionedEntityController::new(
            SledStore::open(&instance)?,
            directory.clone(),
            directory.clone(),
            config,
        );

        Ok(Self {
            instance,
            directory,
            tenders,
            proposals,
        })
    }

    /// Opens the database described by `store` and builds the service on top.
    pub fn open(store: &StoreConfig, config: ControllerConfig) -> Result<Self> {
        let db = store.open()?;
        Self::new(Arc::new(db), Arc::new(Directory::new()), config)
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn tenders(&self) -> &TenderController {
        &self.tenders
    }

    pub fn proposals(&self) -> &ProposalController {
        &self.proposals
    }

    /// Publish a new tender on behalf of `organization`
    pub fn create_tender(
        &self,
        organization: &str,
        fields: TenderFields,
        status: Option<&str>,
    ) -> Result<Record<Tender>> {
        self.tenders.create(organization, fields, status)
    }

    /// Edit a tender's fields and/or status, recording the prior version
    pub fn edit_tender(
        &self,
        tender_id: &str,
        fields: TenderPatch,
        status: Option<&str>,
        caller: &str,
    ) -> Result<Record<Tender>> {
        let patch = Patch {
            status: status.map(str::to_string),
            fields,
        };
        self.tenders.edit(tender_id, &patch, caller)
    }

    /// Move a tender to another status without touching its history
    pub fn set_tender_status(
        &self,
        tender_id: &str,
        status: &str,
        caller: &str,
    ) -> Result<Record<Tender>> {
        self.tenders.transition_status(tender_id, status, caller)
    }

    pub fn rollback_tender(
        &self,
        tender_id: &str,
        version: u32,
        caller: &str,
    ) -> Result<Record<Tender>> {
        self.tenders.rollback(tender_id, version, caller)
    }

    pub fn tender_history(&self, tender_id: &str) -> Result<Vec<SnapshotOf<Tender>>> {
        self.tenders.history(tender_id)
    }

    /// Submit a proposal from `organization` against an existing tender
    pub fn submit_proposal(
        &self,
        tender_id: &str,
        organization: &str,
        status: Option<&str>,
    ) -> Result<Record<Proposal>> {
        match self.tenders.get(tender_id) {
            Ok(_) => {}
            Err(EntityError::NotFound { .. }) => {
                return Err(EntityError::InvalidReference(format!(
                    "tender {tender_id} does not exist"
                )));
            }
            Err(e) => return Err(e),
        }

        self.proposals
            .create(organization, ProposalFields::new(tender_id), status)
    }

    /// Edit a proposal, recording the prior version. Only status is editable.
    pub fn edit_proposal(
        &self,
        proposal_id: &str,
        status: Option<&str>,
        caller: &str,
    ) -> Result<Record<Proposal>> {
        let patch = Patch {
            status: status.map(str::to_string),
            fields: ProposalPatch,
        };
        self.proposals.edit(proposal_id, &patch, caller)
    }

    pub fn set_proposal_status(
        &self,
        proposal_id: &str,
        status: &str,
        caller: &str,
    ) -> Result<Record<Proposal>> {
        self.proposals.transition_status(proposal_id, status, caller)
    }

    pub fn rollback_proposal(
        &self,
        proposal_id: &str,
        version: u32,
        caller: &str,
    ) -> Result<Record<Proposal>> {
        self.proposals.rollback(proposal_id, version, caller)
    }

    pub fn proposal_history(&self, proposal_id: &str) -> Result<Vec<SnapshotOf<Proposal>>> {
        self.proposals.history(proposal_id)
    }

    /// Block until everything written so far is on disk.
    pub fn flush(&self) -> Result<()> {
        self.instance.flush()?;
        Ok(())
    }
}
