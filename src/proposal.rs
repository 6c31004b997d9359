//! Proposal records: an organization's bid on a tender
use crate::error::{EntityError, Result};
use crate::kind::{EntityKind, StatusSet};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ProposalStatus {
    #[n(0)]
    Created,
    #[n(1)]
    Published,
    #[n(2)]
    Canceled,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, Eq, PartialEq)]
pub struct ProposalFields {
    #[n(0)]
    pub tender: String, // id of the tender bid on, fixed at creation
}

/// Proposals carry no editable fields besides status.
#[derive(Debug, Default, Clone)]
pub struct ProposalPatch;

#[derive(Debug)]
pub struct Proposal;

impl StatusSet for ProposalStatus {
    const INITIAL: Self = ProposalStatus::Created;

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "CREATED" => Some(Self::Created),
            "PUBLISHED" => Some(Self::Published),
            "CANCELED" => Some(Self::Canceled),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Published => "PUBLISHED",
            Self::Canceled => "CANCELED",
        }
    }

    fn can_transition(&self, next: Self) -> bool {
        use ProposalStatus::*;
        matches!(
            (self, next),
            (Created, Published) | (Created, Canceled) | (Published, Canceled)
        ) || *self == next
    }
}

impl ProposalFields {
    pub fn new(tender: &str) -> Self {
        Self {
            tender: tender.to_string(),
        }
    }
}

impl EntityKind for Proposal {
    const NAME: &'static str = "proposal";
    const HRP: &'static str = "proposal_";
    const RECORD_TREE: &'static str = "proposals";
    const LEDGER_TREE: &'static str = "proposal_versions";

    type Status = ProposalStatus;
    type Fields = ProposalFields;
    type FieldPatch = ProposalPatch;

    fn validate(fields: &ProposalFields) -> Result<()> {
        if fields.tender.is_empty() {
            return Err(EntityError::InvalidPayload(
                "proposal does not name a tender".into(),
            ));
        }
        Ok(())
    }

    fn merge(fields: &ProposalFields, _: &ProposalPatch) -> Result<ProposalFields> {
        Ok(fields.clone())
    }
}
