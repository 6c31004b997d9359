//! Tender records: a call for bids published by an organization
use crate::error::{EntityError, Result};
use crate::kind::{EntityKind, StatusSet};

/// Longest accepted title, in characters.
pub const MAX_TITLE_LEN: usize = 255;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum TenderStatus {
    #[n(0)]
    Created,
    #[n(1)]
    Published,
    #[n(2)]
    Closed,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, Default, Eq, PartialEq, Hash)]
pub enum ServiceType {
    #[default]
    #[n(0)]
    Consulting,
    #[n(1)]
    Construction,
    #[n(2)]
    Supply,
    #[n(3)]
    It,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, Eq, PartialEq)]
pub struct TenderFields {
    #[n(0)]
    pub title: String,
    #[n(1)]
    pub description: String,
    #[n(2)]
    pub service_type: ServiceType,
}

/// Field half of a tender edit. Service type arrives in its wire spelling.
#[derive(Debug, Default, Clone)]
pub struct TenderPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub service_type: Option<String>,
}

#[derive(Debug)]
pub struct Tender;

impl StatusSet for TenderStatus {
    const INITIAL: Self = TenderStatus::Created;

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "CREATED" => Some(Self::Created),
            "PUBLISHED" => Some(Self::Published),
            "CLOSED" => Some(Self::Closed),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Published => "PUBLISHED",
            Self::Closed => "CLOSED",
        }
    }

    fn can_transition(&self, next: Self) -> bool {
        use TenderStatus::*;
        matches!(
            (self, next),
            (Created, Published) | (Created, Closed) | (Published, Closed)
        ) || *self == next
    }
}

impl ServiceType {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "CONSULTING" => Some(Self::Consulting),
            "CONSTRUCTION" => Some(Self::Construction),
            "SUPPLY" => Some(Self::Supply),
            "IT" => Some(Self::It),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consulting => "CONSULTING",
            Self::Construction => "CONSTRUCTION",
            Self::Supply => "SUPPLY",
            Self::It => "IT",
        }
    }
}

impl TenderFields {
    /// Construct an empty draft, filled in with the setters below
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }
    pub fn set_service_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = service_type;
        self
    }
}

impl TenderPatch {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
    pub fn set_service_type(mut self, service_type: &str) -> Self {
        self.service_type = Some(service_type.to_string());
        self
    }
}

impl EntityKind for Tender {
    const NAME: &'static str = "tender";
    const HRP: &'static str = "tender_";
    const RECORD_TREE: &'static str = "tenders";
    const LEDGER_TREE: &'static str = "tender_versions";

    type Status = TenderStatus;
    type Fields = TenderFields;
    type FieldPatch = TenderPatch;

    fn validate(fields: &TenderFields) -> Result<()> {
        if fields.title.trim().is_empty() {
            return Err(EntityError::InvalidPayload("tender title is empty".into()));
        }
        if fields.title.chars().count() > MAX_TITLE_LEN {
            return Err(EntityError::InvalidPayload(format!(
                "tender title exceeds {MAX_TITLE_LEN} characters"
            )));
        }
        if fields.description.trim().is_empty() {
            return Err(EntityError::InvalidPayload(
                "tender description is empty".into(),
            ));
        }
        Ok(())
    }

    fn merge(fields: &TenderFields, patch: &TenderPatch) -> Result<TenderFields> {
        let mut merged = fields.clone();

        if let Some(title) = &patch.title {
            merged.title = title.clone();
        }
        if let Some(description) = &patch.description {
            merged.description = description.clone();
        }
        if let Some(raw) = &patch.service_type {
            merged.service_type = ServiceType::parse(raw).ok_or_else(|| {
                EntityError::InvalidPayload(format!("unknown service type {raw:?}"))
            })?;
        }

        Self::validate(&merged)?;
        Ok(merged)
    }
}
