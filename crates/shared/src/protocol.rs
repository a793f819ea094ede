use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, StageName};

pub const OPPORTUNITIES_PATH: &str = "/api/opportunities";
pub const NEW_OPPORTUNITIES_PATH: &str = "/api/opportunities/new";
pub const STAGE_NAMES_PATH: &str = "/api/opportunities/stagenames";
pub const ACCOUNTS_PATH: &str = "/api/opportunities/accounts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFilter {
    #[default]
    All,
    NewOnly,
}

impl ListFilter {
    pub fn from_new_only(new_only: bool) -> Self {
        if new_only {
            Self::NewOnly
        } else {
            Self::All
        }
    }

    pub fn is_new_only(self) -> bool {
        matches!(self, Self::NewOnly)
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::All => OPPORTUNITIES_PATH,
            Self::NewOnly => NEW_OPPORTUNITIES_PATH,
        }
    }
}

/// One row of the create payload translation: form field name on the left,
/// key the backend expects on the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    pub client: &'static str,
    pub wire: &'static str,
}

/// Draft field to wire key table for `POST /api/opportunities`.
///
/// The backend expects the account reference as `AccountId`; every other
/// field keeps its form name.
pub const CREATE_OPPORTUNITY_FIELDS: &[FieldMapping] = &[
    FieldMapping {
        client: "name",
        wire: "name",
    },
    FieldMapping {
        client: "amount",
        wire: "amount",
    },
    FieldMapping {
        client: "stageName",
        wire: "stageName",
    },
    FieldMapping {
        client: "closeDate",
        wire: "closeDate",
    },
    FieldMapping {
        client: "accountId",
        wire: "AccountId",
    },
    FieldMapping {
        client: "description",
        wire: "description",
    },
];

pub fn wire_field_name(client: &str) -> Option<&'static str> {
    CREATE_OPPORTUNITY_FIELDS
        .iter()
        .find(|mapping| mapping.client == client)
        .map(|mapping| mapping.wire)
}

/// Body of `POST /api/opportunities`. Serde renames follow
/// [`CREATE_OPPORTUNITY_FIELDS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOpportunityRequest {
    pub name: String,
    pub amount: f64,
    #[serde(rename = "stageName")]
    pub stage_name: StageName,
    /// `YYYY-MM-DD`, or empty when the form left it blank.
    #[serde(rename = "closeDate")]
    pub close_date: String,
    #[serde(rename = "AccountId")]
    pub account_id: AccountId,
    pub description: String,
}
