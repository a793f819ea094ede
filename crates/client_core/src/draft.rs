use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use shared::{
    domain::{AccountId, StageName},
    protocol::CreateOpportunityRequest,
};
use crate::error::ValidationError;

/// Editable field of the create form, named as the form names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Name,
    Amount,
    StageName,
    CloseDate,
    AccountId,
    Description,
}

impl DraftField {
    pub const ALL: [DraftField; 6] = [
        DraftField::Name,
        DraftField::Amount,
        DraftField::StageName,
        DraftField::CloseDate,
        DraftField::AccountId,
        DraftField::Description,
    ];

    pub fn form_name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Amount => "amount",
            Self::StageName => "stageName",
            Self::CloseDate => "closeDate",
            Self::AccountId => "accountId",
            Self::Description => "description",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_name())
    }
}

/// Unsubmitted create-form contents. Every field is raw text as typed or
/// selected; an empty string means "not filled in".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpportunityDraft {
    pub name: String,
    pub amount: String,
    pub stage_name: String,
    pub close_date: String,
    pub account_id: String,
    pub description: String,
}

impl OpportunityDraft {
    pub fn set(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::Name => self.name = value,
            DraftField::Amount => self.amount = value,
            DraftField::StageName => self.stage_name = value,
            DraftField::CloseDate => self.close_date = value,
            DraftField::AccountId => self.account_id = value,
            DraftField::Description => self.description = value,
        }
    }

    pub fn get(&self, field: DraftField) -> &str {
        match field {
            DraftField::Name => &self.name,
            DraftField::Amount => &self.amount,
            DraftField::StageName => &self.stage_name,
            DraftField::CloseDate => &self.close_date,
            DraftField::AccountId => &self.account_id,
            DraftField::Description => &self.description,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validates and converts the draft into the create payload. Nothing is
    /// sent when this fails.
    pub fn to_request(&self) -> Result<CreateOpportunityRequest, ValidationError> {
        let amount = parse_amount(&self.amount)?;
        let close_date = normalize_close_date(&self.close_date)?;

        Ok(CreateOpportunityRequest {
            name: self.name.clone(),
            amount,
            stage_name: StageName(self.stage_name.clone()),
            close_date,
            account_id: AccountId(self.account_id.clone()),
            description: self.description.clone(),
        })
    }
}

pub fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|amount| amount.is_finite())
        .ok_or(ValidationError::InvalidAmount)
}

/// Reduces a date or timestamp to `YYYY-MM-DD`. Offset timestamps are
/// converted to UTC before the time of day is dropped.
pub fn normalize_close_date(raw: &str) -> Result<String, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(String::new());
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|ts| ts.with_timezone(&Utc).date_naive())
        })
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|ts| ts.date())
        })
        .ok_or(ValidationError::InvalidCloseDate)?;

    Ok(date.format("%Y-%m-%d").to_string())
}
