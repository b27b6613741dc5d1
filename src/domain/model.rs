use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const NAME_COLUMN: &str = "Name";
pub const SCRAPED_ADDRESS_COLUMN: &str = "ScrapedAddress";
pub const UPDATED_FIELDS_COLUMN: &str = "UpdatedFields";

/// One row of the dataset. `None` is the native "no value" marker (an empty cell).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, Option<String>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.data.get(column).and_then(|v| v.as_deref())
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.data.insert(column.to_string(), Some(value.into()));
    }

    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.set(column, value);
        self
    }
}

/// Ordered columns plus ordered rows. The row set is fixed once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, records: Vec<Record>) -> Self {
        Self { columns, records }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Appends `column` if absent; existing rows get an empty cell. Returns true if added.
    pub fn ensure_column(&mut self, column: &str) -> bool {
        if self.has_column(column) {
            return false;
        }
        self.columns.push(column.to_string());
        for record in &mut self.records {
            record.data.entry(column.to_string()).or_insert(None);
        }
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Which group of address columns a run operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum AddressRole {
    Billing,
    Shipping,
}

impl AddressRole {
    pub fn prefix(&self) -> &'static str {
        match self {
            AddressRole::Billing => "Billing",
            AddressRole::Shipping => "Shipping",
        }
    }

    pub fn column(&self, field: AddressField) -> String {
        format!("{}{}", self.prefix(), field.suffix())
    }

    /// Concrete column names in [`AddressField::ALL`] order.
    pub fn columns(&self) -> Vec<String> {
        AddressField::ALL.iter().map(|f| self.column(*f)).collect()
    }
}

impl fmt::Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for AddressRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "billing" => Ok(AddressRole::Billing),
            "shipping" => Ok(AddressRole::Shipping),
            other => Err(format!("unknown address role '{}' (expected billing or shipping)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Street,
    City,
    State,
    PostalCode,
    Country,
}

impl AddressField {
    /// Query and merge order.
    pub const ALL: [AddressField; 5] = [
        AddressField::Street,
        AddressField::City,
        AddressField::State,
        AddressField::PostalCode,
        AddressField::Country,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            AddressField::Street => "Street",
            AddressField::City => "City",
            AddressField::State => "State",
            AddressField::PostalCode => "PostalCode",
            AddressField::Country => "Country",
        }
    }

    /// Component type that fills this field. Street is assembled from two components.
    pub fn component_type(&self) -> Option<&'static str> {
        match self {
            AddressField::Street => None,
            AddressField::City => Some("locality"),
            AddressField::State => Some("administrative_area_level_1"),
            AddressField::PostalCode => Some("postal_code"),
            AddressField::Country => Some("country"),
        }
    }
}

/// One entry of a candidate's `address_components`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponent {
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    pub fn new(long_name: &str, types: &[&str]) -> Self {
        Self {
            long_name: Some(long_name.to_string()),
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// First candidate returned by the provider for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(GeocodeResult),
    NotFound,
    RateLimited,
}

/// What the reconciler did with one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// Nothing missing, or no usable `Name`. No lookup and no audit write.
    Ineligible,
    /// Provider quota exhausted. The record is untouched and the run must stop.
    RateLimited,
    NotFound,
    CountryRejected { country: Option<String> },
    /// Candidate accepted. `updated` holds the written column names, possibly none.
    Merged { updated: Vec<String> },
}

impl Reconciliation {
    /// Text written to `UpdatedFields`, if this outcome writes one.
    pub fn audit(&self) -> Option<String> {
        match self {
            Reconciliation::Ineligible | Reconciliation::RateLimited => None,
            Reconciliation::NotFound => Some("Not found".to_string()),
            Reconciliation::CountryRejected { country } => Some(format!(
                "Skipped (non-US result: {})",
                country.as_deref().unwrap_or("None")
            )),
            Reconciliation::Merged { updated } if updated.is_empty() => {
                Some("None (already complete)".to_string())
            }
            Reconciliation::Merged { updated } => Some(updated.join(", ")),
        }
    }

    pub fn performed_lookup(&self) -> bool {
        !matches!(self, Reconciliation::Ineligible | Reconciliation::RateLimited)
    }
}
