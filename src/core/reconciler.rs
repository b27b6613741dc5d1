use crate::core::components::{derive_street, extract};
use crate::core::country::is_acceptable;
use crate::core::presence::is_missing;
use crate::core::query::build_query;
use crate::domain::model::{
    AddressField, AddressRole, LookupOutcome, Reconciliation, Record, SCRAPED_ADDRESS_COLUMN,
    UPDATED_FIELDS_COLUMN,
};
use crate::domain::ports::GeocodingProvider;

/// Per-record enrichment for one address role.
///
/// Fills only fields that are missing; values already present are never replaced.
pub struct Reconciler<G: GeocodingProvider> {
    provider: G,
    role: AddressRole,
}

impl<G: GeocodingProvider> Reconciler<G> {
    pub fn new(provider: G, role: AddressRole) -> Self {
        Self { provider, role }
    }

    pub fn role(&self) -> AddressRole {
        self.role
    }

    pub fn needs_enrichment(&self, record: &Record) -> bool {
        self.role
            .columns()
            .iter()
            .any(|column| is_missing(record.get(column)))
    }

    /// The query this record would be looked up with, or `None` if it is ineligible.
    pub fn planned_query(&self, record: &Record) -> Option<String> {
        if !self.needs_enrichment(record) {
            return None;
        }
        build_query(record, self.role)
    }

    pub async fn reconcile(&self, index: usize, record: &mut Record) -> Reconciliation {
        tracing::debug!("🟡 Row {} raw values:", index);
        for column in self.role.columns() {
            tracing::debug!("  {}: '{}'", column, record.get(&column).unwrap_or(""));
        }

        let Some(query) = self.planned_query(record) else {
            tracing::debug!("Row {}: nothing to enrich", index);
            return Reconciliation::Ineligible;
        };

        tracing::info!("🔍 Row {}: Searching for '{}'", index, query);
        let candidate = match self.provider.lookup(&query).await {
            LookupOutcome::RateLimited => {
                tracing::warn!("🚫 Row {}: provider quota exhausted", index);
                return Reconciliation::RateLimited;
            }
            LookupOutcome::NotFound => {
                tracing::info!("❌ Row {}: No address found", index);
                return self.finish(record, Reconciliation::NotFound);
            }
            LookupOutcome::Found(candidate) => candidate,
        };

        tracing::debug!("📦 Formatted address: {}", candidate.formatted_address);
        for component in &candidate.address_components {
            tracing::debug!(
                "  - {:?}: {}",
                component.types,
                component.long_name.as_deref().unwrap_or("")
            );
        }

        let components = &candidate.address_components;
        let country = extract(components, "country");
        if !is_acceptable(country) {
            tracing::info!(
                "⛔ Row {}: Skipped - non-US address returned: {}",
                index,
                country.unwrap_or("None")
            );
            let outcome = Reconciliation::CountryRejected {
                country: country.map(str::to_string),
            };
            return self.finish(record, outcome);
        }

        record.set(SCRAPED_ADDRESS_COLUMN, candidate.formatted_address.as_str());

        let mut updated = Vec::new();
        for field in AddressField::ALL {
            let column = self.role.column(field);
            if !is_missing(record.get(&column)) {
                continue;
            }

            let value = match field.component_type() {
                Some(component_type) => extract(components, component_type).map(str::to_string),
                None => Some(derive_street(components)).filter(|s| !s.is_empty()),
            };

            if let Some(value) = value {
                tracing::info!("    {} = {}", column, value);
                record.set(&column, value);
                updated.push(column);
            }
        }

        self.finish(record, Reconciliation::Merged { updated })
    }

    fn finish(&self, record: &mut Record, outcome: Reconciliation) -> Reconciliation {
        if let Some(audit) = outcome.audit() {
            if matches!(outcome, Reconciliation::Merged { .. }) {
                tracing::info!("✅ Updated → {}", audit);
            }
            record.set(UPDATED_FIELDS_COLUMN, audit);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AddressComponent, GeocodeResult};
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct ScriptedProvider {
        outcomes: Arc<Mutex<VecDeque<LookupOutcome>>>,
        queries: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedProvider {
        fn new(outcomes: Vec<LookupOutcome>) -> Self {
            Self {
                outcomes: Arc::new(Mutex::new(outcomes.into())),
                queries: Arc::new(Mutex::new(Vec::new())),
            }
        }

        async fn queries(&self) -> Vec<String> {
            self.queries.lock().await.clone()
        }
    }

    #[async_trait::async_trait]
    impl GeocodingProvider for ScriptedProvider {
        async fn lookup(&self, query: &str) -> LookupOutcome {
            self.queries.lock().await.push(query.to_string());
            self.outcomes
                .lock()
                .await
                .pop_front()
                .unwrap_or(LookupOutcome::NotFound)
        }
    }

    fn acme() -> Record {
        Record::new()
            .with("Name", "Acme")
            .with("BillingStreet", "TBD")
            .with("BillingCity", "Austin")
            .with("BillingState", "TX")
            .with("BillingPostalCode", "")
            .with("BillingCountry", "USA")
    }

    fn candidate(country: &str) -> LookupOutcome {
        LookupOutcome::Found(GeocodeResult {
            formatted_address: "100 Main St, Austin, TX 78701, USA".to_string(),
            address_components: vec![
                AddressComponent::new("100", &["street_number"]),
                AddressComponent::new("Main St", &["route"]),
                AddressComponent::new("Austin", &["locality", "political"]),
                AddressComponent::new("Texas", &["administrative_area_level_1", "political"]),
                AddressComponent::new(country, &["country", "political"]),
                AddressComponent::new("78701", &["postal_code"]),
            ],
        })
    }

    #[tokio::test]
    async fn test_merges_missing_fields_only() {
        let provider = ScriptedProvider::new(vec![candidate("United States")]);
        let reconciler = Reconciler::new(provider.clone(), AddressRole::Billing);
        let mut record = acme();

        let outcome = reconciler.reconcile(0, &mut record).await;

        assert_eq!(provider.queries().await, vec!["Acme, Austin, TX, USA"]);
        assert_eq!(
            outcome,
            Reconciliation::Merged {
                updated: vec!["BillingStreet".to_string(), "BillingPostalCode".to_string()]
            }
        );
        assert_eq!(record.get("BillingStreet"), Some("100 Main St"));
        assert_eq!(record.get("BillingPostalCode"), Some("78701"));
        // present values are kept even though the provider disagrees
        assert_eq!(record.get("BillingState"), Some("TX"));
        assert_eq!(record.get("BillingCountry"), Some("USA"));
        assert_eq!(
            record.get("ScrapedAddress"),
            Some("100 Main St, Austin, TX 78701, USA")
        );
        assert_eq!(
            record.get("UpdatedFields"),
            Some("BillingStreet, BillingPostalCode")
        );
    }

    #[tokio::test]
    async fn test_foreign_country_rejects_whole_candidate() {
        let provider = ScriptedProvider::new(vec![candidate("Canada")]);
        let reconciler = Reconciler::new(provider, AddressRole::Billing);
        let mut record = acme();
        let before = record.clone();

        let outcome = reconciler.reconcile(0, &mut record).await;

        assert_eq!(
            outcome,
            Reconciliation::CountryRejected {
                country: Some("Canada".to_string())
            }
        );
        let mut expected = before;
        expected.set("UpdatedFields", "Skipped (non-US result: Canada)");
        assert_eq!(record, expected);
        assert_eq!(record.get("ScrapedAddress"), None);
    }

    #[tokio::test]
    async fn test_candidate_without_country_is_rejected() {
        let provider = ScriptedProvider::new(vec![LookupOutcome::Found(GeocodeResult {
            formatted_address: "Somewhere".to_string(),
            address_components: vec![AddressComponent::new("Main St", &["route"])],
        })]);
        let reconciler = Reconciler::new(provider, AddressRole::Billing);
        let mut record = acme();

        let outcome = reconciler.reconcile(3, &mut record).await;

        assert_eq!(outcome, Reconciliation::CountryRejected { country: None });
        assert_eq!(
            record.get("UpdatedFields"),
            Some("Skipped (non-US result: None)")
        );
        assert_eq!(record.get("BillingStreet"), Some("TBD"));
    }

    #[tokio::test]
    async fn test_not_found_only_writes_audit() {
        let provider = ScriptedProvider::new(vec![LookupOutcome::NotFound]);
        let reconciler = Reconciler::new(provider, AddressRole::Billing);
        let mut record = acme();
        let before = record.clone();

        let outcome = reconciler.reconcile(0, &mut record).await;

        assert_eq!(outcome, Reconciliation::NotFound);
        let mut expected = before;
        expected.set("UpdatedFields", "Not found");
        assert_eq!(record, expected);
    }

    #[tokio::test]
    async fn test_rate_limit_leaves_record_untouched() {
        let provider = ScriptedProvider::new(vec![LookupOutcome::RateLimited]);
        let reconciler = Reconciler::new(provider, AddressRole::Billing);
        let mut record = acme();
        let before = record.clone();

        let outcome = reconciler.reconcile(0, &mut record).await;

        assert_eq!(outcome, Reconciliation::RateLimited);
        assert_eq!(record, before);
    }

    #[tokio::test]
    async fn test_complete_record_is_never_queried() {
        let provider = ScriptedProvider::new(vec![candidate("United States")]);
        let reconciler = Reconciler::new(provider.clone(), AddressRole::Billing);
        let mut record = Record::new()
            .with("Name", "Acme")
            .with("BillingStreet", "1 Congress Ave")
            .with("BillingCity", "Austin")
            .with("BillingState", "TX")
            .with("BillingPostalCode", "78701")
            .with("BillingCountry", "USA");
        let before = record.clone();

        let outcome = reconciler.reconcile(0, &mut record).await;

        assert_eq!(outcome, Reconciliation::Ineligible);
        assert_eq!(record, before);
        assert!(provider.queries().await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_name_is_never_queried() {
        let provider = ScriptedProvider::new(vec![candidate("United States")]);
        let reconciler = Reconciler::new(provider.clone(), AddressRole::Billing);
        let mut record = acme();
        record.data.insert("Name".to_string(), None);
        let before = record.clone();

        let outcome = reconciler.reconcile(0, &mut record).await;

        assert_eq!(outcome, Reconciliation::Ineligible);
        assert_eq!(record, before);
        assert!(provider.queries().await.is_empty());
    }

    #[tokio::test]
    async fn test_nothing_to_fill_reports_already_complete() {
        // street is missing but the candidate has no route to fill it from
        let provider = ScriptedProvider::new(vec![LookupOutcome::Found(GeocodeResult {
            formatted_address: "Austin, TX, USA".to_string(),
            address_components: vec![
                AddressComponent::new("Austin", &["locality"]),
                AddressComponent::new("United States", &["country"]),
            ],
        })]);
        let reconciler = Reconciler::new(provider, AddressRole::Billing);
        let mut record = acme();
        record.set("BillingPostalCode", "78701");

        let outcome = reconciler.reconcile(0, &mut record).await;

        assert_eq!(outcome, Reconciliation::Merged { updated: vec![] });
        assert_eq!(record.get("UpdatedFields"), Some("None (already complete)"));
        assert_eq!(record.get("ScrapedAddress"), Some("Austin, TX, USA"));
        assert_eq!(record.get("BillingStreet"), Some("TBD"));
    }

    #[tokio::test]
    async fn test_shipping_role_fills_every_missing_field() {
        let provider = ScriptedProvider::new(vec![candidate("Puerto Rico")]);
        let reconciler = Reconciler::new(provider.clone(), AddressRole::Shipping);
        let mut record = Record::new()
            .with("Name", "Isla Supply")
            .with("BillingCity", "Austin");

        let outcome = reconciler.reconcile(0, &mut record).await;

        assert_eq!(provider.queries().await, vec!["Isla Supply"]);
        assert_eq!(
            outcome,
            Reconciliation::Merged {
                updated: AddressRole::Shipping.columns()
            }
        );
        assert_eq!(record.get("ShippingStreet"), Some("100 Main St"));
        assert_eq!(record.get("ShippingCity"), Some("Austin"));
        assert_eq!(record.get("ShippingState"), Some("Texas"));
        assert_eq!(record.get("ShippingPostalCode"), Some("78701"));
        assert_eq!(record.get("ShippingCountry"), Some("Puerto Rico"));
        assert_eq!(record.get("BillingCity"), Some("Austin"));
    }

    #[tokio::test]
    async fn test_rerun_on_output_changes_nothing_filled() {
        let provider = ScriptedProvider::new(vec![
            candidate("United States"),
            LookupOutcome::Found(GeocodeResult {
                formatted_address: "200 Other Rd, Dallas, TX 75201, USA".to_string(),
                address_components: vec![
                    AddressComponent::new("200", &["street_number"]),
                    AddressComponent::new("Other Rd", &["route"]),
                    AddressComponent::new("Dallas", &["locality"]),
                    AddressComponent::new("United States", &["country"]),
                    AddressComponent::new("75201", &["postal_code"]),
                ],
            }),
        ]);
        let reconciler = Reconciler::new(provider.clone(), AddressRole::Billing);
        let mut record = acme();
        record.data.insert("BillingCity".to_string(), None);

        reconciler.reconcile(0, &mut record).await;
        assert_eq!(record.get("BillingCity"), Some("Austin"));
        let first_pass = record.clone();

        // every field is now filled, so the second pass must not look anything up
        let outcome = reconciler.reconcile(0, &mut record).await;
        assert_eq!(outcome, Reconciliation::Ineligible);
        assert_eq!(record, first_pass);
        assert_eq!(provider.queries().await.len(), 1);
    }
}
