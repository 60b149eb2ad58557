//! Domain entities and derived result types.
//!
//! Catalog entities (`Medication`, `Pharmacy`, `InventoryEntry`) are owned
//! by external services; the engine only reads them. The `*Summary` types
//! are the display projections embedded in search results and never expose
//! matching internals such as the stored lowercase forms or operational
//! counters.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::geo::GeoPoint;

/// Identifier of a medication in the catalog.
pub type MedicationId = i64;
/// Identifier of a pharmacy.
pub type PharmacyId = i64;
/// Identifier of an inventory row.
pub type InventoryId = i64;
/// Opaque caller identity supplied by the auth layer. Never validated here.
pub type CallerId = i64;

/// Galenic form of a medication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DosageForm {
    Tablet,
    Capsule,
    Injection,
    Drops,
    Ointment,
    Syrup,
    Cream,
    Powder,
    Spray,
    Inhaler,
    Suppository,
    Other,
}

impl DosageForm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tablet => "tablet",
            Self::Capsule => "capsule",
            Self::Injection => "injection",
            Self::Drops => "drops",
            Self::Ointment => "ointment",
            Self::Syrup => "syrup",
            Self::Cream => "cream",
            Self::Powder => "powder",
            Self::Spray => "spray",
            Self::Inhaler => "inhaler",
            Self::Suppository => "suppository",
            Self::Other => "other",
        }
    }
}

/// A medication catalog entry.
///
/// `name_lowercase` and `dci_lowercase` are stored normalized forms used by
/// text matching; they are derived from `name` and `dci` on construction
/// and kept in sync by the owning catalog service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: MedicationId,
    pub name: String,
    /// Canonical generic-name code (dénomination commune internationale).
    pub dci: String,
    pub name_lowercase: String,
    pub dci_lowercase: String,
    pub description: Option<String>,
    pub dosage: Option<String>,
    pub form: DosageForm,
    pub manufacturer: Option<String>,
    pub requires_prescription: bool,
    pub is_active: bool,
    /// Number of times this medication was returned as a search match.
    /// Monotonic non-decreasing; increments are best effort.
    pub search_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Medication {
    /// Creates an active medication with derived lowercase forms.
    pub fn new(id: MedicationId, name: impl Into<String>, dci: impl Into<String>, form: DosageForm) -> Self {
        let name = name.into();
        let dci = dci.into();
        let now = crate::time::now_utc();
        Self {
            name_lowercase: name.to_lowercase(),
            dci_lowercase: dci.to_lowercase(),
            id,
            name,
            dci,
            description: None,
            dosage: None,
            form,
            manufacturer: None,
            requires_prescription: false,
            is_active: true,
            search_count: 0,
            created_at: now,
            updated_at: None,
        }
    }

    #[must_use]
    pub fn with_dosage(mut self, dosage: impl Into<String>) -> Self {
        self.dosage = Some(dosage.into());
        self
    }

    #[must_use]
    pub fn with_search_count(mut self, count: u64) -> Self {
        self.search_count = count;
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// A pharmacy as read by the engine. Only active pharmacies' positions
/// are ever used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pharmacy {
    pub id: PharmacyId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    /// Position in decimal degrees.
    pub latitude: f64,
    pub longitude: f64,
    pub is_active: bool,
    pub is_verified: bool,
    pub average_rating: Option<f64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Pharmacy {
    pub fn new(
        id: PharmacyId,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            address: String::new(),
            city: String::new(),
            country: String::new(),
            phone_number: None,
            website: None,
            email: None,
            latitude,
            longitude,
            is_active: true,
            is_verified: false,
            average_rating: None,
            created_at: crate::time::now_utc(),
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>, city: impl Into<String>) -> Self {
        self.address = address.into();
        self.city = city.into();
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// A pharmacy's stock entry for one medication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub id: InventoryId,
    pub pharmacy_id: PharmacyId,
    pub medication_id: MedicationId,
    /// Units in stock. Absent is treated as zero.
    pub quantity: Option<u32>,
    pub price: Option<f64>,
    pub is_available: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expiry_date: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_updated: Option<OffsetDateTime>,
}

impl InventoryEntry {
    pub fn new(id: InventoryId, pharmacy_id: PharmacyId, medication_id: MedicationId) -> Self {
        Self {
            id,
            pharmacy_id,
            medication_id,
            quantity: None,
            price: None,
            is_available: true,
            expiry_date: None,
            last_updated: None,
        }
    }

    #[must_use]
    pub fn with_stock(mut self, quantity: u32, price: Option<f64>) -> Self {
        self.quantity = Some(quantity);
        self.price = price;
        self
    }

    #[must_use]
    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }

    /// Units in stock, with absent quantity read as zero.
    pub fn stocked_quantity(&self) -> u32 {
        self.quantity.unwrap_or(0)
    }

    /// An entry counts as available only when flagged available and
    /// holding positive stock.
    pub fn is_in_stock(&self) -> bool {
        self.is_available && self.stocked_quantity() > 0
    }
}

/// Display projection of a medication embedded in search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSummary {
    pub id: MedicationId,
    pub name: String,
    pub dci: String,
    pub form: DosageForm,
    pub dosage: Option<String>,
    pub requires_prescription: bool,
}

impl From<&Medication> for MedicationSummary {
    fn from(m: &Medication) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            dci: m.dci.clone(),
            form: m.form,
            dosage: m.dosage.clone(),
            requires_prescription: m.requires_prescription,
        }
    }
}

/// Display projection of a pharmacy embedded in availability entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PharmacySummary {
    pub id: PharmacyId,
    pub name: String,
    pub address: String,
    pub city: String,
    pub phone_number: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl PharmacySummary {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

impl From<&Pharmacy> for PharmacySummary {
    fn from(p: &Pharmacy) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            address: p.address.clone(),
            city: p.city.clone(),
            phone_number: p.phone_number.clone(),
            latitude: p.latitude,
            longitude: p.longitude,
        }
    }
}

/// One pharmacy currently stocking a matched medication. Ephemeral,
/// built per search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityEntry {
    pub pharmacy: PharmacySummary,
    /// Price as carried on the inventory row; never zero-defaulted.
    pub price: Option<f64>,
    pub quantity: u32,
    /// Great-circle distance from the caller's position, when one was
    /// supplied.
    pub distance_km: Option<f64>,
}

/// One matched medication together with the pharmacies stocking it,
/// ordered per the geo-ranking rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub medication: MedicationSummary,
    pub available_at: Vec<AvailabilityEntry>,
}

/// Append-only record of a resolved search. Written best effort after the
/// response is composed, even on zero matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryRecord {
    pub caller_id: Option<CallerId>,
    pub query_text: String,
    pub result_count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub searched_at: OffsetDateTime,
}

impl SearchHistoryRecord {
    pub fn new(caller_id: Option<CallerId>, query_text: impl Into<String>, result_count: u32) -> Self {
        Self {
            caller_id,
            query_text: query_text.into(),
            result_count,
            searched_at: crate::time::now_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medication_derives_lowercase_forms() {
        let m = Medication::new(1, "Amoxicilline", "AMOXICILLIN", DosageForm::Capsule);
        assert_eq!(m.name_lowercase, "amoxicilline");
        assert_eq!(m.dci_lowercase, "amoxicillin");
        assert!(m.is_active);
        assert_eq!(m.search_count, 0);
    }

    #[test]
    fn inventory_stock_rules() {
        let base = InventoryEntry::new(1, 10, 20);
        assert_eq!(base.stocked_quantity(), 0);
        assert!(!base.is_in_stock());

        let stocked = base.clone().with_stock(5, Some(12.5));
        assert!(stocked.is_in_stock());

        // Flagged available but zero quantity is not in stock.
        let empty = base.clone().with_stock(0, None);
        assert!(empty.is_available);
        assert!(!empty.is_in_stock());

        // Positive quantity but flagged unavailable is not in stock.
        let off = base.with_stock(3, None).unavailable();
        assert!(!off.is_in_stock());
    }

    #[test]
    fn summaries_project_display_fields() {
        let m = Medication::new(7, "Doliprane", "Paracetamol", DosageForm::Tablet)
            .with_dosage("500 mg");
        let s = MedicationSummary::from(&m);
        assert_eq!(s.id, 7);
        assert_eq!(s.dosage.as_deref(), Some("500 mg"));

        let p = Pharmacy::new(3, "Pharmacie Centrale", 48.8566, 2.3522)
            .with_address("1 rue de Rivoli", "Paris");
        let ps = PharmacySummary::from(&p);
        assert_eq!(ps.city, "Paris");
        assert_eq!(ps.position(), p.position());
    }

    #[test]
    fn search_result_serializes_camel_case() {
        let m = Medication::new(1, "Aspirine", "acetylsalicylic acid", DosageForm::Tablet);
        let result = SearchResult {
            medication: MedicationSummary::from(&m),
            available_at: vec![],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("availableAt").is_some());
        assert!(json["medication"].get("requiresPrescription").is_some());
    }

    #[test]
    fn history_record_carries_result_count() {
        let r = SearchHistoryRecord::new(Some(42), "amox", 3);
        assert_eq!(r.caller_id, Some(42));
        assert_eq!(r.result_count, 3);

        let anonymous = SearchHistoryRecord::new(None, "amox", 0);
        assert!(anonymous.caller_id.is_none());
    }
}
