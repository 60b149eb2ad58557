//! Geo-ranking of availability entries.

use medipharm_core::{AvailabilityEntry, GeoPoint, haversine_km};

/// Comparison sentinel for an undefined distance. Never surfaced to the
/// caller.
const UNDEFINED_DISTANCE: f64 = f64::INFINITY;

/// Assigns great-circle distances from `origin` and orders entries by
/// distance ascending, pharmacy id as the tie-break.
///
/// Without an origin every distance is undefined and the aggregation
/// order is preserved untouched. Entries whose distance is undefined
/// sort after all defined-distance entries.
pub fn rank_by_distance(entries: &mut [AvailabilityEntry], origin: Option<GeoPoint>) {
    let Some(origin) = origin else {
        return;
    };

    for entry in entries.iter_mut() {
        entry.distance_km = Some(haversine_km(origin, entry.pharmacy.position()));
    }

    entries.sort_by(|a, b| {
        let da = a.distance_km.unwrap_or(UNDEFINED_DISTANCE);
        let db = b.distance_km.unwrap_or(UNDEFINED_DISTANCE);
        da.total_cmp(&db).then_with(|| a.pharmacy.id.cmp(&b.pharmacy.id))
    });
}
