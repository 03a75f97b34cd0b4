//! Shared helpers used by every per-action handler: load-or-create the
//! Charger aggregate, touch `last_seen` (C2), and persist tolerating a
//! transient repository failure (spec.md §7: the protocol response must
//! still go out even when the write failed).

use tracing::warn;

use crate::application::dispatcher::Services;
use crate::domain::charger::Charger;

pub async fn load_or_create_charger(services: &Services, charger_id: &str) -> Charger {
    match services.chargers.find_by_id(charger_id).await {
        Ok(Some(charger)) => charger,
        Ok(None) => Charger::new(
            charger_id,
            services.default_charging_rate_kw,
            services.default_tariff_per_kwh,
        ),
        Err(e) => {
            warn!(charger_id, error = %e, "charger lookup failed, using transient in-memory record");
            Charger::new(
                charger_id,
                services.default_charging_rate_kw,
                services.default_tariff_per_kwh,
            )
        }
    }
}

/// Persist, logging and swallowing a transient failure rather than
/// propagating it — the in-memory view stays authoritative until the next
/// successful write (spec.md §9).
pub async fn persist_charger(services: &Services, charger: &Charger) {
    if let Err(e) = services.chargers.upsert(charger).await {
        warn!(charger_id = %charger.id, error = %e, "failed to persist charger, protocol response still returned");
    }
}
