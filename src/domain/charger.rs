//! Charger entity and its OCPP 1.6 status vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full OCPP 1.6 charger status vocabulary (spec.md §3/§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargerStatus {
    Unknown,
    Available,
    Preparing,
    Charging,
    SuspendedEV,
    SuspendedEVSE,
    Finishing,
    Reserved,
    Unavailable,
    Faulted,
    Offline,
}

impl ChargerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Available => "Available",
            Self::Preparing => "Preparing",
            Self::Charging => "Charging",
            Self::SuspendedEV => "SuspendedEV",
            Self::SuspendedEVSE => "SuspendedEVSE",
            Self::Finishing => "Finishing",
            Self::Reserved => "Reserved",
            Self::Unavailable => "Unavailable",
            Self::Faulted => "Faulted",
            Self::Offline => "Offline",
        }
    }
}

impl std::fmt::Display for ChargerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for ChargerStatus {
    fn from(s: &str) -> Self {
        match s {
            "Available" => Self::Available,
            "Preparing" => Self::Preparing,
            "Charging" => Self::Charging,
            "SuspendedEV" => Self::SuspendedEV,
            "SuspendedEVSE" => Self::SuspendedEVSE,
            "Finishing" => Self::Finishing,
            "Reserved" => Self::Reserved,
            "Unavailable" => Self::Unavailable,
            "Faulted" => Self::Faulted,
            "Offline" => Self::Offline,
            _ => Self::Unknown,
        }
    }
}

/// Charger aggregate root (spec.md §3 Charger entity).
///
/// Invariant C1: if `status == Available`, the charger has no active
/// transaction (enforced by the dispatcher's repair path, not stored here).
/// Invariant C2: `last_seen` is monotonically non-decreasing; callers must
/// not regress it (`Charger::touch` enforces this).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Charger {
    pub id: String,
    pub vendor: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub firmware_version: Option<String>,
    pub connector_type: Option<String>,
    pub charging_rate_kw: f64,
    pub tariff_per_kwh: i64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub status: ChargerStatus,
    pub last_seen: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Charger {
    pub fn new(id: impl Into<String>, default_rate_kw: f64, default_tariff: i64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            vendor: None,
            model: None,
            serial_number: None,
            firmware_version: None,
            connector_type: None,
            charging_rate_kw: default_rate_kw,
            tariff_per_kwh: default_tariff,
            latitude: None,
            longitude: None,
            address: None,
            status: ChargerStatus::Unknown,
            last_seen: now,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance `last_seen`, enforcing C2 (never regresses).
    pub fn touch(&mut self, at: DateTime<Utc>) {
        if at > self.last_seen {
            self.last_seen = at;
        }
        self.updated_at = Utc::now();
    }

    pub fn set_status(&mut self, status: ChargerStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
