//! Time helpers used by the history recorder's health-band classification.

use chrono::{DateTime, Utc};

/// Heartbeat interval health band (spec'd thresholds: normal <= 35s,
/// warning <= 60s, else abnormal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthBand {
    Normal,
    Warning,
    Abnormal,
}

impl HealthBand {
    pub fn from_interval_secs(interval: i64) -> Self {
        if interval <= 35 {
            Self::Normal
        } else if interval <= 60 {
            Self::Warning
        } else {
            Self::Abnormal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Abnormal => "abnormal",
        }
    }
}

pub fn now() -> DateTime<Utc> {
    Utc::now()
}
