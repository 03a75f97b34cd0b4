//! Transaction + Order lifecycle (spec.md §3 Transaction/Order entities).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Ongoing,
    Completed,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<&str> for TransactionStatus {
    fn from(s: &str) -> Self {
        match s {
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Ongoing,
        }
    }
}

/// Transaction (surrogate integer id, carries the protocol-visible
/// `transaction_id` — the two are the same value here since this core
/// allocates the protocol id as the primary key, matching the teacher's
/// entity shape).
///
/// Invariant T1: exactly one `Ongoing` transaction per charger at any
/// instant (enforced by the dispatcher's concurrency check, not this type).
/// Invariant T2: `end_time > start_time` when set.
/// Invariant T3: `energy_kwh == charging_rate_kw * duration_minutes / 60`
/// within +/-0.01 kWh, unless a real meter reading superseded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i32,
    pub charger_id: String,
    pub id_tag: String,
    pub user_id: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub meter_start: i64,
    pub meter_stop: Option<i64>,
    pub energy_kwh: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub charging_rate_kw: f64,
    pub price_snapshot: i64,
    pub total_cost: Option<f64>,
    pub status: TransactionStatus,
    /// True once a real (non-derived) MeterValues reading has arrived
    /// during this transaction; T3's formula no longer applies once set.
    pub meter_superseded: bool,
}

impl Transaction {
    pub fn new(
        id: i32,
        charger_id: impl Into<String>,
        id_tag: impl Into<String>,
        meter_start: i64,
        charging_rate_kw: f64,
        price_snapshot: i64,
    ) -> Self {
        Self {
            id,
            charger_id: charger_id.into(),
            id_tag: id_tag.into(),
            user_id: None,
            start_time: Utc::now(),
            end_time: None,
            meter_start,
            meter_stop: None,
            energy_kwh: None,
            duration_minutes: None,
            charging_rate_kw,
            price_snapshot,
            total_cost: None,
            status: TransactionStatus::Ongoing,
            meter_superseded: false,
        }
    }

    /// T2/T3 derivation on stop. If `real_meter_wh` is `Some`, it supersedes
    /// the rate*duration formula for `energy_kwh` per spec.md §3's note
    /// ("when real meter values arrive they override the derivation").
    pub fn stop(&mut self, end_time: DateTime<Utc>, real_meter_wh: Option<i64>) {
        self.end_time = Some(end_time);
        let duration_minutes = (end_time - self.start_time).num_milliseconds() as f64 / 60_000.0;
        self.duration_minutes = Some(duration_minutes);

        let energy_kwh = if let Some(wh) = real_meter_wh {
            self.meter_stop = Some(wh);
            self.meter_superseded = true;
            (wh - self.meter_start) as f64 / 1000.0
        } else {
            self.charging_rate_kw * duration_minutes / 60.0
        };
        self.energy_kwh = Some(energy_kwh);
        self.total_cost = Some(energy_kwh * self.price_snapshot as f64);
        self.status = TransactionStatus::Completed;
    }

    pub fn order_id(&self) -> String {
        format!("order_{}", self.id)
    }
}

/// Order: business-facing view of a Transaction (spec.md §3 Order entity).
/// Invariant O1: one-to-one with its Transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub transaction_id: i32,
    pub charger_id: String,
    pub user_id: Option<String>,
    pub energy_kwh: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub total_cost: Option<f64>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn from_transaction(tx: &Transaction) -> Self {
        let now = Utc::now();
        Self {
            id: tx.order_id(),
            transaction_id: tx.id,
            charger_id: tx.charger_id.clone(),
            user_id: tx.user_id.clone(),
            energy_kwh: tx.energy_kwh,
            duration_minutes: tx.duration_minutes,
            total_cost: tx.total_cost,
            status: tx.status,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn sync_from_transaction(&mut self, tx: &Transaction) {
        self.energy_kwh = tx.energy_kwh;
        self.duration_minutes = tx.duration_minutes;
        self.total_cost = tx.total_cost;
        self.status = tx.status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn derives_energy_from_rate_when_no_real_meter() {
        let mut tx = Transaction::new(1, "CP001", "U42", 0, 7.0, 2700);
        let end = tx.start_time + Duration::minutes(2);
        tx.stop(end, None);
        let expected = 7.0 * 2.0 / 60.0;
        assert!((tx.energy_kwh.unwrap() - expected).abs() <= 0.01);
        assert_eq!(tx.status, TransactionStatus::Completed);
        assert!(tx.total_cost.is_some());
    }

    #[test]
    fn real_meter_overrides_derivation() {
        let mut tx = Transaction::new(1, "CP001", "U42", 0, 7.0, 2700);
        let end = tx.start_time + Duration::minutes(2);
        tx.stop(end, Some(3000));
        assert_eq!(tx.energy_kwh, Some(3.0));
        assert!(tx.meter_superseded);
    }

    #[test]
    fn end_after_start() {
        let mut tx = Transaction::new(1, "CP001", "U42", 0, 7.0, 2700);
        let end = tx.start_time + Duration::seconds(1);
        tx.stop(end, None);
        assert!(tx.end_time.unwrap() > tx.start_time);
    }

    #[test]
    fn order_is_one_to_one_with_transaction() {
        let mut tx = Transaction::new(7, "CP001", "U42", 0, 7.0, 2700);
        tx.stop(tx.start_time + Duration::minutes(1), None);
        let order = Order::from_transaction(&tx);
        assert_eq!(order.id, "order_7");
        assert_eq!(order.transaction_id, 7);
        assert_eq!(order.total_cost, tx.total_cost);
    }
}
