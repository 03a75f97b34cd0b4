//! Session value type: per-charger volatile protocol state (spec.md §3).

/// One per Charger, lives in the connection registry, not persisted
/// directly (the persisted view is derived from Transaction/Order rows at
/// load — see spec.md §9 on the Charger/Session cyclic reference).
///
/// Invariant S1: `transaction_id` present iff `order_id` present.
/// Invariant S2: if the owning Charger's status is `Available`, both are
/// absent — enforced by the dispatcher's repair path, not by this type.
/// Invariant S3: `meter_wh` is non-decreasing within a single transaction.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub authorized: bool,
    pub transaction_id: Option<i32>,
    pub order_id: Option<String>,
    pub meter_wh: Option<i64>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// S1: start a transaction, pairing transaction/order ids atomically.
    pub fn start_transaction(&mut self, transaction_id: i32) {
        self.transaction_id = Some(transaction_id);
        self.order_id = Some(format!("order_{}", transaction_id));
        self.meter_wh = None;
    }

    /// Repair/stop path: clear transaction + order together (S1).
    pub fn clear_transaction(&mut self) {
        self.transaction_id = None;
        self.order_id = None;
        self.meter_wh = None;
    }

    pub fn has_active_transaction(&self) -> bool {
        self.transaction_id.is_some()
    }

    /// S3: reject a lower meter reading silently, return whether it was applied.
    pub fn update_meter(&mut self, wh: i64) -> bool {
        let accept = match self.meter_wh {
            Some(current) => wh >= current,
            None => true,
        };
        if accept {
            self.meter_wh = Some(wh);
        }
        accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_pairs_transaction_and_order() {
        let mut s = Session::new();
        s.start_transaction(42);
        assert_eq!(s.transaction_id, Some(42));
        assert_eq!(s.order_id.as_deref(), Some("order_42"));
    }

    #[test]
    fn clear_removes_both() {
        let mut s = Session::new();
        s.start_transaction(1);
        s.clear_transaction();
        assert!(s.transaction_id.is_none());
        assert!(s.order_id.is_none());
    }

    #[test]
    fn meter_rejects_regression() {
        let mut s = Session::new();
        assert!(s.update_meter(100));
        assert!(s.update_meter(150));
        assert!(!s.update_meter(120));
        assert_eq!(s.meter_wh, Some(150));
    }
}
