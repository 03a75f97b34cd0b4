//! ID generation helpers shared by the command layer and node bootstrap.

use uuid::Uuid;

/// Unique message id for an outbound OCPP-J call, `"CS-<uuid>"`.
pub fn new_message_id() -> String {
    format!("CS-{}", Uuid::new_v4())
}

/// Transaction id for a `StartTransaction` that didn't supply one: epoch
/// seconds at call time, matching the source's fallback generation.
pub fn epoch_transaction_id() -> i32 {
    chrono::Utc::now().timestamp() as i32
}

/// Node id for distributed mode: `<hostname>-<8 hex chars>`.
pub fn generate_node_id() -> String {
    let hostname = hostname_or_default();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", hostname, &suffix[..8])
}

fn hostname_or_default() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "node".to_string())
}
