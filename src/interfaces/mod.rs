//! Delivery mechanisms: the OCPP transport adapters and the minimal
//! admin HTTP surface.

pub mod http;
pub mod transport;
