//! Network side of a query: name resolution and the SNTP exchange.

pub mod ntp_client;
pub mod resolver;
