//! # Protocol Layer
//!
//! Policy above the codecs: packet routing, flood relay, and the node
//! composition that the application layer drives.
//!
//! ## Components
//! - **Dispatcher**: per-packet-type handler routing
//! - **Relay**: TTL budgeting and duplicate suppression for flood relay
//! - **Events**: what inbound handling reports to the application
//! - **Node**: identity + codecs + transport wired together

pub mod dispatcher;
pub mod events;
pub mod node;
pub mod relay;
