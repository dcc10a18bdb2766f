// app/src/services/mod.rs

//! Entry points called by the HTTP handlers. Each takes the shared state and the
//! caller's `RequestContext`, and reports user-facing outcomes as notices.

pub mod booking;
pub mod cart_store;
pub mod catalog;
pub mod checkout;
pub mod order_history;
pub mod payment_gateway;
pub mod reviews;
