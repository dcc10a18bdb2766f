// app/src/lib.rs

//! Wanderkart: travel bookings and a travel-essentials shop.
//!
//! Multi-step operations (cart writes, checkout, bookings) run as pipelines on
//! `wanderkart_flow`; all persistence goes through the `Gateway` trait.

pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod pipelines;
pub mod pricing;
pub mod seed;
pub mod services;
pub mod session;
pub mod state;
pub mod web;
