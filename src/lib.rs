//! Offline-first request interception cache.
//!
//! Same-origin GET requests are routed to a cache-first or network-first
//! strategy and answered from versioned cache generations, which are
//! installed, activated and garbage-collected by the lifecycle manager.

pub mod cache;
pub mod config;
pub mod event;
pub mod lifecycle;
pub mod net;
pub mod notify;
pub mod strategy;
pub mod worker;
