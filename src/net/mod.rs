//! HTTP-shaped request/response types and the network capability.

mod client;
mod types;

pub use client::{HttpNetwork, Network, NetworkError};
pub use types::{Request, Response};

#[cfg(test)]
pub mod testing;
