//! Object storage gateways.
//!
//! The [`backend::StorageGateway`] trait abstracts over the bucket the
//! catalog is read from and managed in.  Implementations are a gateway to
//! AWS S3 (or a compatible endpoint) and an in-memory store.

pub mod aws;
pub mod backend;
pub mod listing;
pub mod memory;

#[cfg(test)]
pub(crate) mod testing;
