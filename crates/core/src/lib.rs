//! Apotheca
//!
//! Apotheca is the pure reconciliation core of a pharmacy storefront client:
//! basket merge and quantity rules, product identity resolution, batch
//! selection, and order-status projection. It performs no I/O; the
//! `apotheca-app` crate wires it to a backend and to durable client storage.

pub mod basket;
pub mod products;
pub mod status;
