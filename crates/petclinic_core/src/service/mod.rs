//! Use-case services.
//!
//! # Responsibility
//! - Give boundary layers one entry point per repository operation.
//! - Hold the user-registration rules that sit above the repository.
//!
//! # Invariants
//! - Services only see repository contracts, never a concrete backend.

pub mod clinic_service;
pub mod user_service;
