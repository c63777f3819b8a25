//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce ownership and visibility rules per operation.
//!
//! # Invariants
//! - Every mutating operation starts with an explicit owner-equality check.
//! - Services remain storage-agnostic behind the repository traits.

pub mod task_service;
