//! Reminder notifications: outbound mail seam and the due-soon batch job.
//!
//! # Responsibility
//! - Define the mailer contract the dispatcher sends through.
//! - Run the periodic due-soon scan and report per-task outcomes.
//!
//! # Invariants
//! - The dispatcher only reads task state; it never mutates the store.
//! - One task's delivery failure never aborts the remaining tasks.

pub mod dispatcher;
pub mod mailer;
