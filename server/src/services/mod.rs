//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own provider calls and business logic so route handlers
//! can stay focused on protocol translation and auth plumbing.

pub mod gate;
pub mod profile;
pub mod verifier;
