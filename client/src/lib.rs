//! # client
//!
//! Session core of the SeatScout mobile client.
//!
//! This crate keeps the client's view of "who is signed in" in step with the
//! identity provider, runs the login/signup/logout flows, and calls the
//! SeatScout API with the current bearer token. Rendering and navigation live
//! in the app shell and consume [`session::SessionStore`] through
//! [`session::SessionStore::read`] and [`session::SessionStore::watch`].

pub mod api;
pub mod auth;
pub mod config;
pub mod provider;
pub mod session;

#[cfg(test)]
mod test_support;
