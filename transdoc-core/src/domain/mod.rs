//! Core domain types
//!
//! This module contains the structures the translation backend hands out.
//! The client never mutates them; it only re-fetches and replaces its view.

pub mod job;
pub mod language;
mod timestamp;
pub mod user;
