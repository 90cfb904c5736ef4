//! Data Transfer Objects for the translation backend
//!
//! Request bodies the dashboard sends. Responses are the domain types
//! themselves since the backend is the source of truth for them.

pub mod translation;
