//! Transdoc Core
//!
//! Core types and abstractions for the Transdoc translation dashboard.
//!
//! This crate contains:
//! - Domain types: Translation jobs, languages and users as the backend reports them
//! - DTOs: Request bodies sent to the translation backend
//! - Validation: Checks performed client-side before a submission leaves the machine

pub mod domain;
pub mod dto;
pub mod validation;
