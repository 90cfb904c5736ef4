//! Scheduler layer
//!
//! This layer keeps the dashboard's job list fresh. It decides when to poll
//! the backend and reconciles each fetched snapshot into the displayed list.

pub mod poller;

pub use poller::{JobListSnapshot, JobStatusPoller, PollerHandle};
