//! Roomstage - Virtual Staging Backend
//!
//! This crate implements the prepaid-credit ledger and staging-job
//! orchestration behind an AI virtual-staging product: organizations buy
//! credits through a payment provider and spend them on staging jobs, one
//! credit per attempt.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
