//! Application layer containing the transfer orchestration.
//!
//! `TransferEngine` drives a basket through freeze, gateway submission and
//! persistence, using the ports defined in the domain layer.

pub mod config;
pub mod engine;
