//! Client-side synchronization engine for live round-by-round fight scoring:
//! durable offline queueing, idempotent submission with bounded retry,
//! optimistic cache projection, and push-driven cache invalidation.

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod remote;
pub mod services;
pub mod state;
