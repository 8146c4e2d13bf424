//! Credential rotation
//!
//! The [`KeyRotationManager`](manager::KeyRotationManager) is the only owner
//! of credential pools at runtime. It is built once from configuration and
//! shared by reference with every caller.

pub mod manager;
