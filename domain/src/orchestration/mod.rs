//! Orchestration subdomain: the dispatch state machine and its result types.

pub mod entities;
pub mod value_objects;
