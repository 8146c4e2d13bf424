//! Credential pools and rotation bookkeeping.
//!
//! A [`CredentialPool`](entities::CredentialPool) holds the ordered API keys
//! for one backend together with their rate-limit state. All transitions are
//! pure functions of an explicit `now`, so the caller decides how time and
//! locking are provided.

pub mod entities;
pub mod rotation_log;
pub mod value_objects;
