//! # Impf Core
//!
//! Pure logic shared by the vaccination dossier front ends.
//!
//! This crate contains two independent pieces:
//! - [`wire_codec`]: conversion of JSON payloads between wire date strings and application-side
//!   date values, keyed off a field-name heuristic and a timezone policy
//! - [`status`]: ranking and grouping of [`DossierStatus`] values, including the guard against
//!   comparing two booster-phase statuses
//!
//! **No transport concerns**: content-type gating, HTTP bodies and CLI I/O belong in `api-rest`
//! and `impf-cli`. Everything here is synchronous and free of shared mutable state.

pub mod config;
pub mod constants;
pub mod error;
pub mod status;
pub mod timezone;
pub mod wire_codec;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use impf_types::DossierStatus;
pub use status::{is_at_most, ordinal_of, parse_status, StatusGroup, StatusSet};
pub use timezone::{TimezonePolicy, TimezoneSource};
pub use wire_codec::{AppValue, DateFieldHeuristic, DateTimeWireCodec};
