//! Common types for the sniper workspace.
//!
//! Everything here lives only for the duration of one run: the transaction that
//! is submitted over and over, the relay's verdict on each attempt, and the
//! terminal outcome that decides the process exit code.

/// Relay bundle types and submission outcomes.
pub mod bundle;
/// Key material wrapper that never leaks into logs.
pub mod secret_string;
/// The purchase transaction in its unsigned and signed forms.
pub mod transaction;
/// Formatting and unit helpers.
pub mod utils;

pub use bundle::*;
pub use secret_string::SecretString;
pub use transaction::*;
pub use utils::{
	current_timestamp, format_gwei, gwei_to_wei, parse_ether, truncate_id, with_0x_prefix,
	without_0x_prefix, UnitError,
};
