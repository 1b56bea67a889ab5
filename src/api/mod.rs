//! API clients for metadata discovery.
//!
//! - [`ImvdbApi`]: IMVDb catalog search and lookup

pub mod imvdb;

pub use imvdb::{match_score, ImvdbApi};
