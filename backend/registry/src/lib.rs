//! # Registry
//!
//! Everything the server and its clients agree on.
//!
//! - [`models`]: JSON payloads, always wrapped in an [`Envelope`]
//! - [`rating`]: star validation and the averaging both sides perform
//! - [`search`]: the free-text filter used by the listing endpoint and the board
//! - [`board`]: the browse page's in-memory state, including optimistic ratings
//! - [`remote`]: a `reqwest` client for the REST API
pub mod board;
pub mod models;
pub mod rating;
pub mod remote;
pub mod search;

pub use board::Board;
pub use models::{Envelope, RatingSummary, School, SchoolInput, SchoolListing};
pub use remote::{RemoteError, SchoolsClient};
