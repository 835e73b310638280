//! Domain types and pure rules for the IdeaBox client.
//!
//! - [`claims`] -- session token claims, decoding, and expiry checks.
//! - [`idea`] -- ideas, votes, comments, choices, and derived projections.
//! - [`input`] -- validated user input (login name, idea and comment drafts).

pub mod claims;
pub mod error;
pub mod idea;
pub mod input;
pub mod types;
