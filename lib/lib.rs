//! Projection core for Realitio questions and conditional-token conditions.
//!
//! Consumes a strictly ordered stream of chain events and reduces it into a
//! queryable entity graph: questions with their decoded text and answer
//! lifecycle, conditions with their terminal payout vectors, and the
//! denormalized market-maker mirrors that depend on them.

pub mod encoding;
pub mod state;
pub mod types;

pub use state::{OracleConfig, State, UnknownOracleLinkPolicy};
