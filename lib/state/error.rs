//! State errors
//!
//! Only storage faults surface as errors. Domain-level anomalies (missing
//! entities, duplicate resolutions, unrecognized oracles, malformed question
//! encodings) are reported via tracing and skipped, so one bad event can
//! never halt ingestion of the stream.

use sneed::{db::error as db, env::error as env, rwtxn::error as rwtxn};
use thiserror::Error;
use transitive::Transitive;

#[derive(Debug, Error, Transitive)]
#[transitive(from(db::Error, sneed::Error))]
#[transitive(from(db::Put, db::Error))]
#[transitive(from(db::TryGet, db::Error))]
#[transitive(from(env::CreateDb, env::Error))]
#[transitive(from(env::Error, sneed::Error))]
#[transitive(from(env::WriteTxn, env::Error))]
#[transitive(from(rwtxn::Commit, rwtxn::Error))]
#[transitive(from(rwtxn::Error, sneed::Error))]
pub enum Error {
    #[error(transparent)]
    Db(#[from] sneed::Error),
}
