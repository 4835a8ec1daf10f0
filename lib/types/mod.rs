mod events;
mod hashes;

pub use events::{Event, EventEnvelope};
pub use hashes::{
    Address, AnswerValue, ConditionId, Hash, MarketMakerId, QuestionId,
};
