//! Inbound chain events
//!
//! Delivery and ordering are the caller's contract: events arrive exactly
//! once, in canonical chain order, and each is projected to completion
//! before the next begins.

use num::BigUint;
use serde::{Deserialize, Serialize};

use crate::types::{Address, AnswerValue, ConditionId, QuestionId};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub enum Event {
    /// A condition was prepared on the conditional tokens contract.
    ConditionPrepared {
        condition_id: ConditionId,
        oracle: Address,
        /// Raw question id as supplied by the oracle. How it maps to a
        /// Realitio question depends on which oracle emitted it.
        question_id: QuestionId,
        outcome_slot_count: u32,
    },
    /// An oracle reported payouts for a condition.
    ConditionResolved {
        condition_id: ConditionId,
        payout_numerators: Vec<BigUint>,
    },
    /// A new Realitio question was asked.
    NewQuestion {
        question_id: QuestionId,
        template_id: u32,
        /// The encoded question blob (unit-separator delimited fields).
        question: String,
        arbitrator: Address,
        opening_timestamp: u64,
        timeout: u64,
    },
    /// An answer was submitted. Commitment submissions carry only a hash
    /// and must not be treated as the live answer until revealed.
    NewAnswer {
        question_id: QuestionId,
        answer: AnswerValue,
        bond: BigUint,
        /// Submission timestamp embedded in the event itself.
        timestamp: u64,
        is_commitment: bool,
    },
    /// A previously committed answer was revealed.
    AnswerRevealed {
        question_id: QuestionId,
        answer: AnswerValue,
        bond: BigUint,
    },
    /// Arbitration was requested for a question.
    ArbitrationRequested { question_id: QuestionId },
    /// A question was finalized by the arbitrator.
    Finalized { question_id: QuestionId },
}

/// An event together with its position in the canonical stream and the
/// timestamp of the block that carried it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventEnvelope {
    /// Monotonically increasing position in the stream.
    pub position: u64,
    /// Block timestamp, in seconds.
    pub timestamp: u64,
    pub event: Event,
}
