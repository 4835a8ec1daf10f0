//! Denormalized market-maker mirrors and the fan-out propagator
//!
//! Every market maker indexed under a question carries a copy of that
//! question's latest answer state and, after resolution, the payout vector.
//! The copies exist so downstream consumers can query a market without
//! joining through the question; they are overwritten wholesale on each
//! propagation.

use fraction::BigFraction;
use serde::{Deserialize, Serialize};
use sneed::RwTxn;

use crate::state::{AnswerRecord, Error, Question, State};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FixedProductMarketMaker {
    pub current_answer: Option<AnswerRecord>,
    pub answer_finalized_timestamp: Option<u64>,
    pub resolution_timestamp: Option<u64>,
    pub payouts: Option<Vec<BigFraction>>,
}

impl FixedProductMarketMaker {
    /// Initial mirror for a newly registered market maker, seeded from
    /// whatever answer state its question already has.
    pub(in crate::state) fn mirroring(question: &Question) -> Self {
        Self {
            current_answer: question.current_answer.clone(),
            answer_finalized_timestamp: question
                .current_answer
                .is_some()
                .then_some(question.answer_finalized_timestamp),
            resolution_timestamp: None,
            payouts: None,
        }
    }
}

/// Push the question's freshly accepted answer to every indexed market
/// maker. A missing mirror is reported and skipped; the rest of the batch
/// still updates.
pub(in crate::state) fn propagate_answer(
    state: &State,
    rwtxn: &mut RwTxn,
    question: &Question,
) -> Result<(), Error> {
    for market_maker_id in &question.indexed_market_makers {
        let Some(mut market_maker) =
            state.market_makers.try_get(rwtxn, market_maker_id)?
        else {
            tracing::error!(
                %market_maker_id,
                question_id = %question.id,
                "indexed market maker not found for question"
            );
            continue;
        };
        market_maker.current_answer = question.current_answer.clone();
        market_maker.answer_finalized_timestamp =
            Some(question.answer_finalized_timestamp);
        state.market_makers.put(rwtxn, market_maker_id, &market_maker)?;
    }
    Ok(())
}

/// Push a resolved condition's payout vector to every market maker indexed
/// under its linked question.
pub(in crate::state) fn propagate_resolution(
    state: &State,
    rwtxn: &mut RwTxn,
    question: &Question,
    resolution_timestamp: u64,
    payouts: &[BigFraction],
) -> Result<(), Error> {
    for market_maker_id in &question.indexed_market_makers {
        let Some(mut market_maker) =
            state.market_makers.try_get(rwtxn, market_maker_id)?
        else {
            tracing::error!(
                %market_maker_id,
                question_id = %question.id,
                "indexed market maker not found for resolved question"
            );
            continue;
        };
        market_maker.resolution_timestamp = Some(resolution_timestamp);
        market_maker.payouts = Some(payouts.to_vec());
        state.market_makers.put(rwtxn, market_maker_id, &market_maker)?;
    }
    Ok(())
}
