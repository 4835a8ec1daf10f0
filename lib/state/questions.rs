//! Question entity and answer-lifecycle projection
//!
//! A question moves through its lifecycle as a conjunction of fields rather
//! than a discrete state enum: created (immutable fields set), answered
//! (current answer present), pending arbitration, and finalized (arbitration
//! occurred, permanently).

use num::BigUint;
use serde::{Deserialize, Serialize};
use sneed::RwTxn;

use crate::{
    encoding::{self, SINGLE_SELECT_TEMPLATE_ID},
    state::{Error, State, market_makers},
    types::{Address, AnswerValue, MarketMakerId, QuestionId},
};

/// The latest confirmed answer submitted for a question.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AnswerRecord {
    pub value: AnswerValue,
    pub bond: BigUint,
    pub timestamp: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Question {
    pub id: QuestionId,
    /// Raw encoded source text. Unset when the template type was
    /// unsupported and the blob was never decoded.
    pub data: Option<String>,
    pub title: Option<String>,
    pub outcomes: Vec<String>,
    /// Decoded category text; doubles as the Category aggregate key.
    pub category: Option<String>,
    pub language: Option<String>,
    pub arbitrator: Address,
    pub opening_timestamp: u64,
    pub timeout: u64,
    pub current_answer: Option<AnswerRecord>,
    /// When the current answer becomes final. Zero until the first
    /// confirmed answer; recomputed (not accumulated) on every acceptance.
    pub answer_finalized_timestamp: u64,
    pub is_pending_arbitration: bool,
    /// Sticky: set when a finalize fires after arbitration was requested,
    /// never cleared again.
    pub arbitration_occurred: bool,
    /// Market makers referencing this question, in registration order.
    /// Membership is appended by the market-maker creation flow.
    pub indexed_market_makers: Vec<MarketMakerId>,
}

#[allow(clippy::too_many_arguments)]
pub(in crate::state) fn handle_new_question(
    state: &State,
    rwtxn: &mut RwTxn,
    question_id: &QuestionId,
    template_id: u32,
    question_text: &str,
    arbitrator: Address,
    opening_timestamp: u64,
    timeout: u64,
) -> Result<(), Error> {
    let mut question = Question {
        id: *question_id,
        data: None,
        title: None,
        outcomes: Vec::new(),
        category: None,
        language: None,
        arbitrator,
        opening_timestamp,
        timeout,
        current_answer: None,
        answer_finalized_timestamp: 0,
        is_pending_arbitration: false,
        arbitration_occurred: false,
        indexed_market_makers: Vec::new(),
    };
    if template_id == SINGLE_SELECT_TEMPLATE_ID {
        let parsed = encoding::parse_question_data(question_text);
        question.data = Some(question_text.to_owned());
        question.title = parsed.title;
        question.outcomes = parsed.outcomes;
        question.category = parsed.category;
        question.language = parsed.language;
    } else {
        // The entity is still created so that later condition resolutions
        // have something to link against; only the decoded fields stay unset.
        tracing::info!(
            %question_id,
            template_id,
            "not decoding question with unsupported template"
        );
    }
    state.questions.put(rwtxn, question_id, &question)?;
    Ok(())
}

/// Accept a confirmed answer and recompute the finalization deadline.
///
/// Once arbitration has occurred for a question, the arbitrator's word is
/// authoritative and every subsequent answer finalizes immediately.
/// Otherwise each accepted answer restarts the timeout window from its own
/// timestamp, overriding whatever countdown the previous answer started.
pub(in crate::state) fn handle_new_answer(
    state: &State,
    rwtxn: &mut RwTxn,
    question_id: &QuestionId,
    answer: AnswerValue,
    bond: BigUint,
    timestamp: u64,
    is_commitment: bool,
) -> Result<(), Error> {
    if is_commitment {
        // hash-only submission; only the reveal carries state
        return Ok(());
    }
    let Some(mut question) = state.questions.try_get(rwtxn, question_id)?
    else {
        tracing::info!(%question_id, "cannot find question to answer");
        return Ok(());
    };
    question.answer_finalized_timestamp = if question.arbitration_occurred {
        timestamp
    } else {
        timestamp + question.timeout
    };
    question.current_answer = Some(AnswerRecord {
        value: answer,
        bond,
        timestamp,
    });
    state.questions.put(rwtxn, question_id, &question)?;
    market_makers::propagate_answer(state, rwtxn, &question)
}

pub(in crate::state) fn handle_arbitration_request(
    state: &State,
    rwtxn: &mut RwTxn,
    question_id: &QuestionId,
) -> Result<(), Error> {
    let Some(mut question) = state.questions.try_get(rwtxn, question_id)?
    else {
        tracing::info!(%question_id, "cannot find question to begin arbitration");
        return Ok(());
    };
    question.is_pending_arbitration = true;
    state.questions.put(rwtxn, question_id, &question)?;
    Ok(())
}

pub(in crate::state) fn handle_finalize(
    state: &State,
    rwtxn: &mut RwTxn,
    question_id: &QuestionId,
) -> Result<(), Error> {
    let Some(mut question) = state.questions.try_get(rwtxn, question_id)?
    else {
        tracing::info!(%question_id, "cannot find question to finalize");
        return Ok(());
    };
    question.is_pending_arbitration = false;
    question.arbitration_occurred = true;
    state.questions.put(rwtxn, question_id, &question)?;
    Ok(())
}
