//! Condition entity and payout projection
//!
//! A condition is prepared once, by an oracle, and resolved at most once.
//! At preparation time the oracle address determines how (and whether) the
//! condition links to a question: the Realitio oracle links directly, the
//! scalar adapter links through a registry of scalar question links, and an
//! unrecognized oracle falls back to the configured policy.

use fraction::BigFraction;
use num::{BigUint, Zero};
use serde::{Deserialize, Serialize};
use sneed::RwTxn;

use crate::{
    state::{Error, OracleKind, State, UnknownOracleLinkPolicy, market_makers},
    types::{Address, ConditionId, QuestionId},
};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Condition {
    pub id: ConditionId,
    pub oracle: Address,
    /// Raw question id supplied by the oracle event. Only meaningful under
    /// that oracle's own keying scheme.
    pub question_id: QuestionId,
    /// Resolved link to a Question, if the oracle dispatch found one.
    pub question: Option<QuestionId>,
    pub scalar_low: Option<BigUint>,
    pub scalar_high: Option<BigUint>,
    pub outcome_slot_count: u32,
    /// Set at resolution; the condition is terminal once present.
    pub resolution_timestamp: Option<u64>,
    /// Normalized payout vector, same length and order as the reported
    /// numerators. Immutable once set.
    pub payouts: Option<Vec<BigFraction>>,
}

impl Condition {
    pub fn is_resolved(&self) -> bool {
        self.resolution_timestamp.is_some() || self.payouts.is_some()
    }
}

/// Registry record mapping a scalar-adapter question key to the underlying
/// Realitio question and its range bounds. Written by the adapter's own
/// announcement flow; read-only here.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ScalarQuestionLink {
    pub id: QuestionId,
    pub reality_eth_question_id: QuestionId,
    pub scalar_low: BigUint,
    pub scalar_high: BigUint,
}

/// Normalize payout numerators into fractions summing to one.
///
/// An all-zero numerator vector has no meaningful distribution; every slot
/// gets an exact zero rather than a division fault.
pub fn payout_fractions(numerators: &[BigUint]) -> Vec<BigFraction> {
    let denominator: BigUint = numerators.iter().sum();
    if denominator.is_zero() {
        return vec![BigFraction::zero(); numerators.len()];
    }
    numerators
        .iter()
        .map(|numerator| {
            BigFraction::new(numerator.clone(), denominator.clone())
        })
        .collect()
}

pub(in crate::state) fn handle_condition_prepared(
    state: &State,
    rwtxn: &mut RwTxn,
    condition_id: &ConditionId,
    oracle: Address,
    question_id: QuestionId,
    outcome_slot_count: u32,
) -> Result<(), Error> {
    let mut condition = Condition {
        id: *condition_id,
        oracle,
        question_id,
        question: None,
        scalar_low: None,
        scalar_high: None,
        outcome_slot_count,
        resolution_timestamp: None,
        payouts: None,
    };
    match state.oracles.classify(&oracle) {
        OracleKind::Realitio => {
            condition.question = Some(question_id);
        }
        OracleKind::ScalarAdapter => {
            if let Some(link) =
                state.scalar_question_links.try_get(rwtxn, &question_id)?
            {
                condition.question = Some(link.reality_eth_question_id);
                condition.scalar_low = Some(link.scalar_low);
                condition.scalar_high = Some(link.scalar_high);
            } else {
                tracing::info!(
                    %condition_id,
                    %question_id,
                    "no scalar question link; condition stays unlinked"
                );
            }
        }
        OracleKind::Unknown => {
            tracing::warn!(
                %condition_id,
                %oracle,
                "condition oracle is not a known Realitio address"
            );
            match state.oracles.unknown_link_policy {
                UnknownOracleLinkPolicy::LinkAsRealitio => {
                    condition.question = Some(question_id);
                }
                UnknownOracleLinkPolicy::LeaveUnlinked => (),
            }
        }
    }
    state.conditions.put(rwtxn, condition_id, &condition)?;

    let mut global = state.global_counters(rwtxn)?;
    global.num_conditions += 1;
    global.num_open_conditions += 1;
    state.global.put(rwtxn, &(), &global)?;
    Ok(())
}

pub(in crate::state) fn handle_condition_resolution(
    state: &State,
    rwtxn: &mut RwTxn,
    condition_id: &ConditionId,
    payout_numerators: &[BigUint],
    timestamp: u64,
) -> Result<(), Error> {
    let Some(mut condition) = state.conditions.try_get(rwtxn, condition_id)?
    else {
        tracing::error!(%condition_id, "could not find condition to resolve");
        return Ok(());
    };
    // Resolution is exactly-once: a replay must leave payouts and every
    // counter untouched, so this guard runs before any write.
    if condition.is_resolved() {
        tracing::error!(
            %condition_id,
            "condition is already resolved; discarding resolution"
        );
        return Ok(());
    }

    let payouts = payout_fractions(payout_numerators);
    condition.resolution_timestamp = Some(timestamp);
    condition.payouts = Some(payouts.clone());
    state.conditions.put(rwtxn, condition_id, &condition)?;

    // condition -> question -> category is an optional three-hop chain;
    // any missing hop skips the category counters.
    let question = match condition.question {
        Some(question_id) => state.questions.try_get(rwtxn, &question_id)?,
        None => None,
    };
    if let Some(category_id) =
        question.as_ref().and_then(|question| question.category.clone())
    {
        if let Some(mut category) =
            state.categories.try_get(rwtxn, &category_id)?
        {
            category.num_open_conditions -= 1;
            category.num_closed_conditions += 1;
            state.categories.put(rwtxn, &category_id, &category)?;
        }
    }

    let mut global = state.global_counters(rwtxn)?;
    global.num_open_conditions -= 1;
    global.num_closed_conditions += 1;
    state.global.put(rwtxn, &(), &global)?;

    let Some(question) = question else {
        tracing::info!(%condition_id, "resolving unlinked condition");
        return Ok(());
    };
    market_makers::propagate_resolution(
        state, rwtxn, &question, timestamp, &payouts,
    )
}
