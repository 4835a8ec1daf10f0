//! Entity graph state and event dispatch
//!
//! One [`State`] bundles every database the projection writes. All
//! mutations for a single event go through [`State::apply`] inside one
//! write transaction; the caller commits, which makes the event the unit of
//! atomicity. Events arrive strictly ordered and are reduced one at a time,
//! so no locking beyond the transaction itself is needed.

use heed::types::SerdeBincode;
use serde::{Deserialize, Serialize};
use sneed::{DatabaseUnique, Env, RoTxn, RwTxn, UnitKey};

use crate::types::{
    Address, ConditionId, Event, EventEnvelope, MarketMakerId, QuestionId,
};

mod conditions;
pub mod error;
mod market_makers;
mod questions;

pub use conditions::{Condition, ScalarQuestionLink, payout_fractions};
pub use error::Error;
pub use market_makers::FixedProductMarketMaker;
pub use questions::{AnswerRecord, Question};

/// Role an oracle address plays for condition/question linkage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OracleKind {
    /// The Realitio proxy: the event's question id is a question key.
    Realitio,
    /// The scalar adapter: the event's question id keys the scalar
    /// question-link registry.
    ScalarAdapter,
    Unknown,
}

/// Linkage fallback for conditions prepared by an unrecognized oracle.
///
/// Reference deployments differ here: some treat any unknown oracle as
/// Realitio-compatible and link best-effort, others leave the condition
/// unlinked. The choice is deployment configuration, not projection logic.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum UnknownOracleLinkPolicy {
    #[default]
    LinkAsRealitio,
    LeaveUnlinked,
}

/// Oracle addresses for one deployment, fixed at construction.
#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub realitio: Address,
    pub scalar_adapter: Address,
    pub unknown_link_policy: UnknownOracleLinkPolicy,
}

impl OracleConfig {
    pub fn classify(&self, oracle: &Address) -> OracleKind {
        if *oracle == self.realitio {
            OracleKind::Realitio
        } else if *oracle == self.scalar_adapter {
            OracleKind::ScalarAdapter
        } else {
            OracleKind::Unknown
        }
    }
}

/// Process-wide condition counters.
///
/// `num_open_conditions + num_closed_conditions == num_conditions` at every
/// commit point: preparation adds an open condition, resolution moves
/// exactly one open condition to closed.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Global {
    pub num_conditions: i64,
    pub num_open_conditions: i64,
    pub num_closed_conditions: i64,
}

/// Per-topic condition counters. Category rows are created (and their open
/// counts raised) by the market-creation flow; this core only moves open to
/// closed at resolution.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Category {
    pub num_open_conditions: i64,
    pub num_closed_conditions: i64,
}

#[derive(Clone)]
pub struct State {
    questions:
        DatabaseUnique<SerdeBincode<QuestionId>, SerdeBincode<Question>>,
    conditions:
        DatabaseUnique<SerdeBincode<ConditionId>, SerdeBincode<Condition>>,
    market_makers: DatabaseUnique<
        SerdeBincode<MarketMakerId>,
        SerdeBincode<FixedProductMarketMaker>,
    >,
    /// Scalar-adapter question key -> underlying Realitio question + bounds
    scalar_question_links: DatabaseUnique<
        SerdeBincode<QuestionId>,
        SerdeBincode<ScalarQuestionLink>,
    >,
    categories: DatabaseUnique<SerdeBincode<String>, SerdeBincode<Category>>,
    global: DatabaseUnique<UnitKey, SerdeBincode<Global>>,
    oracles: OracleConfig,
}

impl State {
    pub const NUM_DBS: u32 = 6;

    pub fn new(env: &Env, oracles: OracleConfig) -> Result<Self, Error> {
        let mut rwtxn = env.write_txn()?;
        let questions = DatabaseUnique::create(env, &mut rwtxn, "questions")?;
        let conditions =
            DatabaseUnique::create(env, &mut rwtxn, "conditions")?;
        let market_makers =
            DatabaseUnique::create(env, &mut rwtxn, "market_makers")?;
        let scalar_question_links =
            DatabaseUnique::create(env, &mut rwtxn, "scalar_question_links")?;
        let categories =
            DatabaseUnique::create(env, &mut rwtxn, "categories")?;
        let global = DatabaseUnique::create(env, &mut rwtxn, "global")?;
        rwtxn.commit()?;
        Ok(Self {
            questions,
            conditions,
            market_makers,
            scalar_question_links,
            categories,
            global,
            oracles,
        })
    }

    pub fn oracles(&self) -> &OracleConfig {
        &self.oracles
    }

    /// Project one event into the entity graph.
    ///
    /// Storage faults are the only errors; domain anomalies (missing
    /// entities, duplicate resolutions) are logged and skipped so the
    /// stream keeps flowing. The caller commits the transaction.
    pub fn apply(
        &self,
        rwtxn: &mut RwTxn,
        envelope: &EventEnvelope,
    ) -> Result<(), Error> {
        match &envelope.event {
            Event::NewQuestion {
                question_id,
                template_id,
                question,
                arbitrator,
                opening_timestamp,
                timeout,
            } => questions::handle_new_question(
                self,
                rwtxn,
                question_id,
                *template_id,
                question,
                *arbitrator,
                *opening_timestamp,
                *timeout,
            ),
            Event::NewAnswer {
                question_id,
                answer,
                bond,
                timestamp,
                is_commitment,
            } => questions::handle_new_answer(
                self,
                rwtxn,
                question_id,
                *answer,
                bond.clone(),
                *timestamp,
                *is_commitment,
            ),
            // reveals have no embedded timestamp; the block's stands in
            Event::AnswerRevealed {
                question_id,
                answer,
                bond,
            } => questions::handle_new_answer(
                self,
                rwtxn,
                question_id,
                *answer,
                bond.clone(),
                envelope.timestamp,
                false,
            ),
            Event::ArbitrationRequested { question_id } => {
                questions::handle_arbitration_request(self, rwtxn, question_id)
            }
            Event::Finalized { question_id } => {
                questions::handle_finalize(self, rwtxn, question_id)
            }
            Event::ConditionPrepared {
                condition_id,
                oracle,
                question_id,
                outcome_slot_count,
            } => conditions::handle_condition_prepared(
                self,
                rwtxn,
                condition_id,
                *oracle,
                *question_id,
                *outcome_slot_count,
            ),
            Event::ConditionResolved {
                condition_id,
                payout_numerators,
            } => conditions::handle_condition_resolution(
                self,
                rwtxn,
                condition_id,
                payout_numerators,
                envelope.timestamp,
            ),
        }
    }

    pub fn try_get_question(
        &self,
        rotxn: &RoTxn,
        question_id: &QuestionId,
    ) -> Result<Option<Question>, Error> {
        Ok(self.questions.try_get(rotxn, question_id)?)
    }

    pub fn try_get_condition(
        &self,
        rotxn: &RoTxn,
        condition_id: &ConditionId,
    ) -> Result<Option<Condition>, Error> {
        Ok(self.conditions.try_get(rotxn, condition_id)?)
    }

    pub fn try_get_market_maker(
        &self,
        rotxn: &RoTxn,
        market_maker_id: &MarketMakerId,
    ) -> Result<Option<FixedProductMarketMaker>, Error> {
        Ok(self.market_makers.try_get(rotxn, market_maker_id)?)
    }

    pub fn try_get_category(
        &self,
        rotxn: &RoTxn,
        category_id: &str,
    ) -> Result<Option<Category>, Error> {
        Ok(self.categories.try_get(rotxn, &category_id.to_owned())?)
    }

    /// Global counters, zeroed before the first condition is prepared.
    pub fn global_counters(&self, rotxn: &RoTxn) -> Result<Global, Error> {
        Ok(self.global.try_get(rotxn, &())?.unwrap_or_default())
    }

    /// Record a scalar-adapter announcement. Owned by the adapter's
    /// ingestion flow; the projection only reads these.
    pub fn put_scalar_question_link(
        &self,
        rwtxn: &mut RwTxn,
        link: &ScalarQuestionLink,
    ) -> Result<(), Error> {
        self.scalar_question_links.put(rwtxn, &link.id, link)?;
        Ok(())
    }

    /// Create or overwrite a category aggregate. Owned by the
    /// market-creation flow.
    pub fn put_category(
        &self,
        rwtxn: &mut RwTxn,
        category_id: &str,
        category: &Category,
    ) -> Result<(), Error> {
        self.categories.put(rwtxn, &category_id.to_owned(), category)?;
        Ok(())
    }

    /// Register a market maker under a question, creating its mirror row
    /// seeded from the question's current answer state. This is the
    /// market-maker creation flow's side of the contract; fan-out only ever
    /// reads the index it appends to.
    pub fn index_market_maker(
        &self,
        rwtxn: &mut RwTxn,
        question_id: &QuestionId,
        market_maker_id: MarketMakerId,
    ) -> Result<(), Error> {
        let Some(mut question) = self.questions.try_get(rwtxn, question_id)?
        else {
            tracing::warn!(
                %question_id,
                %market_maker_id,
                "cannot index market maker under unknown question"
            );
            return Ok(());
        };
        let market_maker = FixedProductMarketMaker::mirroring(&question);
        self.market_makers.put(rwtxn, &market_maker_id, &market_maker)?;
        question.indexed_market_makers.push(market_maker_id);
        self.questions.put(rwtxn, question_id, &question)?;
        Ok(())
    }
}
