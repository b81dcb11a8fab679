//! Scenario runner
//!
//! Drives the reproduction against any [`Database`]:
//! - [`ScenarioRunner::reset`] seeds a known user record with `c1..cN`
//! - [`ScenarioRunner::race`] checks the seed is in place, fires three
//!   transactions without joining between them, then checks the seeded
//!   calls survived
//! - [`ScenarioRunner::probe`] repeats reset + race and counts reproductions
//!
//! Operation failures are never retried here: a completion carrying an
//! error fails the scenario.

mod latch;
mod records;

pub use latch::*;
pub use records::*;


use std::sync::Arc;

use serde_json::json;
use serde_json::Value;
use tokio::time::sleep;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

use crate::time::timestamp_millis;
use crate::AssertionError;
use crate::DataSnapshot;
use crate::Database;
use crate::DbPath;
use crate::Error;
use crate::Result;
use crate::ScenarioConfig;
use crate::TransactionCompletion;
use crate::TransactionHandler;
use crate::TransactionResult;

const CREATE_CALL: &str = "create-call";
const UPDATE_CALL: &str = "update-call";
const TOUCH_USER: &str = "touch-user";

/// Outcome of one race once all completions were joined.
#[derive(Debug)]
pub struct RaceReport {
    /// Id of the call both call transactions targeted
    pub call_id: String,
    /// Completions in the order they arrived
    pub completions: Vec<Completion<TransactionCompletion>>,
    /// User record read after the join
    pub snapshot: DataSnapshot,
}

impl RaceReport {
    pub fn committed(&self) -> usize {
        self.completions
            .iter()
            .filter(|c| matches!(&c.outcome, Ok(done) if done.committed))
            .count()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub iterations: usize,
    /// Races that lost at least one seeded call
    pub reproduced: usize,
    /// Most calls lost by a single race
    pub worst_loss: usize,
}

impl ProbeReport {
    pub fn intact(&self) -> usize {
        self.iterations - self.reproduced
    }
}

pub struct ScenarioRunner {
    database: Arc<dyn Database>,
    config: ScenarioConfig,
}

impl ScenarioRunner {
    pub fn new(
        database: Arc<dyn Database>,
        config: ScenarioConfig,
    ) -> Self {
        Self { database, config }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    fn user_path(&self) -> Result<DbPath> {
        self.config.user_path()
    }

    fn history_path(&self) -> Result<DbPath> {
        Ok(self.user_path()?.child(CALL_HISTORY)?)
    }

    /// Remove the user subtree, recreate it and seed the calls one after
    /// another, each write issued only after the previous one completed.
    pub async fn reset(&self) -> Result<DataSnapshot> {
        let user_path = self.user_path()?;
        let history_path = self.history_path()?;
        info!("reset: clearing {}", user_path);

        self.database.remove_value(&user_path).await?;

        let user = UserRecord::new(self.config.user_name.clone());
        self.database.set_value(&user_path, user.to_value()).await?;

        for call_id in self.config.seed_call_ids() {
            let call = CallRecord::new(call_id.clone(), self.config.phone_number.clone());
            let call_path = history_path.child(&call_id)?;
            self.database.set_value(&call_path, call.to_value()).await?;
            debug!("reset: seeded {}", call_path);
        }

        let snapshot = self.assert_user_object().await?;
        let history = snapshot.child(CALL_HISTORY)?;
        if history.children_count() != self.config.seed_calls {
            return Err(AssertionError::CallCount {
                path: history_path.to_string(),
                expected: self.config.seed_calls,
                actual: history.children_count(),
            }
            .into());
        }
        info!("reset: {} calls in place under {}", self.config.seed_calls, history_path);
        Ok(snapshot)
    }

    /// Submit the three transactions without waiting on any of them, join
    /// all completions, then assert the seeded calls still exist.
    ///
    /// Fails with [`AssertionError::NotSeeded`] before submitting anything
    /// if the seeded calls are not all in place.
    pub async fn race(&self) -> Result<RaceReport> {
        let user_path = self.user_path()?;
        self.assert_user_object().await.map_err(|e| match e {
            Error::Assertion(AssertionError::MissingCalls { path, missing }) => {
                Error::Assertion(AssertionError::NotSeeded { path, missing })
            }
            other => other,
        })?;

        let call_id = Uuid::new_v4().to_string();
        let call_path = self.history_path()?.child(&call_id)?;
        info!("race: new call {}", call_path);

        let latch = CompletionLatch::new(3);
        let template = CallRecord::new("updated", self.config.phone_number.clone()).to_value();

        self.submit_transaction(
            call_path.clone(),
            overwrite_with(template.clone()),
            latch.signal(CREATE_CALL),
        );
        self.submit_transaction(call_path, overwrite_with(template), latch.signal(UPDATE_CALL));

        let pause = self.config.pause_before_user_update();
        if !pause.is_zero() {
            debug!("race: pausing {:?} before touching the user", pause);
            sleep(pause).await;
        }

        self.submit_transaction(user_path, touch_last_updated(), latch.signal(TOUCH_USER));

        let completions = match self.config.join_timeout() {
            Some(timeout) => latch.wait_timeout(timeout).await?,
            None => latch.wait().await?,
        };

        for completion in &completions {
            match &completion.outcome {
                Ok(done) => debug!(
                    "race: `{}` completed, committed={}",
                    completion.label, done.committed
                ),
                Err(e) => {
                    error!("race: `{}` failed: {}", completion.label, e);
                    return Err(e.clone().into());
                }
            }
        }

        let snapshot = self.assert_user_object().await?;
        info!("race: all seeded calls survived");
        Ok(RaceReport {
            call_id,
            completions,
            snapshot,
        })
    }

    /// Run reset + race `iterations` times, counting races that lost
    /// seeded calls. Any other failure stops the probe.
    pub async fn probe(
        &self,
        iterations: usize,
    ) -> Result<ProbeReport> {
        let mut report = ProbeReport {
            iterations,
            ..Default::default()
        };

        for i in 1..=iterations {
            self.reset().await?;
            match self.race().await {
                Ok(_) => debug!("probe: iteration {} intact", i),
                Err(Error::Assertion(AssertionError::MissingCalls { missing, .. })) => {
                    warn!("probe: iteration {} lost {} call(s): {:?}", i, missing.len(), missing);
                    report.reproduced += 1;
                    report.worst_loss = report.worst_loss.max(missing.len());
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "probe: reproduced {} of {} races (worst loss {})",
            report.reproduced, report.iterations, report.worst_loss
        );
        Ok(report)
    }

    /// Read the user record once and check every seeded call exists.
    pub async fn assert_user_object(&self) -> Result<DataSnapshot> {
        let user_path = self.user_path()?;
        let snapshot = self.database.read_once(&user_path).await?;

        let mut calls = Vec::with_capacity(self.config.seed_calls);
        for call_id in self.config.seed_call_ids() {
            calls.push(snapshot.child(&format!("{}/{}", CALL_HISTORY, call_id))?);
        }

        let missing: Vec<String> = calls
            .iter()
            .filter(|call| !call.exists())
            .filter_map(|call| call.key().map(str::to_string))
            .collect();
        if !missing.is_empty() {
            return Err(AssertionError::MissingCalls {
                path: self.history_path()?.to_string(),
                missing,
            }
            .into());
        }
        Ok(snapshot)
    }

    fn submit_transaction(
        &self,
        path: DbPath,
        handler: TransactionHandler,
        signal: CompletionSignal<TransactionCompletion>,
    ) {
        let database = self.database.clone();
        tokio::spawn(async move {
            let outcome = database.run_transaction(&path, handler).await;
            signal.complete(outcome);
        });
    }
}

/// Replace whatever is at the path with `value`.
fn overwrite_with(value: Value) -> TransactionHandler {
    Box::new(move |_current| TransactionResult::success(value.clone()))
}

/// Set `lastUpdated` to now, keeping every other child the handler was given.
fn touch_last_updated() -> TransactionHandler {
    Box::new(|current| {
        let mut user = match current {
            Some(value @ Value::Object(_)) => value,
            _ => json!({}),
        };
        user[LAST_UPDATED] = json!(timestamp_millis());
        TransactionResult::success(user)
    })
}
