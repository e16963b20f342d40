//! The confirmed, whole-database drop.
//!
//! Dropping goes through [`DropGate`], a small state machine:
//!
//! ```text
//! Idle --(database absent)--> error, nothing touched
//! Idle --(database present)--> AwaitConfirmation (3 attempts)
//! AwaitConfirmation --yes--> Confirmed --drop--> Dropped
//! AwaitConfirmation --no / 3 unrecognized answers / end of input--> Aborted
//! ```
//!
//! The gate never reads a terminal itself. Answers come from a [`Prompt`],
//! so a TTY and a scripted test drive the exact same retry logic.

use std::future::Future;
use std::io;

use crate::{Backend, DropSummary, Error, LiveStateInspector, Result};

/// Where a drop stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropState {
    Idle,
    AwaitConfirmation { attempts_left: u8 },
    Confirmed,
    Aborted(AbortReason),
    Dropped(DropSummary),
}

/// Why a drop did not happen. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The user answered no.
    Declined,
    /// No recognizable answer after [`DropGate::MAX_ATTEMPTS`] tries.
    Exhausted,
    /// The input closed before an answer was given.
    EndOfInput,
}

/// How a drop run ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Dropped(DropSummary),
    Aborted(AbortReason),
}

/// A normalized yes/no answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Yes,
    No,
    Unrecognized,
}

impl Answer {
    fn parse(reply: &str) -> Self {
        match reply.trim().to_lowercase().as_str() {
            "y" | "yes" => Answer::Yes,
            "n" | "no" => Answer::No,
            _ => Answer::Unrecognized,
        }
    }
}

/// Source of answers to the confirmation question.
pub trait Prompt {
    /// Show `question` and wait for one line of input.
    ///
    /// `Ok(None)` means the input is closed.
    fn ask(&mut self, question: &str) -> impl Future<Output = io::Result<Option<String>>>;
}

pub struct DropGate {
    database: String,
    state: DropState,
}

impl DropGate {
    /// Answers accepted before giving up.
    pub const MAX_ATTEMPTS: u8 = 3;

    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            state: DropState::Idle,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn state(&self) -> DropState {
        self.state
    }

    /// The question put to the user.
    pub fn question(&self) -> String {
        format!(
            "are you sure you want to drop the [{}] database [y/n]: ",
            self.database
        )
    }

    /// Leave `Idle` once the database's existence is known.
    ///
    /// A missing database is a [`Error::Precondition`]: there is nothing to
    /// confirm.
    pub fn database_checked(&mut self, exists: bool) -> Result<()> {
        if self.state != DropState::Idle {
            return Ok(());
        }
        if !exists {
            return Err(Error::Precondition(self.database.clone()));
        }
        self.state = DropState::AwaitConfirmation {
            attempts_left: Self::MAX_ATTEMPTS,
        };
        Ok(())
    }

    /// Feed one reply (`None` for closed input) and return the new state.
    ///
    /// Only meaningful while awaiting confirmation; in any other state the
    /// reply is ignored.
    pub fn answer(&mut self, reply: Option<&str>) -> DropState {
        let DropState::AwaitConfirmation { attempts_left } = self.state else {
            return self.state;
        };

        self.state = match reply.map(Answer::parse) {
            None => DropState::Aborted(AbortReason::EndOfInput),
            Some(Answer::Yes) => DropState::Confirmed,
            Some(Answer::No) => DropState::Aborted(AbortReason::Declined),
            Some(Answer::Unrecognized) if attempts_left > 1 => DropState::AwaitConfirmation {
                attempts_left: attempts_left - 1,
            },
            Some(Answer::Unrecognized) => DropState::Aborted(AbortReason::Exhausted),
        };
        self.state
    }

    /// Issue the drop. Refuses unless the gate is `Confirmed`.
    pub async fn execute<B: Backend>(&mut self, backend: &mut B) -> Result<DropSummary> {
        if self.state != DropState::Confirmed {
            return Err(Error::Unconfirmed(self.database.clone()));
        }
        let summary = backend
            .drop_database(&self.database)
            .await
            .map_err(|source| Error::Drop {
                database: self.database.clone(),
                source,
            })?;
        self.state = DropState::Dropped(summary);
        Ok(summary)
    }
}

/// Drop `database` after asking for confirmation through `prompt`.
///
/// Returns [`DropOutcome::Aborted`] (not an error) when the user declines,
/// gives no usable answer, or closes the input. Nothing is mutated in
/// those cases.
pub async fn drop_database<B: Backend, P: Prompt>(
    backend: &mut B,
    prompt: &mut P,
    database: &str,
) -> Result<DropOutcome> {
    let mut gate = DropGate::new(database);
    let exists = backend.database_exists(database).await?;
    gate.database_checked(exists)?;

    loop {
        match gate.state() {
            DropState::AwaitConfirmation { .. } => {
                let reply = prompt
                    .ask(&gate.question())
                    .await
                    .map_err(Error::Prompt)?;
                gate.answer(reply.as_deref());
            }
            DropState::Aborted(reason) => {
                tracing::info!(database, ?reason, "drop aborted");
                return Ok(DropOutcome::Aborted(reason));
            }
            DropState::Confirmed | DropState::Idle | DropState::Dropped(_) => break,
        }
    }

    gate.execute(backend).await.map(DropOutcome::Dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn awaiting() -> DropGate {
        let mut gate = DropGate::new("machines");
        gate.database_checked(true).unwrap();
        gate
    }

    #[test]
    fn test_missing_database_is_precondition_error() {
        let mut gate = DropGate::new("machines");
        let err = gate.database_checked(false).unwrap_err();
        assert!(matches!(err, Error::Precondition(ref db) if db == "machines"));
        assert_eq!(gate.state(), DropState::Idle);
        assert_eq!(
            err.to_string(),
            "database [machines] does not exist, cannot drop non-existent database"
        );
    }

    #[test]
    fn test_answers_are_normalized() {
        for yes in ["y", "Y", "yes", "  YES \n", "Yes"] {
            let mut gate = awaiting();
            assert_eq!(gate.answer(Some(yes)), DropState::Confirmed, "{:?}", yes);
        }
        for no in ["n", "N", "no", " No\r\n"] {
            let mut gate = awaiting();
            assert_eq!(
                gate.answer(Some(no)),
                DropState::Aborted(AbortReason::Declined),
                "{:?}",
                no
            );
        }
    }

    #[test]
    fn test_three_unrecognized_answers_abort() {
        let mut gate = awaiting();
        assert_eq!(
            gate.answer(Some("maybe")),
            DropState::AwaitConfirmation { attempts_left: 2 }
        );
        assert_eq!(
            gate.answer(Some("")),
            DropState::AwaitConfirmation { attempts_left: 1 }
        );
        assert_eq!(
            gate.answer(Some("yep")),
            DropState::Aborted(AbortReason::Exhausted)
        );
        // answers after the verdict change nothing
        assert_eq!(
            gate.answer(Some("yes")),
            DropState::Aborted(AbortReason::Exhausted)
        );
    }

    #[test]
    fn test_yes_on_last_attempt_confirms() {
        let mut gate = awaiting();
        gate.answer(Some("what"));
        gate.answer(Some("huh"));
        assert_eq!(gate.answer(Some("y")), DropState::Confirmed);
    }

    #[test]
    fn test_closed_input_aborts() {
        let mut gate = awaiting();
        assert_eq!(
            gate.answer(None),
            DropState::Aborted(AbortReason::EndOfInput)
        );
    }

    #[test]
    fn test_answer_before_check_is_ignored() {
        let mut gate = DropGate::new("machines");
        assert_eq!(gate.answer(Some("yes")), DropState::Idle);
    }

    #[test]
    fn test_question_names_database() {
        assert_eq!(
            DropGate::new("machines").question(),
            "are you sure you want to drop the [machines] database [y/n]: "
        );
    }

    #[tokio::test]
    async fn test_execute_refuses_without_confirmation() {
        let mut backend = crate::MemoryBackend::new().with_database("machines");
        let mut gate = awaiting();

        let err = gate.execute(&mut backend).await.unwrap_err();
        assert!(matches!(err, Error::Unconfirmed(_)));
        assert!(backend.has_database("machines"));
        assert!(backend.calls().is_empty());
    }
}
