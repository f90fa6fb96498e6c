// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Operator interaction.
//!
//! Popopt is strictly interactive: menu choices and every confirmation come
//! from the operator sitting at the terminal. All of that goes through the
//! [`Operator`] trait, so the dispatcher and the restore procedure never talk
//! to the terminal directly.

use inquire::{error::InquireError, Confirm, Text};
use std::collections::VecDeque;

/// Source of operator input.
pub trait Operator {
    /// Read one line of free text, e.g., a menu choice.
    ///
    /// Return `None` once the operator has nothing more to say, e.g., input
    /// was closed or interrupted.
    fn read_line(&mut self, message: &str) -> Result<Option<String>>;

    /// Ask a yes/no question. Anything but an explicit yes counts as no.
    fn confirm(&mut self, message: &str) -> Result<bool>;
}

/// Operator reached through the terminal via [`inquire`].
#[derive(Debug, Default, Clone)]
pub struct InquireOperator;

impl InquireOperator {
    pub fn new() -> Self {
        Self
    }
}

impl Operator for InquireOperator {
    fn read_line(&mut self, message: &str) -> Result<Option<String>> {
        match Text::new(message).prompt() {
            Ok(line) => Ok(Some(line)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(error) => Err(PromptError::Inquire(error)),
        }
    }

    fn confirm(&mut self, message: &str) -> Result<bool> {
        match Confirm::new(message).with_default(false).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
            Err(error) => Err(PromptError::Inquire(error)),
        }
    }
}

/// Operator that replays a fixed script of answers.
///
/// Useful whenever the operator is not a human, e.g., the non-interactive
/// `optimize --yes` path, which confirms everything it is asked.
#[derive(Debug, Default, Clone)]
pub struct ScriptedOperator {
    lines: VecDeque<String>,
    answers: VecDeque<bool>,
    fallback: bool,
    asked: Vec<String>,
}

impl ScriptedOperator {
    /// Construct operator with queued lines and confirmation answers.
    ///
    /// Once the confirmation queue runs dry every question is declined.
    pub fn new(
        lines: impl IntoIterator<Item = impl Into<String>>,
        answers: impl IntoIterator<Item = bool>,
    ) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            answers: answers.into_iter().collect(),
            fallback: false,
            asked: Vec::new(),
        }
    }

    /// Construct operator that confirms every question.
    pub fn always_yes() -> Self {
        Self {
            fallback: true,
            ..Default::default()
        }
    }

    /// Every confirmation question asked so far, in order.
    pub fn asked(&self) -> &[String] {
        self.asked.as_slice()
    }
}

impl Operator for ScriptedOperator {
    fn read_line(&mut self, _message: &str) -> Result<Option<String>> {
        Ok(self.lines.pop_front())
    }

    fn confirm(&mut self, message: &str) -> Result<bool> {
        self.asked.push(message.to_string());
        Ok(self.answers.pop_front().unwrap_or(self.fallback))
    }
}

/// Operator interaction error types.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error(transparent)]
    Inquire(#[from] InquireError),
}

/// Friendly result alias :3
pub type Result<T, E = PromptError> = std::result::Result<T, E>;
