//! Prompt provider seam.
//!
//! The core asks questions through [`PromptProvider`] and never talks to the
//! terminal itself. [`DialoguerPrompt`] is the interactive implementation;
//! [`ScriptedPrompt`] answers from a fixed table.

use crate::error::ApiError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    Confirm { default: bool },
    Select { items: Vec<String>, default: usize },
    Input { default: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Key of the answer in the returned map
    pub id: String,
    pub message: String,
    pub kind: QuestionKind,
}

impl Question {
    pub fn confirm(id: &str, message: impl Into<String>, default: bool) -> Self {
        Self {
            id: id.to_string(),
            message: message.into(),
            kind: QuestionKind::Confirm { default },
        }
    }

    pub fn select(id: &str, message: impl Into<String>, items: &[&str], default: usize) -> Self {
        Self {
            id: id.to_string(),
            message: message.into(),
            kind: QuestionKind::Select {
                items: items.iter().map(|s| s.to_string()).collect(),
                default,
            },
        }
    }

    pub fn input(id: &str, message: impl Into<String>, default: Option<String>) -> Self {
        Self {
            id: id.to_string(),
            message: message.into(),
            kind: QuestionKind::Input { default },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Bool(bool),
    Index(usize),
    Text(String),
}

pub type Answers = HashMap<String, Answer>;

#[async_trait]
pub trait PromptProvider: Send + Sync {
    async fn ask(&self, questions: &[Question]) -> Result<Answers, ApiError>;
}

/// Interactive prompts on the controlling terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerPrompt;

fn ask_one(question: &Question) -> Result<Answer, ApiError> {
    use dialoguer::{Confirm, Input, Select};

    let failed = |e: dialoguer::Error| ApiError::PromptError(format!("Failed to get user input: {}", e));
    let dismissed = || ApiError::Cancelled(format!("'{}' was dismissed", question.message));
    match &question.kind {
        QuestionKind::Confirm { default } => Confirm::new()
            .with_prompt(&question.message)
            .default(*default)
            .interact_opt()
            .map_err(failed)?
            .map(Answer::Bool)
            .ok_or_else(dismissed),
        QuestionKind::Select { items, default } => Select::new()
            .with_prompt(&question.message)
            .items(items.as_slice())
            .default(*default)
            .interact_opt()
            .map_err(failed)?
            .map(Answer::Index)
            .ok_or_else(dismissed),
        QuestionKind::Input { default } => {
            let mut input = Input::<String>::new().with_prompt(&question.message);
            if let Some(default) = default {
                input = input.default(default.clone());
            }
            input.interact_text().map(Answer::Text).map_err(failed)
        }
    }
}

#[async_trait]
impl PromptProvider for DialoguerPrompt {
    async fn ask(&self, questions: &[Question]) -> Result<Answers, ApiError> {
        let questions = questions.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut answers = Answers::new();
            for question in &questions {
                answers.insert(question.id.clone(), ask_one(question)?);
            }
            Ok(answers)
        })
        .await
        .map_err(|e| ApiError::PromptError(e.to_string()))?
    }
}

/// Answers from a fixed table; a question without an answer is an error.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: Answers,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_answer(mut self, id: &str, answer: Answer) -> Self {
        self.answers.insert(id.to_string(), answer);
        self
    }

    /// Ids of every question asked so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }
}

#[async_trait]
impl PromptProvider for ScriptedPrompt {
    async fn ask(&self, questions: &[Question]) -> Result<Answers, ApiError> {
        let mut answers = Answers::new();
        for question in questions {
            self.asked.lock().push(question.id.clone());
            let answer = self.answers.get(&question.id).cloned().ok_or_else(|| {
                ApiError::PromptError(format!(
                    "No answer available for '{}' in non-interactive mode",
                    question.message
                ))
            })?;
            answers.insert(question.id.clone(), answer);
        }
        Ok(answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_prompt_answers_known_questions_only() {
        let prompt = ScriptedPrompt::new().with_answer("go", Answer::Bool(true));
        let answers = prompt
            .ask(&[Question::confirm("go", "Proceed?", false)])
            .await
            .unwrap();
        assert_eq!(answers.get("go"), Some(&Answer::Bool(true)));

        let err = prompt
            .ask(&[Question::select("mode", "Mode", &["a", "b"], 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::PromptError(_)));
        assert_eq!(prompt.asked(), vec!["go".to_string(), "mode".to_string()]);
    }
}
