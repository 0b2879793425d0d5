// ============================================================
// HUMAN-INTERACTION CHANNEL
// ============================================================
// Typed request/response protocol between the pipeline stages and the
// shell. A stage that cannot decide on its own sends a prompt and blocks
// until exactly one answer arrives; empty or cancelled answers are treated
// as "not yet answered" and re-requested.

use crate::domain::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::{mpsc, oneshot};

/// A typed input request rendered by the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputRequest {
    /// Free-text input, optionally restricted by an allowlist regex and a
    /// maximum length.
    Text {
        id: String,
        placeholder: String,
        allowed: Option<String>,
        max_length: Option<usize>,
    },
    /// Single-choice dropdown.
    Choice { id: String, options: Vec<String> },
}

impl InputRequest {
    pub fn text(id: &str, placeholder: &str) -> Self {
        InputRequest::Text {
            id: id.to_string(),
            placeholder: placeholder.to_string(),
            allowed: None,
            max_length: None,
        }
    }

    pub fn single_char(id: &str, placeholder: &str) -> Self {
        InputRequest::Text {
            id: id.to_string(),
            placeholder: placeholder.to_string(),
            allowed: None,
            max_length: Some(1),
        }
    }

    pub fn choice(id: &str, options: Vec<String>) -> Self {
        InputRequest::Choice {
            id: id.to_string(),
            options,
        }
    }
}

/// Boundary between the pipeline and the human. One outstanding request at a
/// time; the pipeline suspends indefinitely until it is answered.
#[async_trait]
pub trait Interaction: Send + Sync {
    /// Display a message (question or status). `is_error` marks it as a
    /// forced-error display.
    async fn show(&self, message: &str, is_error: bool);

    /// Ask for one input. `None` means the user cancelled or submitted an
    /// empty answer; callers re-prompt instead of proceeding with defaults.
    async fn request(&self, request: InputRequest) -> Result<Option<String>>;
}

/// Ask until a non-empty answer arrives.
pub async fn require_answer(
    interaction: &dyn Interaction,
    request: InputRequest,
) -> Result<String> {
    loop {
        match interaction.request(request.clone()).await? {
            Some(answer) if !answer.is_empty() => return Ok(answer),
            _ => continue,
        }
    }
}

/// A prompt travelling to the shell, carrying the reply slot.
pub struct OutboundPrompt {
    pub request: InputRequest,
    pub reply: oneshot::Sender<Option<String>>,
}

/// A message-only notification travelling to the shell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

/// Channel-backed [`Interaction`]: prompts and notices are forwarded over
/// tokio channels to whatever front end drains them.
pub struct ChannelInteraction {
    prompts: mpsc::Sender<OutboundPrompt>,
    notices: mpsc::Sender<Notice>,
}

impl ChannelInteraction {
    pub fn new(
        prompt_buffer: usize,
    ) -> (
        Self,
        mpsc::Receiver<OutboundPrompt>,
        mpsc::Receiver<Notice>,
    ) {
        let (prompt_tx, prompt_rx) = mpsc::channel(prompt_buffer);
        let (notice_tx, notice_rx) = mpsc::channel(prompt_buffer);
        (
            Self {
                prompts: prompt_tx,
                notices: notice_tx,
            },
            prompt_rx,
            notice_rx,
        )
    }
}

#[async_trait]
impl Interaction for ChannelInteraction {
    async fn show(&self, message: &str, is_error: bool) {
        let _ = self
            .notices
            .send(Notice {
                message: message.to_string(),
                is_error,
            })
            .await;
    }

    async fn request(&self, request: InputRequest) -> Result<Option<String>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.prompts
            .send(OutboundPrompt {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| AppError::Internal("Interaction channel closed".to_string()))?;
        reply_rx
            .await
            .map_err(|_| AppError::Internal("Prompt dropped without a response".to_string()))
    }
}

/// Test double answering prompts from a fixed script.
pub struct ScriptedInteraction {
    answers: Mutex<VecDeque<Option<String>>>,
    pub shown: Mutex<Vec<Notice>>,
}

impl ScriptedInteraction {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            shown: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    async fn show(&self, message: &str, is_error: bool) {
        self.shown.lock().unwrap().push(Notice {
            message: message.to_string(),
            is_error,
        });
    }

    async fn request(&self, _request: InputRequest) -> Result<Option<String>> {
        let answer = self.answers.lock().unwrap().pop_front();
        match answer {
            Some(answer) => Ok(answer),
            None => Err(AppError::Internal(
                "Scripted interaction ran out of answers".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_require_answer_skips_empty_and_cancelled() {
        let interaction =
            ScriptedInteraction::new(vec![None, Some(String::new()), Some(";".to_string())]);
        let answer = require_answer(&interaction, InputRequest::text("delimiter", "Delimiter"))
            .await
            .unwrap();
        assert_eq!(answer, ";");
    }

    #[tokio::test]
    async fn test_channel_round_trip() {
        let (interaction, mut prompts, _notices) = ChannelInteraction::new(4);

        let driver = tokio::spawn(async move {
            let prompt = prompts.recv().await.expect("prompt");
            assert!(matches!(prompt.request, InputRequest::Choice { .. }));
            prompt.reply.send(Some("utf8".to_string())).unwrap();
        });

        let answer = interaction
            .request(InputRequest::choice(
                "encoding",
                vec!["utf8".into(), "latin2".into()],
            ))
            .await
            .unwrap();
        assert_eq!(answer.as_deref(), Some("utf8"));
        driver.await.unwrap();
    }
}
