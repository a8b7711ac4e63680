//! State of the prompt-to-image view.
//!
//! Holds the prompt being edited and the last image reference, and decides
//! which finished requests are allowed to change it. Kept free of terminal
//! I/O so it can be driven directly from tests.

use crate::error::Result;
use crate::protocol::GenerateResponse;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    /// Nothing beyond redrawing.
    None,
    /// Send this submission to the generator.
    Submit(Submission),
    /// Close the view.
    Quit,
}

/// One submit, tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Sequence number; the latest one issued is the only one applied.
    pub seq: u64,
    /// The prompt as it was when Enter was pressed.
    pub prompt: String,
}

/// The prompt-to-image view.
#[derive(Debug, Default)]
pub struct PromptView {
    input: Input,
    result: Option<String>,
    /// Sequence number of the most recent submit; 0 before the first.
    issued: u64,
    in_flight: usize,
}

impl PromptView {
    /// Create a view, optionally pre-filling the prompt.
    pub fn new(initial_prompt: Option<String>) -> Self {
        let input = match initial_prompt {
            Some(prompt) => Input::default().with_value(prompt),
            None => Input::default(),
        };
        Self {
            input,
            ..Self::default()
        }
    }

    /// Current prompt text.
    pub fn prompt(&self) -> &str {
        self.input.value()
    }

    /// The line editor backing the prompt.
    pub fn input(&self) -> &Input {
        &self.input
    }

    /// The image reference to display, if any.
    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    /// Number of submits that have not resolved yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
        match key.code {
            KeyCode::Enter => ViewAction::Submit(self.submit()),
            KeyCode::Esc => ViewAction::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                ViewAction::Quit
            }
            _ => {
                self.input.handle_event(&Event::Key(key));
                ViewAction::None
            }
        }
    }

    /// Start a submit of the current prompt. The prompt is not validated and
    /// earlier submits are not cancelled.
    pub fn submit(&mut self) -> Submission {
        self.issued += 1;
        self.in_flight += 1;
        debug!("Submission #{} issued", self.issued);
        Submission {
            seq: self.issued,
            prompt: self.input.value().to_string(),
        }
    }

    /// Feed back the outcome of submission `seq`. Returns whether it changed
    /// what the view shows.
    ///
    /// Only the most recently issued submission may update the result, so a
    /// slow earlier request can never overwrite a newer one. Failures leave
    /// the result alone and are only logged.
    pub fn resolve(&mut self, seq: u64, outcome: Result<GenerateResponse>) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        if seq != self.issued {
            debug!("Dropping stale submission #{} (latest is #{})", seq, self.issued);
            return false;
        }

        match outcome {
            Ok(response) => {
                // An empty reference shows nothing, same as a missing one.
                let image_url = response.image_url.filter(|url| !url.is_empty());
                let changed = self.result != image_url;
                self.result = image_url;
                changed
            }
            Err(e) => {
                warn!("Submission #{} failed: {}", seq, e);
                false
            }
        }
    }
}
