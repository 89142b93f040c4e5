//! Generation requests as a two-phase protocol.
//!
//! `begin` admits at most one request at a time and hands out a [`Ticket`]
//! that records the document revision it was issued against. The host runs
//! the request however it likes (blocking, `fetch`, a worker) and reports
//! back with `GenerationFinished`. A response whose ticket is not the one in
//! flight, or whose revision no longer matches the document, is stale and is
//! dropped without being merged.

use crate::dispatch::{Command, Effect, dispatch};
use crate::endpoint::MISSING_API_KEY;
use crate::error::EditorError;
use crate::library::KeyValueStore;
use crate::session::Editor;
use lc_core::{GenerationRequest, Rect};
use serde::Deserialize;
use thiserror::Error;

/// How a backend call failed before producing a design.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Config(String),
    #[error("{message}")]
    Upstream { status: u16, message: String },
}

/// The generation capability: turn a request into raw response text.
pub trait Generator {
    fn generate(&mut self, request: &GenerationRequest) -> Result<String, GenerateError>;
}

/// What the response will be merged into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GenerationKind {
    /// Replace the whole document.
    Full,
    /// Replace the layers under `region`.
    Masked { region: Rect },
}

/// Handle for one in-flight request.
#[derive(Debug, Clone, PartialEq)]
pub struct Ticket {
    pub id: u64,
    /// Document revision the request was issued against.
    pub revision: u64,
    pub kind: GenerationKind,
    pub request: GenerationRequest,
}

/// Admission control: one request in flight per session.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    next_id: u64,
    current: Option<Ticket>,
}

impl InFlight {
    pub(crate) fn begin(
        &mut self,
        revision: u64,
        kind: GenerationKind,
        request: GenerationRequest,
    ) -> Result<Ticket, EditorError> {
        if self.current.is_some() {
            return Err(EditorError::Busy);
        }
        self.next_id += 1;
        let ticket = Ticket {
            id: self.next_id,
            revision,
            kind,
            request,
        };
        log::info!("generation #{} started at revision {revision}", ticket.id);
        self.current = Some(ticket.clone());
        Ok(ticket)
    }

    /// Release the slot held by `ticket_id`. Unknown ids are stale.
    pub(crate) fn finish(&mut self, ticket_id: u64) -> Result<Ticket, EditorError> {
        match self.current.take() {
            Some(t) if t.id == ticket_id => Ok(t),
            other => {
                self.current = other;
                log::warn!("discarding response for unknown generation #{ticket_id}");
                Err(EditorError::Stale)
            }
        }
    }

    pub(crate) fn current(&self) -> Option<&Ticket> {
        self.current.as_ref()
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Interpret a reply from the generate endpoint.
///
/// 200 yields the body as design text. Any other status becomes an error
/// carrying the endpoint's `{ "error": ... }` message when there is one.
pub fn interpret_response(status: u16, body: &str) -> Result<String, GenerateError> {
    if status == 200 {
        return Ok(body.to_string());
    }
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string());
    Err(match status {
        400 => GenerateError::Input(message),
        500 if message == MISSING_API_KEY => GenerateError::Config(message),
        _ => GenerateError::Upstream { status, message },
    })
}

/// Dispatch `command`; if it starts a generation, run it on `generator`
/// right away and merge the result.
pub fn run<S: KeyValueStore>(
    editor: &mut Editor<S>,
    command: Command,
    generator: &mut dyn Generator,
) -> Result<Effect, EditorError> {
    match dispatch(editor, command)? {
        Effect::StartGeneration(ticket) => {
            let result = generator.generate(&ticket.request);
            dispatch(
                editor,
                Command::GenerationFinished {
                    ticket: ticket.id,
                    result,
                },
            )
        }
        effect => Ok(effect),
    }
}
