//! Hosted (OpenAI) and local (Ollama) model backends behind one interface.

use std::{fmt, time::Duration};

use serde::Serialize;

use crate::{config::Config, errors::GptError, ollama::Ollama, openai::OpenAi};

/// Which backend produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Source {
    #[serde(rename = "OpenAI")]
    OpenAi,
    #[serde(rename = "Ollama")]
    Ollama,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::OpenAi => write!(f, "OpenAI"),
            Source::Ollama => write!(f, "Ollama"),
        }
    }
}

/// One prompt and the model's answer to it
#[derive(Debug, Clone)]
pub struct Completion {
    pub id: Option<String>,
    pub input: String,
    pub output: String,
    pub model: String,
    /// Unix seconds, as reported by the provider
    pub created: i64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub rtt: Duration,
    pub source: Source,
    pub raw_response: String,
}

/// The JSON written by `run --file`
#[derive(Debug, Serialize)]
pub struct CompletionDump<'a> {
    pub created: i64,
    pub input: &'a str,
    pub input_tokens: u64,
    pub model: &'a str,
    pub output: &'a str,
    pub output_tokens: u64,
    pub rtt: f32,
    pub source: Source,
}

impl Completion {
    pub fn dump(&self) -> CompletionDump<'_> {
        CompletionDump {
            created: self.created,
            input: &self.input,
            input_tokens: self.input_tokens,
            model: &self.model,
            output: &self.output,
            output_tokens: self.output_tokens,
            rtt: self.rtt.as_secs_f32(),
            source: self.source,
        }
    }
}

/// An embedding vector; serializes to the layout `embed` writes to disk.
#[derive(Debug, Clone, Serialize)]
pub struct Embedding {
    pub embedding: Vec<f32>,
    pub input: String,
    pub model: String,
    pub source: Source,
}

/// Operations both backends provide
pub trait Backend {
    fn source(&self) -> Source;

    /// `store` asks the provider to keep the exchange. Backends without
    /// server-side storage ignore it.
    fn respond(
        &self,
        prompt: &str,
        model: &str,
        temperature: f32,
        store: bool,
    ) -> Result<Completion, GptError>;

    fn embed(&self, input: &str, model: &str) -> Result<Embedding, GptError>;
}

/// Pick the backend for this invocation.
pub fn select(use_local: bool, config: &Config) -> Result<Box<dyn Backend>, GptError> {
    let backend: Box<dyn Backend> = if use_local {
        Box::new(Ollama::new(config)?)
    } else {
        Box::new(OpenAi::new(config)?)
    };
    tracing::debug!("Using {} backend", backend.source());
    Ok(backend)
}
