//! # GPTifier (`gpt`)
//! Talk to OpenAI, or a local Ollama server, from the command line.
//!
//! A command line program for creating responses, embeddings, fine-tuning jobs and images,
//! and for managing the files, models and stored chat completions of an OpenAI account.
//! Every invocation is a single blocking transaction against the remote API.
//!
//! ## Usage
//! These are the library crate docs for `gptifier`. For usage of the binary see
//! ```shell
//! $ gpt --help
//! ```
//!
//! ## Environment Variables:
//! - `OPENAI_API_KEY`: Required for commands that talk to the OpenAI user API.
//! - `OPENAI_ADMIN_KEY`: Required for `costs`.
//! - `GPT_*`: Optional. Overrides for `~/.gptifier/gptifier.toml`, with nested keys separated by `__`
//!   (e.g. `GPT_OPENAI__MODEL_RUN=gpt-4o-mini`, `GPT_OLLAMA__PORT=11500`).
//! - `RUST_LOG`: Optional. Log filter, overriding `--debug`.
//!
//! ## Notes:
//! - Models have no built-in defaults. Pass `--model` or configure one per command.
//! - `run` reads `./Inputfile` when no prompt is given on the command line or via `-r`.
//!
pub mod admin;
pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod ollama;
pub mod openai;
pub mod output;
pub mod validation;
