//! System instruction sent with every generation request.
//!
//! The persona text is replaceable (`[persona].system_prompt_file`); the
//! lead-capture rule is always appended and is built from the marker
//! constants, so the model is told exactly the syntax the scanner accepts.

use std::path::Path;

use anyhow::Context;

use crate::leads::marker::{LEAD_CLOSE, LEAD_OPEN};
use crate::leads::parser::FIELD_SEPARATOR;

/// Built-in persona used when no prompt file is configured.
pub const DEFAULT_PERSONA: &str = "\
You are the website assistant for a small software studio that builds \
Python automations, chat bots and web sites.

Chat format:
- Keep answers very short: two or three sentences per paragraph at most.
- Use short bullet lists when enumerating.
- If a topic needs a long explanation, offer a summary or a call instead.

If someone asks about prices, invite them to request a quote.";

/// The lead-capture rule appended to every persona.
pub fn lead_capture_rule() -> String {
    format!(
        "Lead capture (highest priority):\n\
         When the user has given you their name and an email address or phone \
         number, include exactly one hidden block in your reply, formatted as \
         {LEAD_OPEN}<name>{FIELD_SEPARATOR}<contact>{LEAD_CLOSE}, then say goodbye \
         politely and ask no further questions."
    )
}

/// Assemble the full system instruction from a persona text.
pub fn system_instruction(persona: &str) -> String {
    format!("{}\n\n{}", persona.trim(), lead_capture_rule())
}

/// Load the system instruction, reading the persona from `prompt_file` if given.
///
/// # Errors
///
/// Returns an error if `prompt_file` cannot be read.
pub fn load_system_instruction(prompt_file: Option<&Path>) -> anyhow::Result<String> {
    let persona = match prompt_file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read system prompt {}", path.display()))?,
        None => DEFAULT_PERSONA.to_owned(),
    };
    Ok(system_instruction(&persona))
}
