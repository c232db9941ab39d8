//! Leadline: a chat front-end that captures leads.
//!
//! Forwards user messages to Gemini, looks for a `||LEAD:name - contact||`
//! block in the reply, stores the lead in SQLite, alerts the operator over
//! Telegram in the background, and returns the reply with the block removed.
//!
//! See `DESIGN.md` for the module map.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod credentials;
pub mod logging;
pub mod providers;

pub mod leads;
pub mod notify;
pub mod store;

pub mod chat;
pub mod persona;
pub mod server;
