//! Question answering agent with bounded tool calling.
//!
//! Each question runs through at most [`MAX_TOOL_ROUNDS`] rounds of
//! "ask the model, run the tools it requests, feed results back", followed by
//! a tool-free synthesis call when the model is still asking for tools.

mod runner;

pub use runner::{Agent, MAX_TOOL_ROUNDS};
