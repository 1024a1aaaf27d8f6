//! Configuration module for Coursemate.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    GeneralSettings, ModelSettings, PromptSettings, SearchSettings, ServerSettings,
    SessionSettings, Settings,
};
