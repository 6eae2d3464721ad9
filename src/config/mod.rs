//! Configuration module for Delve.
//!
//! Handles loading application settings, credentials and prompt profiles.

mod prompts;
mod settings;

pub use prompts::{AnswerPrompts, Prompts, RoutingPrompts};
pub use settings::{
    ArxivSettings, CredentialSettings, GeneralSettings, ModelSettings, ServerSettings, Settings,
    TavilySettings, ToolSettings, WikipediaSettings, WorkflowSettings,
};
