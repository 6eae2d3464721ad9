//! Research agent: the routing cycle and the service both front ends share.
//!
//! The agent alternates between a model turn that may request retrieval
//! tools and, once no more tools are requested, a final answer turn.

mod runner;
mod session;

pub use runner::{ResearchAgent, Step, Transcript, DEFAULT_MAX_TOOL_ROUNDS};
pub use session::{
    Connector, Credentials, HostedConnector, ResearchRequest, ResearchService, RunOutcome,
    ValidatedRequest, ValidationWarning, MISSING_INPUT_WARNING,
};
