//! Application services (use cases).
//!
//! The orchestrator drives lifecycle commands through the outbound ports;
//! the consume loop feeds it deliveries from one queue.

pub mod consume;
pub mod orchestrator;
pub mod retry;

pub use consume::{ConsumeLoop, ConsumeSummary};
pub use orchestrator::{Disposition, Orchestrator, OrchestratorSettings};
pub use retry::PollPolicy;
