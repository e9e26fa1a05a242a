//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports are the seams where adapters plug in, and where tests substitute
//! fakes. Every collaborator is injected into the orchestrator as an
//! explicitly constructed service object.
//!
//! ```text
//!                      ┌──────────────────────┐
//!   MessageSource ───▶ │     Orchestrator     │ ───▶ EventPublisher
//!                      └──────────────────────┘
//!                        │        │         │
//!                        ▼        ▼         ▼
//!                  RecordStore  Workload  ClusterInventory
//!                               Deployer
//! ```

pub mod outbound;

pub use outbound::channel::{AckHandle, ChannelEvent, EventPublisher, InboundMessage, MessageSource};
pub use outbound::deployer::{ReleaseSpec, WorkloadDeployer};
pub use outbound::inventory::ClusterInventory;
pub use outbound::keys::KeyGenerator;
pub use outbound::store::RecordStore;
