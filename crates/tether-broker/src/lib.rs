//! tether-broker — the debugging broker core.
//!
//! Binds controlling-client session ids to live inspector
//! conversations: the per-target session aggregate with its state
//! machine and event-driven cache, the registry with admission policy
//! and capacity, and the typed command surface the outer layer adapts.

pub mod breakpoint;
pub mod commands;
pub mod error;
pub mod events;
pub mod policy;
pub mod protocol;
pub mod registry;
pub mod resources;
pub mod session;
pub mod state;
pub mod view;

// Re-export key types for convenience.
pub use breakpoint::{BreakpointRecord, BreakpointTable, RequestedLocation, ResolvedLocation};
pub use commands::{ConnectResult, DebugBroker, SetBreakpointResult};
pub use error::BrokerError;
pub use events::{SessionEvent, SessionEventKind};
pub use protocol::{EvaluateResult, PauseOnExceptionsState, RemoteObject};
pub use registry::{RegistryConfig, SessionRegistry};
pub use session::{DebugSession, StepKind};
pub use state::{PausedSnapshot, ScriptRecord, SessionState};
pub use view::{
    CallStack, EnrichedFrame, OriginalLocation, ProjectedLocation, ScriptInfo, ScriptSource,
    VariableEntry,
};
