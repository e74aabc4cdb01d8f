//! Agent loop integration
//!
//! The live conversation state, the user-notification seam and the loop
//! driver that applies compaction transitions between turns.

pub mod context;
pub mod driver;
pub mod interface;
pub mod usage;

pub use context::AgentContext;
pub use driver::{
    AgentLoop, DEFAULT_SAVE_ATTEMPTS, DEFAULT_SAVE_BACKOFF, MIN_HISTORY_FOR_COMPACTION,
};
pub use interface::{BufferedInterface, LogInterface, UserInterface};
pub use usage::{ModelUsage, UsageSummary};
