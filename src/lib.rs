//! # vanswitch - relay board discovery and control core
//!
//! The headless core of a client for network-attached relay-switch boards
//! ("van switches"): discovers boards on the local subnet, keeps their relay
//! states fresh by polling, and owns a user-customizable button list (order,
//! visibility, reversed polarity) persisted across launches. Rendering is
//! somebody else's job: a UI layer reads this crate's read models and issues
//! its commands, nothing more.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vanswitch::{AppConfig, AppController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = AppController::new(AppConfig::default())?;
//!     controller.load_saved().await;
//!     let poll_task = controller.spawn_poller();
//!
//!     for button in controller.visible_buttons().await {
//!         println!("{}: {}", button.label(), button.effective_on());
//!     }
//!
//!     controller.shutdown();
//!     poll_task.await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod error;
pub mod relay;
pub mod storage;

// Re-export public API
pub use app::{AppConfig, AppController};
pub use error::{Result, SwitchError};
pub use relay::{
    client::BoardClient,
    data::{derive_uuid, Board, Message, RelayButton, StatusMap},
    messages::MessageLog,
    poller::{PollConfig, PollEvent, Poller},
    scanner::{ScanConfig, ScanOutcome, Scanner},
};
pub use storage::Storage;

/// The default interval between status polls in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// The default number of consecutive missed checks before a board is evicted
pub const DEFAULT_EVICTION_THRESHOLD: u32 = 14;
