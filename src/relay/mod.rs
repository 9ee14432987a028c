//! Domain core: board and button data model, reconciliation, diagnostics,
//! board HTTP client, discovery scanner and status poller.

pub mod client;
pub mod data;
pub mod messages;
pub mod poller;
pub mod scanner;
pub mod store;

// Re-export commonly used items
pub use client::BoardClient;
pub use data::{Board, Message, RelayButton, StatusMap};
pub use messages::MessageLog;
pub use poller::{PollConfig, PollEvent, Poller};
pub use scanner::{ScanConfig, ScanOutcome, Scanner};
