//! Application controller: single owner of the shared state.
//!
//! All board/button/message state lives in one `AppState` behind an
//! `Arc<RwLock>`, and every mutation funnels through a named command on
//! `AppController`. Scanner and poller completions apply their results under
//! the same lock, and each in-flight operation carries the generation counter
//! it started under: a completion that resolves after a `reset` or
//! `forget_boards` is discarded instead of resurrecting removed state.

use crate::app::config::AppConfig;
use crate::error::{Result, SwitchError};
use crate::relay::client::BoardClient;
use crate::relay::data::{derive_uuid, Board, Message, RelayButton};
use crate::relay::messages::MessageLog;
use crate::relay::poller::{PollEvent, Poller};
use crate::relay::scanner::Scanner;
use crate::relay::store;
use crate::storage::{Storage, KEY_BOARD_IPS, KEY_BUTTONS};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// All mutable application state, owned by the controller.
#[derive(Debug, Default)]
struct AppState {
    boards: Vec<Board>,
    buttons: Vec<RelayButton>,
    messages: MessageLog,
    /// Bumped by reset/forget; stale async completions compare against it
    generation: u64,
    /// Buttons with a toggle command currently in flight
    toggling: HashSet<Uuid>,
}

/// Owner of the application state and entry point for every command the
/// presentation layer can issue.
#[derive(Clone)]
pub struct AppController {
    state: Arc<RwLock<AppState>>,
    storage: Storage,
    scanner: Scanner,
    poller: Poller,
    client: BoardClient,
    scanning: Arc<AtomicBool>,
    scan_progress: Arc<AtomicU8>,
    poll_busy: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
}

impl AppController {
    /// Build a controller from configuration.
    pub fn new(config: AppConfig) -> Result<Self> {
        let storage = match &config.storage_dir {
            Some(dir) => Storage::new(dir.clone()),
            None => Storage::default_location()?,
        };

        let client = match config.request_timeout_ms {
            Some(ms) => BoardClient::with_timeout(Duration::from_millis(ms))?,
            None => BoardClient::new()?,
        };

        Ok(Self {
            state: Arc::new(RwLock::new(AppState::default())),
            storage,
            scanner: Scanner::new(client.clone(), config.scan.clone()),
            poller: Poller::new(client.clone(), config.poll.clone()),
            client,
            scanning: Arc::new(AtomicBool::new(false)),
            scan_progress: Arc::new(AtomicU8::new(0)),
            poll_busy: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    // ---- startup -----------------------------------------------------------

    /// Restore persisted boards and buttons, or start a fresh scan when no
    /// boards were ever saved.
    pub async fn load_saved(&self) {
        let mut need_scan = false;
        {
            let mut state = self.state.write().await;

            state.messages.add("Loading saved IPs...");
            match self.storage.load::<Vec<String>>(KEY_BOARD_IPS) {
                Ok(Some(ips)) if !ips.is_empty() => {
                    state
                        .messages
                        .add(format!("Restoring saved IPs: {}", ips.join(", ")));
                    state.boards = ips.into_iter().map(Board::new).collect();
                    self.scan_progress.store(100, Ordering::Relaxed);
                }
                Ok(_) => {
                    state.messages.add("No active IPs stored");
                    need_scan = true;
                }
                Err(e) => {
                    state.messages.add(format!("Error retrieving data: {}", e));
                    need_scan = true;
                }
            }

            state.messages.add("Loading saved buttons...");
            match self.storage.load::<Vec<RelayButton>>(KEY_BUTTONS) {
                Ok(Some(buttons)) if !buttons.is_empty() => {
                    state
                        .messages
                        .add(format!("Restoring {} saved buttons", buttons.len()));
                    state.buttons = buttons;
                }
                Ok(_) => {
                    state.messages.add("No buttons previously saved");
                }
                Err(e) => {
                    state.messages.add(format!("Error retrieving data: {}", e));
                }
            }
        }

        if need_scan {
            self.add_message("Scanning for boards...").await;
            if let Err(e) = self.scan().await {
                self.add_message(e.to_string()).await;
            }
        }
    }

    // ---- discovery ---------------------------------------------------------

    /// Run one bounded discovery scan.
    ///
    /// Refused while another scan is in flight. Discovered boards are merged
    /// into the known set, their relay states reconciled into the button
    /// list, and both persisted.
    pub async fn scan(&self) -> Result<()> {
        if self.scanning.swap(true, Ordering::SeqCst) {
            return Err(SwitchError::rejected("scan already in progress"));
        }
        self.scan_progress.store(0, Ordering::Relaxed);

        let (known, generation) = {
            let state = self.state.read().await;
            (self.board_address_list(&state), state.generation)
        };

        let progress = Arc::clone(&self.scan_progress);
        let outcome = self
            .scanner
            .scan(&known, move |pct| progress.store(pct, Ordering::Relaxed))
            .await;

        let superseded = {
            let mut state = self.state.write().await;
            if state.generation != generation {
                info!("Discarding results of a superseded scan");
                true
            } else {
                for (address, statuses) in &outcome.discovered {
                    if !state.boards.iter().any(|b| &b.address == address) {
                        state.boards.push(Board::new(address.clone()));
                    }
                    store::reconcile(&mut state.buttons, address, statuses);
                    state
                        .messages
                        .add(format!("IP {} responded with 200", address));
                }
                if outcome.failed > 0 {
                    state.messages.add(format!(
                        "{} of {} scanned addresses did not respond",
                        outcome.failed, outcome.attempted
                    ));
                }
                self.save_boards(&mut state);
                self.save_buttons(&mut state);
                false
            }
        };

        // A discarded scan must not report completion; the fresh scan that
        // superseded it owns the progress indicator now.
        if !superseded {
            self.scan_progress.store(100, Ordering::Relaxed);
        }
        self.scanning.store(false, Ordering::SeqCst);
        Ok(())
    }

    // ---- polling -----------------------------------------------------------

    /// Run one status-synchronization pass over all known boards.
    ///
    /// Skipped while a scan is in flight, while a previous pass is still
    /// running, or when no boards are known.
    pub async fn poll_once(&self) {
        if self.scanning.load(Ordering::SeqCst) {
            return;
        }
        if self.poll_busy.swap(true, Ordering::SeqCst) {
            return;
        }

        let (addresses, generation) = {
            let state = self.state.read().await;
            (self.board_address_list(&state), state.generation)
        };

        if !addresses.is_empty() {
            let results = self.poller.fetch_all(&addresses).await;

            let mut state = self.state.write().await;
            if state.generation == generation {
                let events = self.poller.apply(&mut state.boards, results);

                let buttons_before = state.buttons.clone();
                let mut boards_changed = false;
                for event in events {
                    match event {
                        PollEvent::Status { address, statuses } => {
                            store::reconcile(&mut state.buttons, &address, &statuses);
                        }
                        PollEvent::Missed {
                            address,
                            missed_checks,
                        } => {
                            state.messages.add(format!(
                                "Board {} missed {} status checks",
                                address, missed_checks
                            ));
                        }
                        PollEvent::Evicted { address } => {
                            boards_changed = true;
                            state
                                .messages
                                .add(format!("Board {} silent for too long, dropped", address));
                        }
                    }
                }

                if state.buttons != buttons_before {
                    self.save_buttons(&mut state);
                }
                if boards_changed {
                    self.save_boards(&mut state);
                }
            }
        }

        self.poll_busy.store(false, Ordering::SeqCst);
    }

    /// Spawn the recurring poll task.
    ///
    /// Ticks at the configured interval until [`shutdown`](Self::shutdown) is
    /// called; each tick delegates to [`poll_once`](Self::poll_once), whose
    /// guards make overlapping or scan-concurrent passes a no-op.
    pub fn spawn_poller(&self) -> tokio::task::JoinHandle<()> {
        let controller = self.clone();
        let interval_ms = self.poller.config().interval_ms;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                if controller.cancel.load(Ordering::Relaxed) {
                    info!("Poll task shutting down");
                    break;
                }
                controller.poll_once().await;
            }
        })
    }

    /// Signal background tasks to stop after their current tick.
    pub fn shutdown(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    // ---- relay commands ----------------------------------------------------

    /// Dispatch a toggle command to the owning board for one relay.
    ///
    /// Returns `false` when the command was ignored because a toggle for the
    /// same button is still in flight. The board's answer (the post-toggle
    /// status map) is reconciled back in; failures release the guard and
    /// surface as a diagnostic message.
    pub async fn send_toggle(&self, board_address: &str, relay_id: &str) -> bool {
        let uuid = derive_uuid(board_address, relay_id);

        let generation = {
            let mut state = self.state.write().await;
            if !state.toggling.insert(uuid) {
                return false;
            }
            state.generation
        };

        let result = self.client.send_toggle(board_address, relay_id).await;

        let mut state = self.state.write().await;
        state.toggling.remove(&uuid);
        match result {
            Ok(statuses) if state.generation == generation => {
                let before = state.buttons.clone();
                store::reconcile(&mut state.buttons, board_address, &statuses);
                if state.buttons != before {
                    self.save_buttons(&mut state);
                }
            }
            Ok(_) => info!("Discarding toggle response from a superseded generation"),
            Err(e) => {
                state
                    .messages
                    .add(format!("Error toggling {}. Error: {}", relay_id, e));
            }
        }
        true
    }

    /// Flip the reversed-polarity preference on one button.
    pub async fn toggle_reversed(&self, uuid: Uuid) {
        let mut state = self.state.write().await;
        if store::toggle_reversed(&mut state.buttons, uuid) {
            self.save_buttons(&mut state);
        }
    }

    /// Hide one button from the visible list.
    pub async fn hide(&self, uuid: Uuid) {
        let mut state = self.state.write().await;
        if store::hide(&mut state.buttons, uuid) {
            self.save_buttons(&mut state);
        }
    }

    /// Make every hidden button visible again. No-op when nothing is hidden.
    pub async fn unhide_all(&self) {
        let mut state = self.state.write().await;
        if store::unhide_all(&mut state.buttons) {
            self.save_buttons(&mut state);
        }
    }

    /// Replace the button order with a drag result. Sequences that are not a
    /// permutation of the current set are refused.
    pub async fn reorder(&self, sequence: &[Uuid]) -> Result<()> {
        let mut state = self.state.write().await;
        if store::reorder(&mut state.buttons, sequence) {
            self.save_buttons(&mut state);
            Ok(())
        } else {
            Err(SwitchError::rejected(
                "reorder sequence does not match the current button set",
            ))
        }
    }

    // ---- destructive commands ----------------------------------------------

    /// Drop all state and persisted storage, then start one fresh scan.
    pub async fn reset(&self) {
        {
            let mut state = self.state.write().await;
            state.generation += 1;
            state.boards.clear();
            state.buttons.clear();
            state.toggling.clear();
            self.scan_progress.store(0, Ordering::Relaxed);

            match self.storage.clear() {
                Ok(()) => state.messages.add("Cleared storage successfully"),
                Err(e) => state
                    .messages
                    .add(format!("Error clearing local storage: {}", e)),
            }
        }

        // A scan that was in flight when the reset landed holds the scanning
        // flag until it discards itself; wait it out so the reset always gets
        // its own fresh scan.
        loop {
            match self.scan().await {
                Ok(()) => break,
                Err(e) => {
                    info!("Post-reset scan waiting: {}", e);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
            }
        }
    }

    /// Forget the known boards (persisted list included) without touching
    /// buttons, so the next scan starts from the default range.
    pub async fn forget_boards(&self) {
        let mut state = self.state.write().await;
        state.generation += 1;
        state.boards.clear();
        self.scan_progress.store(0, Ordering::Relaxed);
        self.save_boards(&mut state);
        state.messages.add("Forgot known boards");
    }

    // ---- diagnostics -------------------------------------------------------

    pub async fn add_message(&self, text: impl Into<String>) {
        self.state.write().await.messages.add(text);
    }

    pub async fn clear_messages(&self) {
        self.state.write().await.messages.clear();
    }

    // ---- read models -------------------------------------------------------

    /// Buttons the presentation layer should render, in user order.
    pub async fn visible_buttons(&self) -> Vec<RelayButton> {
        store::visible(&self.state.read().await.buttons)
    }

    /// Every button, hidden ones included.
    pub async fn all_buttons(&self) -> Vec<RelayButton> {
        self.state.read().await.buttons.clone()
    }

    pub async fn hidden_count(&self) -> usize {
        store::hidden_count(&self.state.read().await.buttons)
    }

    /// Addresses of the boards currently considered reachable.
    pub async fn board_addresses(&self) -> Vec<String> {
        self.board_address_list(&*self.state.read().await)
    }

    /// Newest-first diagnostic log.
    pub async fn messages(&self) -> Vec<Message> {
        self.state.read().await.messages.all().to_vec()
    }

    /// Whether a toggle command for this button is still in flight.
    pub async fn is_toggling(&self, uuid: Uuid) -> bool {
        self.state.read().await.toggling.contains(&uuid)
    }

    pub fn scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }

    /// Scan progress as a percentage, 0 through 100.
    pub fn scan_progress(&self) -> u8 {
        self.scan_progress.load(Ordering::Relaxed)
    }

    // ---- internals ---------------------------------------------------------

    fn board_address_list(&self, state: &AppState) -> Vec<String> {
        state.boards.iter().map(|b| b.address.clone()).collect()
    }

    fn save_boards(&self, state: &mut AppState) {
        let addresses: Vec<String> = state.boards.iter().map(|b| b.address.clone()).collect();
        if let Err(e) = self.storage.save(KEY_BOARD_IPS, &addresses) {
            state.messages.add(format!("Error saving boardIps data: {}", e));
        }
    }

    fn save_buttons(&self, state: &mut AppState) {
        if let Err(e) = self.storage.save(KEY_BUTTONS, &state.buttons) {
            state.messages.add(format!("Error saving buttons data: {}", e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::data::StatusMap;

    fn test_controller() -> (tempfile::TempDir, AppController) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::new()
            .with_storage_dir(dir.path())
            .with_request_timeout_ms(200);
        let controller = AppController::new(config).unwrap();
        (dir, controller)
    }

    async fn seed_buttons(controller: &AppController) -> Vec<RelayButton> {
        let mut statuses = StatusMap::new();
        statuses.insert("relay_1".to_string(), serde_json::json!(1));
        statuses.insert("relay_2".to_string(), serde_json::json!(0));
        {
            let mut state = controller.state.write().await;
            state.boards.push(Board::new("192.168.10.12"));
            store::reconcile(&mut state.buttons, "192.168.10.12", &statuses);
        }
        controller.all_buttons().await
    }

    #[tokio::test]
    async fn test_reversed_changes_effective_state_only() {
        let (_dir, controller) = test_controller();
        let buttons = seed_buttons(&controller).await;
        assert!(buttons[0].turned_on);
        assert!(buttons[0].effective_on());

        controller.toggle_reversed(buttons[0].uuid).await;
        let after = controller.all_buttons().await;
        assert!(after[0].turned_on);
        assert!(!after[0].effective_on());
    }

    #[tokio::test]
    async fn test_hide_and_unhide_all() {
        let (_dir, controller) = test_controller();
        let buttons = seed_buttons(&controller).await;

        controller.hide(buttons[0].uuid).await;
        assert_eq!(controller.visible_buttons().await.len(), 1);
        assert_eq!(controller.hidden_count().await, 1);

        controller.unhide_all().await;
        assert_eq!(controller.visible_buttons().await.len(), 2);
        assert_eq!(controller.hidden_count().await, 0);
    }

    #[tokio::test]
    async fn test_reorder_rejects_mismatched_sequence() {
        let (_dir, controller) = test_controller();
        let buttons = seed_buttons(&controller).await;

        let bad = vec![buttons[0].uuid];
        assert!(controller.reorder(&bad).await.is_err());

        let good = vec![buttons[1].uuid, buttons[0].uuid];
        controller.reorder(&good).await.unwrap();
        let after = controller.all_buttons().await;
        assert_eq!(after[0].uuid, buttons[1].uuid);
    }

    #[tokio::test]
    async fn test_forget_boards_keeps_buttons() {
        let (_dir, controller) = test_controller();
        seed_buttons(&controller).await;

        controller.forget_boards().await;
        assert!(controller.board_addresses().await.is_empty());
        assert_eq!(controller.all_buttons().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_toggle_releases_guard_and_logs() {
        let (_dir, controller) = test_controller();

        // discard port, nothing listens there
        let dispatched = controller.send_toggle("127.0.0.1:9", "relay_1").await;
        assert!(dispatched);

        let uuid = derive_uuid("127.0.0.1:9", "relay_1");
        assert!(!controller.is_toggling(uuid).await);
        let messages = controller.messages().await;
        assert!(messages[0].text.contains("Error toggling relay_1"));
    }

    #[tokio::test]
    async fn test_message_commands() {
        let (_dir, controller) = test_controller();
        controller.add_message("hello").await;
        assert_eq!(controller.messages().await[0].text, "hello");
        controller.clear_messages().await;
        assert!(controller.messages().await.is_empty());
    }

    #[tokio::test]
    async fn test_persisted_state_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::new()
            .with_storage_dir(dir.path())
            .with_request_timeout_ms(200);

        let buttons = {
            let controller = AppController::new(config.clone()).unwrap();
            let buttons = seed_buttons(&controller).await;
            let mut state = controller.state.write().await;
            controller.save_boards(&mut state);
            controller.save_buttons(&mut state);
            buttons
        };

        let controller = AppController::new(config).unwrap();
        controller.load_saved().await;
        assert_eq!(
            controller.board_addresses().await,
            vec!["192.168.10.12".to_string()]
        );
        assert_eq!(controller.all_buttons().await, buttons);
        assert_eq!(controller.scan_progress(), 100);
    }
}
