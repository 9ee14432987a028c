//! Data structures for boards, relay buttons and diagnostic messages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Relay states as reported by a board: relay id mapped to a truthy value.
///
/// A `BTreeMap` keeps the entries in sorted-id order, so freshly discovered
/// relays append to the button list in the same order no matter how the board
/// happened to order its JSON keys.
pub type StatusMap = BTreeMap<String, serde_json::Value>;

/// A network-attached relay board known to the app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    /// Network address of the board (IP string on the local subnet)
    pub address: String,
    /// Consecutive failed status checks since the last success
    #[serde(default)]
    pub missed_checks: u32,
}

impl Board {
    /// Create a board record for an address that just answered a status check.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            missed_checks: 0,
        }
    }
}

/// The app's representation of one relay on one board.
///
/// Carries the last board-reported state plus the user customizations that
/// reconciliation must never destroy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayButton {
    /// Relay identifier as reported by the board (stable, unique per board)
    pub id: String,
    /// Globally unique key, derived from board address + relay id at creation
    pub uuid: Uuid,
    /// Address of the owning board
    pub board_address: String,
    /// Last-known raw relay state
    pub turned_on: bool,
    /// User preference: invert the on/off semantics shown to the user
    #[serde(default)]
    pub reversed: bool,
    /// User preference: exclude this button from rendering
    #[serde(default)]
    pub hidden: bool,
}

impl RelayButton {
    /// Create a button for a relay that a board just reported for the first time.
    pub fn new(board_address: impl Into<String>, id: impl Into<String>, turned_on: bool) -> Self {
        let board_address = board_address.into();
        let id = id.into();
        Self {
            uuid: derive_uuid(&board_address, &id),
            id,
            board_address,
            turned_on,
            reversed: false,
            hidden: false,
        }
    }

    /// The on/off state the user should see: raw state XOR the reversed flag.
    pub fn effective_on(&self) -> bool {
        self.turned_on ^ self.reversed
    }

    /// Human-readable label built from the relay id: underscores become
    /// spaces, sentence case.
    pub fn label(&self) -> String {
        let spaced = self.id.replace('_', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
            }
        }
    }
}

/// Derive the stable uuid for a relay from its owning board's address and its
/// relay id.
///
/// This is a contract: the same `(board_address, relay_id)` pair always yields
/// the same uuid, across scans and across app launches, regardless of the
/// order a board reports its relays in.
pub fn derive_uuid(board_address: &str, relay_id: &str) -> Uuid {
    let name = format!("{}/{}", board_address, relay_id);
    Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes())
}

/// Interpret a reported relay value as on/off.
///
/// Boards report `0`/`1` in practice, but any non-zero number, `true`, or a
/// non-empty non-`"0"` string counts as on.
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => !s.is_empty() && s != "0",
        _ => false,
    }
}

/// One entry in the diagnostic message log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique id for list rendering
    pub id: Uuid,
    /// Wall-clock time the message was recorded
    pub time: chrono::DateTime<chrono::Local>,
    /// Free-text diagnostic
    pub text: String,
}

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            time: chrono::Local::now(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_is_deterministic() {
        let a = derive_uuid("192.168.10.12", "relay_1");
        let b = derive_uuid("192.168.10.12", "relay_1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_uuid_distinguishes_boards_and_relays() {
        let base = derive_uuid("192.168.10.12", "relay_1");
        assert_ne!(base, derive_uuid("192.168.10.13", "relay_1"));
        assert_ne!(base, derive_uuid("192.168.10.12", "relay_2"));
    }

    #[test]
    fn test_effective_on_xor() {
        let mut button = RelayButton::new("192.168.10.12", "relay_1", true);
        assert!(button.effective_on());
        button.reversed = true;
        assert!(!button.effective_on());
        button.turned_on = false;
        assert!(button.effective_on());
    }

    #[test]
    fn test_label_sentence_case() {
        let button = RelayButton::new("192.168.10.12", "WATER_PUMP", false);
        assert_eq!(button.label(), "Water pump");
    }

    #[test]
    fn test_truthiness() {
        assert!(is_truthy(&serde_json::json!(1)));
        assert!(is_truthy(&serde_json::json!(true)));
        assert!(is_truthy(&serde_json::json!("on")));
        assert!(!is_truthy(&serde_json::json!(0)));
        assert!(!is_truthy(&serde_json::json!(false)));
        assert!(!is_truthy(&serde_json::json!("0")));
        assert!(!is_truthy(&serde_json::json!("")));
        assert!(!is_truthy(&serde_json::Value::Null));
    }

    #[test]
    fn test_button_persisted_shape() {
        let button = RelayButton::new("192.168.10.12", "relay_1", true);
        let json = serde_json::to_value(&button).unwrap();
        assert!(json.get("boardAddress").is_some());
        assert!(json.get("turnedOn").is_some());
        assert!(json.get("reversed").is_some());
        assert!(json.get("hidden").is_some());
    }
}
