//! Decision payloads and their translation into trading actions.

use std::fmt;

const BUY_KEYWORDS: [&str; 3] = ["buy", "purchase", "acquire"];
const SELL_KEYWORDS: [&str; 2] = ["sell", "short"];

/// What the simulation does on a rebalancing date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            Action::Buy => "buy",
            Action::Sell => "sell",
            Action::Hold => "hold",
        };
        f.pad(word)
    }
}

/// Raw output of a decision oracle.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionPayload {
    Text(String),
    Structured(serde_json::Value),
}

impl DecisionPayload {
    /// Lowercased text used for keyword matching. Structured payloads are
    /// matched against their JSON rendering, keys included.
    pub fn normalized_text(&self) -> String {
        match self {
            DecisionPayload::Text(text) => text.to_lowercase(),
            DecisionPayload::Structured(value) => value.to_string().to_lowercase(),
        }
    }
}

impl From<&str> for DecisionPayload {
    fn from(text: &str) -> Self {
        DecisionPayload::Text(text.to_string())
    }
}

impl From<String> for DecisionPayload {
    fn from(text: String) -> Self {
        DecisionPayload::Text(text)
    }
}

impl From<serde_json::Value> for DecisionPayload {
    fn from(value: serde_json::Value) -> Self {
        DecisionPayload::Structured(value)
    }
}

/// Map a payload to an action by substring match: buy words win over sell
/// words, anything unrecognised is a hold.
pub fn interpret(payload: &DecisionPayload) -> Action {
    let text = payload.normalized_text();
    if BUY_KEYWORDS.iter().any(|k| text.contains(k)) {
        Action::Buy
    } else if SELL_KEYWORDS.iter().any(|k| text.contains(k)) {
        Action::Sell
    } else {
        Action::Hold
    }
}
