//! Message passing between the host and the sandboxed document.
//!
//! Every envelope carries a `source` tag. Host-bound envelopes come from the
//! runtime installed by the document builder; sandbox-bound envelopes are
//! produced here and posted into the frame by the embedding shell.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::VecDeque;

use crate::error::BridgeError;

/// Source tag of console and error envelopes.
pub const CONSOLE_SOURCE: &str = "preview-console";
/// Source tag of navigation requests coming out of the sandbox.
pub const NAVIGATION_SOURCE: &str = "preview-navigation";
/// Source tag of commands sent into the sandbox.
pub const HOST_SOURCE: &str = "preview-host";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
    /// Host-only: successful build notices.
    Success,
    /// `console.clear()` inside the sandbox.
    Clear,
}

/// Location and stack of a thrown or uncaught error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorDetails {
    pub message: String,
    pub filename: Option<String>,
    pub lineno: Option<u32>,
    pub colno: Option<u32>,
    pub stack: Option<String>,
}

/// Messages from the sandbox to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostMessage {
    Console {
        level: ConsoleLevel,
        text: String,
        details: Option<ErrorDetails>,
    },
    /// Swap to another markup page.
    NavigatePage { page: String },
    /// In-document route change; no rebuild.
    NavigatePath { path: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    source: String,
    #[serde(rename = "type")]
    kind: Option<ConsoleLevel>,
    args: Option<Value>,
    error_details: Option<ErrorDetails>,
    action: Option<String>,
    page: Option<String>,
    path: Option<String>,
}

impl HostMessage {
    /// Decode a posted message. Anything not produced by the sandbox runtime
    /// is `Unrecognized`.
    pub fn decode(value: &Value) -> Result<Self, BridgeError> {
        let source_tag = value
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        if source_tag != CONSOLE_SOURCE && source_tag != NAVIGATION_SOURCE {
            return Err(BridgeError::Unrecognized { source_tag });
        }

        let envelope: Envelope =
            serde_json::from_value(value.clone()).map_err(|e| BridgeError::Malformed {
                message: e.to_string(),
            })?;

        if envelope.source == CONSOLE_SOURCE {
            return Ok(HostMessage::Console {
                level: envelope.kind.unwrap_or(ConsoleLevel::Log),
                text: args_text(envelope.args.as_ref()),
                details: envelope.error_details,
            });
        }

        if envelope.action.as_deref() != Some("navigate") {
            return Err(BridgeError::Unrecognized { source_tag });
        }
        match (envelope.page, envelope.path) {
            (Some(page), _) if !page.is_empty() => Ok(HostMessage::NavigatePage { page }),
            (_, Some(path)) if !path.is_empty() => Ok(HostMessage::NavigatePath { path }),
            _ => Err(BridgeError::Malformed {
                message: "navigation without page or path".to_string(),
            }),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            HostMessage::Console {
                level,
                text,
                details,
            } => json!({
                "source": CONSOLE_SOURCE,
                "type": level,
                "args": text,
                "errorDetails": details,
            }),
            HostMessage::NavigatePage { page } => json!({
                "source": NAVIGATION_SOURCE,
                "action": "navigate",
                "page": page,
            }),
            HostMessage::NavigatePath { path } => json!({
                "source": NAVIGATION_SOURCE,
                "action": "navigate",
                "path": path,
            }),
        }
    }
}

/// The runtime joins console arguments before posting; tolerate raw arrays too.
fn args_text(args: Option<&Value>) -> String {
    match args {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" "),
        Some(other) => other.to_string(),
    }
}

/// Commands from the host into the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxCommand {
    NavigatePage(String),
    NavigatePath(String),
}

impl SandboxCommand {
    pub fn to_json(&self) -> Value {
        match self {
            SandboxCommand::NavigatePage(page) => json!({
                "source": HOST_SOURCE,
                "action": "navigate",
                "page": page,
            }),
            SandboxCommand::NavigatePath(path) => json!({
                "source": HOST_SOURCE,
                "action": "navigate",
                "path": path,
            }),
        }
    }
}

/// FIFO queue standing in for `postMessage`. Messages sent after
/// [`close`](BridgeChannel::close) are dropped.
#[derive(Debug)]
pub struct BridgeChannel<T> {
    queue: VecDeque<T>,
    open: bool,
}

impl<T> Default for BridgeChannel<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            open: true,
        }
    }
}

impl<T> BridgeChannel<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `message`; returns false when the channel is closed.
    pub fn send(&mut self, message: T) -> bool {
        if !self.open {
            return false;
        }
        self.queue.push_back(message);
        true
    }

    pub fn recv(&mut self) -> Option<T> {
        self.queue.pop_front()
    }

    /// Take every pending message in arrival order.
    pub fn drain(&mut self) -> Vec<T> {
        self.queue.drain(..).collect()
    }

    pub fn close(&mut self) {
        self.open = false;
        self.queue.clear();
    }

    pub fn reopen(&mut self) {
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_console() {
        let msg = HostMessage::decode(&json!({
            "source": "preview-console",
            "type": "warn",
            "args": "careful now"
        }))
        .unwrap();
        assert_eq!(
            msg,
            HostMessage::Console {
                level: ConsoleLevel::Warning,
                text: "careful now".to_string(),
                details: None
            }
        );
    }

    #[test]
    fn test_decode_error_details() {
        let msg = HostMessage::decode(&json!({
            "source": "preview-console",
            "type": "error",
            "args": "boom",
            "errorDetails": {
                "message": "boom",
                "filename": "about:srcdoc",
                "lineno": 42,
                "colno": 7,
                "stack": null
            }
        }))
        .unwrap();
        match msg {
            HostMessage::Console {
                level: ConsoleLevel::Error,
                details: Some(details),
                ..
            } => {
                assert_eq!(details.lineno, Some(42));
                assert_eq!(details.colno, Some(7));
                assert_eq!(details.stack, None);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_navigation() {
        assert_eq!(
            HostMessage::decode(&json!({"source": "preview-navigation", "action": "navigate", "page": "about.html"})),
            Ok(HostMessage::NavigatePage { page: "about.html".to_string() })
        );
        assert_eq!(
            HostMessage::decode(&json!({"source": "preview-navigation", "action": "navigate", "path": "/users/1"})),
            Ok(HostMessage::NavigatePath { path: "/users/1".to_string() })
        );
        assert!(matches!(
            HostMessage::decode(&json!({"source": "preview-navigation", "action": "navigate"})),
            Err(BridgeError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unknown_sources_are_unrecognized() {
        assert_eq!(
            HostMessage::decode(&json!({"source": "devtools", "payload": 1})),
            Err(BridgeError::Unrecognized { source_tag: "devtools".to_string() })
        );
        assert!(matches!(
            HostMessage::decode(&json!("plain string")),
            Err(BridgeError::Unrecognized { .. })
        ));
    }

    #[test]
    fn test_array_args_are_joined() {
        let msg = HostMessage::decode(&json!({
            "source": "preview-console",
            "type": "log",
            "args": ["a", 1, {"k": true}]
        }))
        .unwrap();
        assert!(matches!(msg, HostMessage::Console { ref text, .. } if text == r#"a 1 {"k":true}"#));
    }

    #[test]
    fn test_encode_decode_host_message() {
        let msg = HostMessage::NavigatePath { path: "/x".to_string() };
        assert_eq!(HostMessage::decode(&msg.to_json()), Ok(msg));
    }

    #[test]
    fn test_sandbox_command_shape() {
        let json = SandboxCommand::NavigatePath("/about".to_string()).to_json();
        assert_eq!(json["source"], "preview-host");
        assert_eq!(json["action"], "navigate");
        assert_eq!(json["path"], "/about");
        assert!(json.get("page").is_none());
    }

    #[test]
    fn test_channel_is_fifo_and_closable() {
        let mut channel = BridgeChannel::new();
        assert!(channel.send(1));
        assert!(channel.send(2));
        assert_eq!(channel.recv(), Some(1));
        assert!(channel.send(3));
        assert_eq!(channel.drain(), vec![2, 3]);

        channel.close();
        assert!(!channel.send(4));
        assert!(channel.is_empty());
    }
}
