use serde::Deserialize;

use super::tree::Node;

/// Payload of a `window` event from the WM event stream.
#[derive(Debug, Clone, Deserialize)]
pub struct WindowEvent {
    pub change: WindowChange,
    pub container: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowChange {
    New,
    Close,
    Focus,
    Title,
    FullscreenMode,
    Move,
    Floating,
    Urgent,
    Mark,
    #[serde(other)]
    Unknown,
}
