use crate::wm::{Node, Rect};

/// WM container id. Stable for the lifetime of the window, reused after.
pub type WindowId = i64;

/// Attributes cached at classification time. The underlying window is owned
/// by the window manager and may vanish at any moment; nothing here is
/// assumed valid after a close event for the same id.
#[derive(Debug, Clone)]
pub struct Window {
    pub id: WindowId,
    pub xid: Option<u32>,
    pub class: String,
    pub instance: String,
    pub role: String,
    pub rect: Rect,
    pub fullscreen: bool,
}

impl Window {
    pub fn from_node(node: &Node) -> Self {
        let props = node.window_properties.clone().unwrap_or_default();
        Self {
            id: node.id,
            xid: node.window,
            class: props.class.unwrap_or_default(),
            instance: props.instance.unwrap_or_default(),
            role: props.window_role.unwrap_or_default(),
            rect: node.rect,
            fullscreen: node.fullscreen_mode != 0,
        }
    }
}
