mod conn;
mod event;
mod props;
mod proto;
mod tree;

pub use conn::WmConnection;
pub use event::{WindowChange, WindowEvent};
pub use props::WindowProps;
pub use tree::{Node, Rect, WindowProperties};

use anyhow::Result;
use async_trait::async_trait;

/// Seam between the scratchpad logic and the window manager.
/// The live implementation speaks the i3 IPC protocol; tests use the mock.
#[async_trait]
pub trait WmClient: Send + Sync {
    /// Snapshot of the current layout tree.
    async fn get_tree(&self) -> Result<Node>;

    /// Fire-and-forget command string. Rejections are logged, never returned;
    /// multi-step operations are joined into a single string by the caller.
    async fn run_command(&self, cmd: &str);

    /// EWMH properties of an X11 window; `None` when the window is already
    /// gone or the probe fails.
    async fn window_props(&self, xid: u32) -> Option<WindowProps>;
}

#[cfg(test)]
pub mod mock {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone)]
    pub struct MockWindow {
        pub id: i64,
        pub xid: u32,
        pub class: String,
        pub instance: String,
        pub role: String,
        pub rect: Rect,
        pub fullscreen: bool,
        pub hidden: bool,
        pub dialog: bool,
        pub modal: bool,
        /// Simulates a window that is gone by the time xprop runs.
        pub unreachable: bool,
        pub marks: Vec<String>,
    }

    impl MockWindow {
        pub fn new(id: i64, class: &str) -> Self {
            Self {
                id,
                xid: id as u32,
                class: class.to_string(),
                instance: class.to_lowercase(),
                role: String::new(),
                rect: Rect {
                    x: 0,
                    y: 0,
                    width: 800,
                    height: 600,
                },
                fullscreen: false,
                hidden: false,
                dialog: false,
                modal: false,
                unreachable: false,
                marks: Vec::new(),
            }
        }

        pub fn instance(mut self, instance: &str) -> Self {
            self.instance = instance.to_string();
            self
        }

        pub fn role(mut self, role: &str) -> Self {
            self.role = role.to_string();
            self
        }

        pub fn dialog(mut self) -> Self {
            self.dialog = true;
            self
        }

        pub fn hidden(mut self) -> Self {
            self.hidden = true;
            self
        }

        pub fn fullscreen(mut self) -> Self {
            self.fullscreen = true;
            self
        }

        pub fn rect(mut self, x: i32, y: i32, width: i32, height: i32) -> Self {
            self.rect = Rect {
                x,
                y,
                width,
                height,
            };
            self
        }

        fn to_node(&self) -> Node {
            Node {
                id: self.id,
                node_type: "con".to_string(),
                name: Some(self.class.clone()),
                window: Some(self.xid),
                window_properties: Some(WindowProperties {
                    class: Some(self.class.clone()),
                    instance: Some(self.instance.clone()),
                    window_role: if self.role.is_empty() {
                        None
                    } else {
                        Some(self.role.clone())
                    },
                    title: None,
                }),
                fullscreen_mode: self.fullscreen as u8,
                rect: self.rect,
                ..Default::default()
            }
        }
    }

    #[derive(Debug, Default)]
    struct MockState {
        windows: Vec<MockWindow>,
        focused: Option<i64>,
        commands: Vec<String>,
    }

    /// In-memory window manager. Issued command strings are recorded and the
    /// handful of commands the daemon relies on are interpreted, so tests can
    /// observe visibility and focus the way a live WM would apply them.
    #[derive(Debug, Default)]
    pub struct MockWm {
        state: Mutex<MockState>,
    }

    impl MockWm {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_windows(windows: Vec<MockWindow>) -> Self {
            let wm = Self::new();
            wm.state.lock().unwrap().windows = windows;
            wm
        }

        pub fn add_window(&self, window: MockWindow) {
            self.state.lock().unwrap().windows.push(window);
        }

        pub fn remove_window(&self, id: i64) {
            let mut state = self.state.lock().unwrap();
            state.windows.retain(|w| w.id != id);
            if state.focused == Some(id) {
                state.focused = None;
            }
        }

        pub fn set_focused(&self, id: Option<i64>) {
            self.state.lock().unwrap().focused = id;
        }

        pub fn focused(&self) -> Option<i64> {
            self.state.lock().unwrap().focused
        }

        pub fn is_hidden(&self, id: i64) -> bool {
            self.state
                .lock()
                .unwrap()
                .windows
                .iter()
                .find(|w| w.id == id)
                .map(|w| w.hidden)
                .unwrap_or(false)
        }

        pub fn window_rect(&self, id: i64) -> Option<Rect> {
            self.state
                .lock()
                .unwrap()
                .windows
                .iter()
                .find(|w| w.id == id)
                .map(|w| w.rect)
        }

        pub fn marks(&self, id: i64) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .windows
                .iter()
                .find(|w| w.id == id)
                .map(|w| w.marks.clone())
                .unwrap_or_default()
        }

        pub fn commands(&self) -> Vec<String> {
            self.state.lock().unwrap().commands.clone()
        }

        pub fn clear_commands(&self) {
            self.state.lock().unwrap().commands.clear();
        }

        /// A `window::new` event as the WM would deliver it.
        pub fn new_event(&self, id: i64) -> WindowEvent {
            let state = self.state.lock().unwrap();
            let window = state.windows.iter().find(|w| w.id == id).unwrap();
            WindowEvent {
                change: WindowChange::New,
                container: window.to_node(),
            }
        }

        pub fn close_event(&self, id: i64) -> WindowEvent {
            WindowEvent {
                change: WindowChange::Close,
                container: Node {
                    id,
                    node_type: "con".to_string(),
                    window: Some(id as u32),
                    ..Default::default()
                },
            }
        }

        fn apply(state: &mut MockState, cmd: &str) {
            let (target, payload) = match cmd.strip_prefix("[con_id=") {
                Some(rest) => {
                    let (id, rest) = rest.split_once(']').unwrap_or((rest, ""));
                    (id.trim().parse::<i64>().ok(), rest.trim_start())
                }
                None => (None, cmd),
            };

            for step in payload.split(", ") {
                let Some(id) = target else { continue };
                let focus_after_move = step == "move container to workspace current";
                if let Some(window) = state.windows.iter_mut().find(|w| w.id == id) {
                    match step {
                        "move scratchpad" => window.hidden = true,
                        "move container to workspace current" | "scratchpad show" => {
                            window.hidden = false
                        }
                        "focus" => {}
                        "fullscreen toggle" => window.fullscreen = !window.fullscreen,
                        _ => {
                            if let Some(mark) = step.strip_prefix("mark ") {
                                window.marks.push(mark.to_string());
                            } else if let Some(size) = step.strip_prefix("resize set ") {
                                if let Some((w, h)) = size.split_once(' ') {
                                    window.rect.width = w.parse().unwrap_or(window.rect.width);
                                    window.rect.height = h.parse().unwrap_or(window.rect.height);
                                }
                            } else if let Some(pos) = step.strip_prefix("move absolute position ")
                            {
                                if let Some((x, y)) = pos.split_once(' ') {
                                    window.rect.x = x.parse().unwrap_or(window.rect.x);
                                    window.rect.y = y.parse().unwrap_or(window.rect.y);
                                }
                            }
                        }
                    }
                    // Moving a container to the current workspace focuses it,
                    // as does an explicit focus.
                    if focus_after_move || step == "focus" {
                        state.focused = Some(id);
                    }
                }
            }
        }
    }

    #[async_trait]
    impl WmClient for MockWm {
        async fn get_tree(&self) -> Result<Node> {
            let state = self.state.lock().unwrap();
            let mut current: Vec<Node> = Vec::new();
            let mut scratch: Vec<Node> = Vec::new();
            for window in &state.windows {
                let mut node = window.to_node();
                node.focused = state.focused == Some(window.id);
                if window.hidden {
                    scratch.push(node);
                } else {
                    current.push(node);
                }
            }
            let workspace = Node {
                id: 10,
                node_type: "workspace".to_string(),
                name: Some("1".to_string()),
                focused: state.focused.is_none(),
                nodes: current,
                ..Default::default()
            };
            let scratch_ws = Node {
                id: 11,
                node_type: "workspace".to_string(),
                name: Some("__i3_scratch".to_string()),
                floating_nodes: scratch,
                ..Default::default()
            };
            Ok(Node {
                id: 1,
                node_type: "root".to_string(),
                nodes: vec![workspace, scratch_ws],
                ..Default::default()
            })
        }

        async fn run_command(&self, cmd: &str) {
            let mut state = self.state.lock().unwrap();
            state.commands.push(cmd.to_string());
            Self::apply(&mut state, cmd);
        }

        async fn window_props(&self, xid: u32) -> Option<WindowProps> {
            let state = self.state.lock().unwrap();
            let window = state.windows.iter().find(|w| w.xid == xid)?;
            if window.unreachable {
                return None;
            }
            Some(WindowProps {
                dialog: window.dialog,
                modal: window.modal,
                hidden: window.hidden,
            })
        }
    }
}
