use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowProperties {
    pub class: Option<String>,
    pub instance: Option<String>,
    pub window_role: Option<String>,
    pub title: Option<String>,
}

/// A node of the window manager's layout tree, as returned by GET_TREE.
/// Only the fields the daemon reads are deserialized.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Node {
    pub id: i64,
    #[serde(default, rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub name: Option<String>,
    /// X11 window id; present only on leaves that carry a real window.
    #[serde(default)]
    pub window: Option<u32>,
    #[serde(default)]
    pub window_properties: Option<WindowProperties>,
    #[serde(default)]
    pub fullscreen_mode: u8,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub floating_nodes: Vec<Node>,
}

impl Node {
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().chain(self.floating_nodes.iter())
    }

    /// All nodes carrying a real window, in tree order.
    pub fn leaves(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Node>) {
        if self.window.is_some() {
            out.push(self);
        }
        for child in self.children() {
            child.collect_leaves(out);
        }
    }

    pub fn find(&self, id: i64) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children().find_map(|c| c.find(id))
    }

    pub fn find_focused(&self) -> Option<&Node> {
        if self.focused {
            return Some(self);
        }
        self.children().find_map(|c| c.find_focused())
    }

    /// The workspace containing the focused node.
    pub fn focused_workspace(&self) -> Option<&Node> {
        self.workspace_of_focused(None)
    }

    fn workspace_of_focused<'a>(&'a self, workspace: Option<&'a Node>) -> Option<&'a Node> {
        let workspace = if self.node_type == "workspace" {
            Some(self)
        } else {
            workspace
        };
        if self.focused {
            return workspace;
        }
        self.children()
            .find_map(|c| c.workspace_of_focused(workspace))
    }
}
