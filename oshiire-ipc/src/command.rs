use serde::{Deserialize, Serialize};

/// Operations accepted on the control socket.
///
/// The set is closed: anything that does not deserialize into one of these
/// variants is rejected at the socket boundary without touching daemon state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Scratchpad operations
    Show { tag: String },
    Hide { tag: String },
    Next,
    Toggle { tag: String },
    HideCurrent,
    Run { tag: String, app: String },
    Dialog,

    // Geometry operations
    GeomRestore,
    GeomDump,
    GeomSave,
    GeomAutosaveMode,

    // Queries
    ListTags,
    GetState,

    // Control
    Reload,
    Quit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    Tags { tags: Vec<TagInfo> },
    State { state: StateInfo },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagInfo {
    pub name: String,
    pub window_count: usize,
    pub classes: Vec<String>,
    pub geom: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateInfo {
    pub tag_count: usize,
    pub window_count: usize,
    pub transient_count: usize,
    pub autosave: bool,
}
