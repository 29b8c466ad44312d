use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use uuid::Uuid;

use oshiire_ipc::{StateInfo, TagInfo};

use crate::core::classifier;
use crate::core::config::Config;
use crate::core::geometry::{self, GeometryStore};
use crate::core::registry::Registry;
use crate::core::window::{Window, WindowId};
use crate::wm::{WindowChange, WindowEvent, WmClient};

enum Admission {
    Member(String),
    Transient,
    Untracked,
}

/// The scratchpad controller: owns tag membership, geometry and the autosave
/// flag, and drives the window manager through compound fire-and-forget
/// commands. All mutation funnels through the daemon's single event loop, so
/// no operation here ever races another.
pub struct Scratchpad<W: WmClient> {
    wm: Arc<W>,
    config: Config,
    config_path: PathBuf,
    registry: Registry,
    geometry: GeometryStore,
    /// Windows force-unfullscreened while a tag was shown over them.
    fullscreen_restore: Vec<WindowId>,
    autosave: bool,
}

impl<W: WmClient> Scratchpad<W> {
    pub fn new(wm: Arc<W>, config: Config, config_path: PathBuf) -> Self {
        let registry = Registry::new(config.tags.clone());
        let geometry = GeometryStore::from_config(&config);
        Self {
            wm,
            config,
            config_path,
            registry,
            geometry,
            fullscreen_restore: Vec::new(),
            autosave: false,
        }
    }

    // ---- event bridge ----------------------------------------------------

    pub async fn handle_window_event(&mut self, event: WindowEvent) {
        match event.change {
            WindowChange::New => self.admit(Window::from_node(&event.container)).await,
            WindowChange::Close => self.release(event.container.id).await,
            _ => {}
        }
    }

    async fn classify(&self, window: &Window) -> Admission {
        let Some(tag) = classifier::matching_tag(window, self.registry.tag_configs()) else {
            return Admission::Untracked;
        };
        let name = tag.name.clone();
        let props = match window.xid {
            Some(xid) => self.wm.window_props(xid).await,
            None => None,
        };
        if classifier::is_dialog(window, props.as_ref()) {
            Admission::Transient
        } else {
            Admission::Member(name)
        }
    }

    async fn admit(&mut self, window: Window) {
        match self.classify(&window).await {
            Admission::Member(tag) => {
                if self.registry.is_member(&tag, window.id) {
                    return;
                }
                let cmd = self.admit_command(&tag, window.id, true);
                self.wm.run_command(&cmd).await;
                tracing::info!("window {} ({}) tagged {}", window.id, window.class, tag);
                self.registry.admit(&tag, window);
            }
            Admission::Transient => {
                tracing::debug!("window {} ({}) held as transient", window.id, window.class);
                self.registry.push_transient(window);
                self.dialog_toggle().await;
            }
            Admission::Untracked => {}
        }
    }

    async fn release(&mut self, id: WindowId) {
        if let Some(tag) = self.registry.release(id) {
            tracing::debug!("window {} released from {}", id, tag);
            // A member vanished mid-show; refresh so the tag is not left
            // half visible.
            self.focus(&tag, true).await;
        }
    }

    /// Rebuild membership for every existing window from the live tree.
    /// Used at startup and after reload.
    pub async fn resync(&mut self, hide: bool) {
        let tree = match self.wm.get_tree().await {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!("resync skipped, tree query failed: {}", e);
                return;
            }
        };
        self.registry.clear();
        self.fullscreen_restore.clear();
        let windows: Vec<Window> = tree.leaves().into_iter().map(Window::from_node).collect();
        for window in windows {
            match self.classify(&window).await {
                Admission::Member(tag) => {
                    let cmd = self.admit_command(&tag, window.id, hide);
                    self.wm.run_command(&cmd).await;
                    self.registry.admit(&tag, window);
                }
                Admission::Transient => self.registry.push_transient(window),
                Admission::Untracked => {}
            }
        }
        tracing::info!(
            "resync complete: {} members, {} transients",
            self.registry.member_count(),
            self.registry.transient_count()
        );
    }

    // ---- show / hide / toggle --------------------------------------------

    pub async fn toggle(&mut self, tag: &str) {
        let Some(entry) = self.registry.entry(tag) else {
            tracing::warn!("toggle: unknown tag {:?}", tag);
            return;
        };
        if entry.members.is_empty() {
            if let Some(prog) = entry.config.prog.clone() {
                self.launch(&prog).await;
            }
            return;
        }
        if self.visible_count(tag).await > 0 {
            self.unfocus(tag).await;
            return;
        }
        // The scratchpad may be visible on another workspace: hide it when
        // its window holds focus even though nothing is visible here.
        if let Some(focused) = self.focused_window().await {
            if self.registry.is_member(tag, focused.id) {
                self.unfocus(tag).await;
                return;
            }
            self.force_unfullscreen(&focused).await;
        }
        self.focus(tag, true).await;
    }

    /// Bring the tag's members to the current workspace. A waiting transient
    /// takes priority: it is focused instead and consumed from the FIFO.
    pub async fn focus(&mut self, tag: &str, hide_others: bool) {
        if self.registry.has_transients() {
            if let Some(transient) = self.registry.pop_transient() {
                let exists = match self.wm.get_tree().await {
                    Ok(tree) => tree.find(transient.id).is_some(),
                    Err(_) => false,
                };
                if exists {
                    self.wm
                        .run_command(&format!("[con_id={}] focus", transient.id))
                        .await;
                } else {
                    // The transient vanished without a close event; the
                    // membership picture is stale, rebuild it.
                    self.resync(false).await;
                }
            }
            return;
        }

        let ids: Vec<WindowId> = match self.registry.entry(tag) {
            Some(entry) => entry.members.iter().map(|w| w.id).collect(),
            None => return,
        };
        for id in &ids {
            self.wm
                .run_command(&format!("[con_id={}] move container to workspace current", id))
                .await;
        }
        if hide_others {
            self.unfocus_all_but_current(tag).await;
        }
    }

    /// Hide every member of the tag, persisting geometry first when autosave
    /// is on, and restore any window that was force-unfullscreened.
    pub async fn unfocus(&mut self, tag: &str) {
        if self.autosave {
            self.geom_save(tag).await;
        }
        let ids: Vec<WindowId> = match self.registry.entry(tag) {
            Some(entry) => entry.members.iter().map(|w| w.id).collect(),
            None => return,
        };
        for id in ids {
            self.wm
                .run_command(&format!("[con_id={}] move scratchpad", id))
                .await;
        }
        self.restore_fullscreens().await;
    }

    /// Hide every other tag's visible members, leaving `tag` on the
    /// workspace.
    pub async fn unfocus_all_but_current(&mut self, tag: &str) {
        let visible = self.visible_windows().await;
        let to_hide: Vec<WindowId> = visible
            .iter()
            .filter(|w| matches!(self.registry.owner_of(w.id), Some(owner) if owner != tag))
            .map(|w| w.id)
            .collect();
        for id in to_hide {
            self.wm
                .run_command(&format!("[con_id={}] move scratchpad", id))
                .await;
        }
    }

    /// Alt-tab within the focused window's tag: the focused member moves to
    /// the back of the cycle order and focus advances to its successor.
    pub async fn next_window(&mut self) {
        let Some(focused) = self.focused_window().await else {
            return;
        };
        let Some(tag) = self.registry.owner_of(focused.id).map(str::to_string) else {
            tracing::debug!("next: focused window {} belongs to no tag", focused.id);
            return;
        };
        let Some(entry) = self.registry.entry_mut(&tag) else {
            return;
        };
        let len = entry.members.len();
        if len < 2 {
            return;
        }
        let Some(idx) = entry.members.iter().position(|w| w.id == focused.id) else {
            return;
        };
        let next_id = entry.members[(idx + 1) % len].id;
        let rotated = entry.members.remove(idx);
        entry.members.push(rotated);

        self.wm
            .run_command(&format!(
                "[con_id={}] move container to workspace current, focus",
                next_id
            ))
            .await;
        let others: Vec<WindowId> = self
            .registry
            .entry(&tag)
            .map(|e| {
                e.members
                    .iter()
                    .map(|w| w.id)
                    .filter(|id| *id != next_id)
                    .collect()
            })
            .unwrap_or_default();
        for id in others {
            self.wm
                .run_command(&format!("[con_id={}] move scratchpad", id))
                .await;
        }
    }

    /// Hide the tag owning the focused window; for untracked windows fall
    /// back to sending the focused window itself to the scratchpad layer.
    pub async fn hide_current(&mut self) {
        let Some(focused) = self.focused_window().await else {
            return;
        };
        match self.registry.owner_of(focused.id).map(str::to_string) {
            Some(tag) => self.unfocus(&tag).await,
            None => {
                self.wm
                    .run_command(&format!("[con_id={}] move scratchpad", focused.id))
                    .await
            }
        }
    }

    // ---- sub-programs ----------------------------------------------------

    pub async fn run_subtag(&mut self, tag: &str, app: &str) {
        let Some(entry) = self.registry.entry(tag) else {
            tracing::warn!("run: unknown tag {:?}", tag);
            return;
        };
        let Some(sub) = entry.config.subprograms.get(app).cloned() else {
            // No such sub-context configured; behave like a plain toggle.
            self.toggle(tag).await;
            return;
        };
        let has_match = entry.members.iter().any(|w| sub.includes.contains(&w.class));
        if has_match {
            self.focus_subtag(tag, &sub.includes).await;
        } else {
            self.launch(&sub.prog).await;
        }
    }

    async fn focus_subtag(&mut self, tag: &str, classes: &BTreeSet<String>) {
        if let Some(focused) = self.focused_window().await {
            self.force_unfullscreen(&focused).await;
            if classes.contains(&focused.class) {
                return;
            }
        }
        self.focus(tag, true).await;

        let visible = self.visible_windows().await;
        for window in &visible {
            if classes.contains(&window.class) && self.registry.is_member(tag, window.id) {
                self.wm
                    .run_command(&format!("[con_id={}] focus", window.id))
                    .await;
            }
        }

        // Cycle at most once through the membership looking for a matching
        // class; the explicit bound keeps classification drift from looping
        // forever.
        let bound = self.registry.entry(tag).map(|e| e.members.len()).unwrap_or(0);
        for _ in 0..bound {
            match self.focused_window().await {
                Some(f) if classes.contains(&f.class) => break,
                Some(_) => self.next_window().await,
                None => break,
            }
        }
    }

    // ---- dialogs ---------------------------------------------------------

    /// Surface every dialog-like window (and picker exception) on the
    /// current workspace, regardless of tag.
    pub async fn dialog_toggle(&mut self) {
        let Ok(tree) = self.wm.get_tree().await else {
            return;
        };
        let windows: Vec<Window> = tree.leaves().into_iter().map(Window::from_node).collect();
        for window in windows {
            let props = match window.xid {
                Some(xid) => self.wm.window_props(xid).await,
                None => None,
            };
            if classifier::needs_surfacing(&window, props.as_ref()) {
                self.wm
                    .run_command(&format!(
                        "[con_id={}] move container to workspace current, focus",
                        window.id
                    ))
                    .await;
            }
        }
    }

    // ---- geometry --------------------------------------------------------

    pub async fn geom_restore_current(&mut self) {
        if let Some(tag) = self.focused_tag().await {
            self.geom_restore(&tag).await;
        }
    }

    /// Re-mark every member and re-apply the tag's geometry.
    pub async fn geom_restore(&mut self, tag: &str) {
        let ids: Vec<WindowId> = match self.registry.entry(tag) {
            Some(entry) => entry.members.iter().map(|w| w.id).collect(),
            None => return,
        };
        for id in ids {
            let cmd = format!(
                "[con_id={}] {}, move scratchpad, {}",
                id,
                self.mark_str(tag),
                self.geometry.command(tag)
            );
            self.wm.run_command(&cmd).await;
        }
    }

    pub async fn geom_save_current(&mut self) {
        if let Some(tag) = self.focused_tag().await {
            self.geom_save(&tag).await;
        }
    }

    /// Snapshot the focused window's rectangle into the tag's configuration
    /// entry and the live cache. Only valid while the focused window belongs
    /// to the tag being saved.
    async fn geom_save(&mut self, tag: &str) {
        let Some(focused) = self.focused_window().await else {
            return;
        };
        if !self.registry.is_member(tag, focused.id) {
            return;
        }
        let geom = geometry::format_geom(focused.rect);
        tracing::debug!("saving geometry {} for tag {}", geom, tag);
        self.geometry.set(tag, geom.clone());
        self.config.set_geom(tag, geom);
        if let Some(entry) = self.registry.entry_mut(tag) {
            if let Some(member) = entry.members.iter_mut().find(|w| w.id == focused.id) {
                member.rect = focused.rect;
            }
        }
    }

    /// Like `geom_save_current`, but also persists the configuration file.
    pub async fn geom_dump_current(&mut self) -> Result<()> {
        let Some(tag) = self.focused_tag().await else {
            return Ok(());
        };
        self.geom_save(&tag).await;
        self.config.dump(&self.config_path)
    }

    pub async fn autosave_toggle(&mut self) -> bool {
        self.autosave = !self.autosave;
        tracing::info!("geometry autosave={}", self.autosave);
        self.wm
            .run_command(&format!(
                "exec notify-send oshiire 'geometry autosave={}'",
                self.autosave
            ))
            .await;
        self.autosave
    }

    /// Periodic saver body; a no-op while the autosave flag is off.
    pub async fn autosave_tick(&mut self) {
        if !self.autosave {
            return;
        }
        self.geom_save_current().await;
    }

    // ---- configuration ---------------------------------------------------

    /// Reload configuration and rebuild all state from the live tree.
    /// On a malformed file the previous state is kept and the error is
    /// returned to the control-channel caller.
    pub async fn reload(&mut self) -> Result<()> {
        let config = Config::load(&self.config_path)?;
        self.geometry = GeometryStore::from_config(&config);
        self.registry = Registry::new(config.tags.clone());
        self.config = config;
        self.autosave = false;
        self.fullscreen_restore.clear();
        self.resync(true).await;
        tracing::info!("config reloaded");
        Ok(())
    }

    // ---- queries ---------------------------------------------------------

    pub fn tag_infos(&self) -> Vec<TagInfo> {
        self.registry
            .tags()
            .map(|entry| TagInfo {
                name: entry.config.name.clone(),
                window_count: entry.members.len(),
                classes: entry.members.iter().map(|w| w.class.clone()).collect(),
                geom: Some(self.geometry.get(&entry.config.name).to_string()),
            })
            .collect()
    }

    pub fn state_info(&self) -> StateInfo {
        StateInfo {
            tag_count: self.registry.tags().count(),
            window_count: self.registry.member_count(),
            transient_count: self.registry.transient_count(),
            autosave: self.autosave,
        }
    }

    // ---- helpers ---------------------------------------------------------

    fn mark_str(&self, tag: &str) -> String {
        format!("mark {}-{}", tag, Uuid::new_v4().simple())
    }

    fn admit_command(&self, tag: &str, id: WindowId, hide: bool) -> String {
        let mut cmd = format!(
            "[con_id={}] {}, move scratchpad, {}",
            id,
            self.mark_str(tag),
            self.geometry.command(tag)
        );
        if !hide {
            cmd.push_str(", move container to workspace current");
        }
        cmd
    }

    async fn launch(&self, prog: &str) {
        match shellexpand::full(prog) {
            Ok(expanded) => self.wm.run_command(&format!("exec {}", expanded)).await,
            // A failed expansion means a broken command line; the user can
            // fix the config and retry, nothing to propagate.
            Err(e) => tracing::warn!("launch of {:?} skipped: {}", prog, e),
        }
    }

    async fn focused_window(&self) -> Option<Window> {
        let tree = self.wm.get_tree().await.ok()?;
        tree.find_focused()
            .filter(|node| node.window.is_some())
            .map(Window::from_node)
    }

    async fn focused_tag(&self) -> Option<String> {
        let focused = self.focused_window().await?;
        self.registry.owner_of(focused.id).map(str::to_string)
    }

    /// Windows of the focused workspace that are not property-hidden.
    /// Visibility is always derived fresh, never cached.
    async fn visible_windows(&self) -> Vec<Window> {
        let Ok(tree) = self.wm.get_tree().await else {
            return Vec::new();
        };
        let Some(workspace) = tree.focused_workspace() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for node in workspace.leaves() {
            let window = Window::from_node(node);
            let hidden = match window.xid {
                Some(xid) => self
                    .wm
                    .window_props(xid)
                    .await
                    .map(|p| p.hidden)
                    .unwrap_or(false),
                None => false,
            };
            if !hidden {
                out.push(window);
            }
        }
        out
    }

    async fn visible_count(&self, tag: &str) -> usize {
        self.visible_windows()
            .await
            .iter()
            .filter(|w| self.registry.is_member(tag, w.id))
            .count()
    }

    async fn force_unfullscreen(&mut self, window: &Window) {
        if window.fullscreen {
            self.wm
                .run_command(&format!("[con_id={}] fullscreen toggle", window.id))
                .await;
            self.fullscreen_restore.push(window.id);
        }
    }

    async fn restore_fullscreens(&mut self) {
        for id in std::mem::take(&mut self.fullscreen_restore) {
            self.wm
                .run_command(&format!("[con_id={}] fullscreen toggle", id))
                .await;
        }
    }
}
