use crate::core::config::TagConfig;
use crate::core::window::Window;
use crate::wm::WindowProps;

// Windows that report a dialog type but must be tagged like any other
// window: GTK bookmark popups and file choosers.
const PICKER_INSTANCES: &[&str] = &["Places"];
const PICKER_ROLES: &[&str] = &["GtkFileChooserDialog"];

/// First tag, in configuration order, whose matcher accepts the window.
/// Declaration order is the tie-break for overlapping matchers.
pub fn matching_tag<'a, I>(window: &Window, tags: I) -> Option<&'a TagConfig>
where
    I: IntoIterator<Item = &'a TagConfig>,
{
    tags.into_iter().find(|tag| {
        tag.class.contains(&window.class)
            || tag.instance.contains(&window.instance)
            || tag.role.contains(&window.role)
    })
}

pub fn is_picker_exception(window: &Window) -> bool {
    PICKER_INSTANCES.contains(&window.instance.as_str())
        || PICKER_ROLES.contains(&window.role.as_str())
}

/// Dialog predicate for admission: dialogs become transients instead of tag
/// members. A failed property probe (`props == None`) means the window was
/// gone before xprop ran; it classifies as non-dialog so a legitimate tag
/// member is never lost to a probe race.
pub fn is_dialog(window: &Window, props: Option<&WindowProps>) -> bool {
    if is_picker_exception(window) {
        return false;
    }
    match props {
        Some(p) => p.dialog || p.modal,
        None => false,
    }
}

/// Windows the `dialog` operation pulls onto the current workspace:
/// real dialogs plus the picker exceptions.
pub fn needs_surfacing(window: &Window, props: Option<&WindowProps>) -> bool {
    if is_picker_exception(window) {
        return true;
    }
    matches!(props, Some(p) if p.dialog || p.modal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wm::Rect;
    use std::collections::BTreeSet;

    fn window(class: &str, instance: &str, role: &str) -> Window {
        Window {
            id: 1,
            xid: Some(1),
            class: class.to_string(),
            instance: instance.to_string(),
            role: role.to_string(),
            rect: Rect::default(),
            fullscreen: false,
        }
    }

    fn tag(name: &str, classes: &[&str]) -> TagConfig {
        TagConfig {
            name: name.to_string(),
            class: classes.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_matching_tag_wins() {
        let tags = vec![
            tag("term", &["URxvt"]),
            tag("also-term", &["URxvt", "Alacritty"]),
        ];
        let found = matching_tag(&window("URxvt", "urxvt", ""), &tags).unwrap();
        assert_eq!(found.name, "term");

        let found = matching_tag(&window("Alacritty", "alacritty", ""), &tags).unwrap();
        assert_eq!(found.name, "also-term");
    }

    #[test]
    fn test_instance_and_role_matchers() {
        let mut by_instance = tag("files", &[]);
        by_instance.instance.insert("ranger".to_string());
        let mut by_role = tag("chat", &[]);
        by_role.role.insert("irc".to_string());
        let tags = vec![by_instance, by_role];

        assert_eq!(
            matching_tag(&window("URxvt", "ranger", ""), &tags).unwrap().name,
            "files"
        );
        assert_eq!(
            matching_tag(&window("URxvt", "weechat", "irc"), &tags).unwrap().name,
            "chat"
        );
        assert!(matching_tag(&window("URxvt", "urxvt", ""), &tags).is_none());
    }

    #[test]
    fn test_dialog_classification() {
        let props = WindowProps {
            dialog: true,
            modal: false,
            hidden: false,
        };
        assert!(is_dialog(&window("Popup", "popup", ""), Some(&props)));

        // Allow-list exception: same properties, instance "Places".
        assert!(!is_dialog(&window("Popup", "Places", ""), Some(&props)));
        assert!(!is_dialog(
            &window("Gtk", "gtk", "GtkFileChooserDialog"),
            Some(&props)
        ));
    }

    #[test]
    fn test_modal_state_counts_as_dialog() {
        let props = WindowProps {
            dialog: false,
            modal: true,
            hidden: false,
        };
        assert!(is_dialog(&window("App", "app", ""), Some(&props)));
    }

    #[test]
    fn test_probe_failure_fails_open() {
        assert!(!is_dialog(&window("App", "app", ""), None));
    }

    #[test]
    fn test_needs_surfacing() {
        let dialog = WindowProps {
            dialog: true,
            modal: false,
            hidden: false,
        };
        assert!(needs_surfacing(&window("Popup", "popup", ""), Some(&dialog)));
        assert!(needs_surfacing(&window("Popup", "Places", ""), None));
        assert!(!needs_surfacing(&window("App", "app", ""), None));
        assert!(!needs_surfacing(
            &window("App", "app", ""),
            Some(&WindowProps::default())
        ));
    }
}
