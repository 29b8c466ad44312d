use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

// xprop normally answers in single-digit milliseconds; a window that is
// already gone makes it error out, which the caller treats as "no props".
const PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// EWMH properties relevant to dialog and visibility classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowProps {
    pub dialog: bool,
    pub modal: bool,
    pub hidden: bool,
}

/// Query the X server for a window's properties. Returns `None` when the
/// window no longer exists, xprop is missing, or the probe times out.
pub async fn probe(xid: u32) -> Option<WindowProps> {
    let output = timeout(
        PROBE_TIMEOUT,
        Command::new("xprop").arg("-id").arg(xid.to_string()).output(),
    )
    .await
    .ok()?
    .ok()?;

    if !output.status.success() {
        return None;
    }

    Some(parse(&String::from_utf8_lossy(&output.stdout)))
}

fn parse(text: &str) -> WindowProps {
    WindowProps {
        dialog: text.contains("_NET_WM_WINDOW_TYPE_DIALOG"),
        modal: text.contains("_NET_WM_STATE_MODAL"),
        hidden: text.contains("_NET_WM_STATE_HIDDEN"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dialog_props() {
        let text = "\
_NET_WM_WINDOW_TYPE(ATOM) = _NET_WM_WINDOW_TYPE_DIALOG
_NET_WM_STATE(ATOM) = _NET_WM_STATE_MODAL
WM_CLASS(STRING) = \"popup\", \"Popup\"";
        let props = parse(text);
        assert!(props.dialog);
        assert!(props.modal);
        assert!(!props.hidden);
    }

    #[test]
    fn test_parse_hidden_window() {
        let text = "_NET_WM_STATE(ATOM) = _NET_WM_STATE_HIDDEN\n";
        let props = parse(text);
        assert!(props.hidden);
        assert!(!props.dialog);
    }

    #[test]
    fn test_parse_plain_window() {
        let props = parse("WM_CLASS(STRING) = \"urxvt\", \"URxvt\"\n");
        assert_eq!(props, WindowProps::default());
    }
}
