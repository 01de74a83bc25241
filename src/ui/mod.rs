//! Server-side page rendering.
//!
//! The whole page is produced by [`render_page`] from one immutable
//! [`PageSnapshot`]. Handlers never patch markup; they change state and the
//! page is rendered again.
//!
//! # Structure
//!
//! - [`chat`]: transcript, thinking indicator and input form
//! - [`components`]: theme toggle, drop zone, notice dialog, icons

pub mod chat;
pub mod components;

use serde::Serialize;

use crate::chat::ChatSnapshot;
use crate::prefs::ThemePreference;
use crate::upload::FileSelection;

pub use chat::LATEST_ANCHOR;

/// Seconds between reloads while a reply is outstanding.
const PENDING_REFRESH_SECS: u32 = 1;

/// Everything the page shows, captured at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot {
    pub chat: ChatSnapshot,
    pub theme: ThemePreference,
    pub file: FileSelection,
    /// One-shot blocking notice.
    pub notice: Option<String>,
}

/// Escape text for inclusion in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the full HTML document.
pub fn render_page(page: &PageSnapshot) -> String {
    let body_class = if page.theme.is_dark() { "dark-mode" } else { "" };

    // Without client script, a pending reply is picked up by reloading.
    let refresh = if page.chat.pending {
        format!(
            r#"<meta http-equiv="refresh" content="{PENDING_REFRESH_SECS}; url=/#{LATEST_ANCHOR}">"#
        )
    } else {
        String::new()
    };

    let notice = page
        .notice
        .as_deref()
        .map(components::notice_dialog)
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Chat with your PDF">
    {refresh}
    <title>DocuMind</title>
    <style>{STYLES}</style>
</head>
<body class="{body_class}">
    <div class="app-shell">
        <aside class="sidebar">
            <h1 class="brand">DocuMind</h1>
            {drop_zone}
            {theme_toggle}
        </aside>
        <main class="chat-shell">
            {chat_container}
            {input_area}
        </main>
    </div>
    {notice}
</body>
</html>"#,
        drop_zone = components::drop_zone(&page.file),
        theme_toggle = components::theme_toggle(page.theme),
        chat_container = chat::chat_container(&page.chat),
        input_area = chat::input_area(),
    )
}

const STYLES: &str = r"
:root { --bg-color: #f7f7f8; --panel-color: #ffffff; --text-color: #1f2328; --muted-color: #6b7280; --border-color: #d0d7de; --accent-color: #10a37f; }
body.dark-mode { --bg-color: #202123; --panel-color: #343541; --text-color: #ececf1; --muted-color: #9ca3af; --border-color: #4d4d4f; }
* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, sans-serif; background: var(--bg-color); color: var(--text-color); }
.app-shell { display: flex; height: 100vh; }
.sidebar { width: 280px; padding: 1.5rem; display: flex; flex-direction: column; gap: 1rem; border-right: 1px solid var(--border-color); background: var(--panel-color); }
.brand { font-size: 1.25rem; margin: 0; }
.drop-zone { display: flex; flex-direction: column; align-items: center; gap: .5rem; padding: 1.5rem; border: 2px dashed var(--border-color); border-radius: 12px; cursor: pointer; text-align: center; background: var(--bg-color); }
.drop-zone.selected { border-color: var(--accent-color); }
.icon { width: 1.25rem; height: 1.25rem; vertical-align: middle; }
.accent { color: var(--accent-color); }
.chat-shell { flex: 1; display: flex; flex-direction: column; }
.chat-container { flex: 1; overflow-y: auto; padding: 1.5rem; display: flex; flex-direction: column; gap: 1rem; }
.message { display: flex; gap: .75rem; align-items: flex-start; max-width: 48rem; }
.user-message { align-self: flex-end; flex-direction: row-reverse; }
.message .content { padding: .75rem 1rem; border-radius: 12px; background: var(--panel-color); border: 1px solid var(--border-color); white-space: pre-wrap; }
.user-message .content { background: var(--accent-color); color: #fff; border: none; }
.thinking .dot { display: inline-block; width: .4rem; height: .4rem; margin-right: .2rem; border-radius: 50%; background: var(--muted-color); }
.input-area { display: flex; gap: .5rem; padding: 1rem 1.5rem; border-top: 1px solid var(--border-color); }
.input-area input { flex: 1; padding: .75rem 1rem; border-radius: 12px; border: 1px solid var(--border-color); background: var(--panel-color); color: var(--text-color); }
.btn { border: none; border-radius: 10px; padding: .6rem 1rem; cursor: pointer; font: inherit; }
.btn-primary { background: var(--accent-color); color: #fff; }
.btn-secondary { background: var(--bg-color); color: var(--text-color); border: 1px solid var(--border-color); width: 100%; }
.btn-ghost { background: transparent; color: var(--text-color); }
.notice { border: 1px solid var(--border-color); border-radius: 12px; background: var(--panel-color); color: var(--text-color); }
";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Message;

    fn page(pending: bool, theme: ThemePreference, notice: Option<&str>) -> PageSnapshot {
        PageSnapshot {
            chat: ChatSnapshot {
                messages: vec![Message::user("Hello")],
                pending,
                outstanding: usize::from(pending),
                scroll_anchor: Some(0),
            },
            theme,
            file: FileSelection::Unselected,
            notice: notice.map(str::to_string),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_pending_page_refreshes_to_latest() {
        let html = render_page(&page(true, ThemePreference::Light, None));
        assert!(html.contains(r#"http-equiv="refresh""#));
        assert!(html.contains("thinking-indicator"));

        let idle = render_page(&page(false, ThemePreference::Light, None));
        assert!(!idle.contains(r#"http-equiv="refresh""#));
    }

    #[test]
    fn test_dark_theme_sets_body_class() {
        let html = render_page(&page(false, ThemePreference::Dark, None));
        assert!(html.contains(r#"<body class="dark-mode">"#));
        assert!(html.contains("Light Mode"));
    }

    #[test]
    fn test_notice_renders_as_open_dialog() {
        let html = render_page(&page(
            false,
            ThemePreference::Light,
            Some("Please upload a valid PDF file."),
        ));
        assert!(html.contains("<dialog"));
        assert!(html.contains("Please upload a valid PDF file."));
    }
}
