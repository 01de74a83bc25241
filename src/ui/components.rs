//! Page widgets: theme toggle, drop zone, notice dialog and icons.
//!
//! Icons are rendered inline as SVG so the page needs no external assets.

use crate::prefs::ThemePreference;
use crate::upload::{FileSelection, PDF_MIME};

use super::escape_html;

/// Common icon size class.
const ICON_CLASS: &str = "icon";

/// Inline SVG icon by name. Unknown names render nothing.
pub fn icon(name: &str, class: &str) -> String {
    let body = match name {
        "sun" => {
            r#"<circle cx="12" cy="12" r="4"/><path d="M12 2v2M12 20v2M4.93 4.93l1.41 1.41M17.66 17.66l1.41 1.41M2 12h2M20 12h2M6.34 17.66l-1.41 1.41M19.07 4.93l-1.41 1.41"/>"#
        }
        "moon" => r#"<path d="M12 3a6 6 0 0 0 9 9 9 9 0 1 1-9-9Z"/>"#,
        "user" => {
            r#"<path d="M19 21v-2a4 4 0 0 0-4-4H9a4 4 0 0 0-4 4v2"/><circle cx="12" cy="7" r="4"/>"#
        }
        "robot" => {
            r#"<rect x="3" y="11" width="18" height="10" rx="2"/><circle cx="12" cy="5" r="2"/><path d="M12 7v4M8 16h.01M16 16h.01"/>"#
        }
        "file-upload" => {
            r#"<path d="M14.5 2H6a2 2 0 0 0-2 2v16a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V7.5L14.5 2z"/><path d="M12 12v6M9 15l3-3 3 3"/>"#
        }
        "file-check" => {
            r#"<path d="M14.5 2H6a2 2 0 0 0-2 2v16a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V7.5L14.5 2z"/><path d="m9 15 2 2 4-4"/>"#
        }
        "send" => {
            r#"<line x1="22" y1="2" x2="11" y2="13"/><polygon points="22 2 15 22 11 13 2 9 22 2"/>"#
        }
        _ => return String::new(),
    };

    format!(
        r#"<svg class="{ICON_CLASS} {class}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" aria-hidden="true">{body}</svg>"#
    )
}

/// Header button that flips the theme. It offers the mode not in use.
pub fn theme_toggle(theme: ThemePreference) -> String {
    let (label, icon_name) = theme.toggle_label();
    format!(
        r#"<form method="post" action="/theme" class="theme-form">
            <button id="theme-toggle" type="submit" class="btn btn-ghost">{icon} {label}</button>
        </form>"#,
        icon = icon(icon_name, ""),
    )
}

/// File picker. Shows the selected file name once a PDF was accepted.
pub fn drop_zone(selection: &FileSelection) -> String {
    let (state_class, icon_html, caption) = match selection {
        FileSelection::Unselected => (
            "",
            icon("file-upload", ""),
            "Drag &amp; drop a PDF here or click to browse".to_string(),
        ),
        FileSelection::Selected { name, .. } => (
            " selected",
            icon("file-check", "accent"),
            format!("Selected: {}", escape_html(name)),
        ),
    };

    format!(
        r#"<form id="upload-form" method="post" action="/upload" enctype="multipart/form-data">
            <label id="drop-zone" class="drop-zone{state_class}">
                {icon_html}
                <span>{caption}</span>
                <input id="file-input" type="file" name="file" accept="{PDF_MIME}" hidden>
            </label>
            <button type="submit" class="btn btn-secondary">Use this PDF</button>
        </form>"#
    )
}

/// Blocking notice. Dismissing it reloads the page without the notice.
pub fn notice_dialog(notice: &str) -> String {
    format!(
        r#"<dialog id="notice" class="notice" open>
            <p>{}</p>
            <form method="get" action="/"><button type="submit" class="btn btn-primary">OK</button></form>
        </dialog>"#,
        escape_html(notice)
    )
}
