//! Chat panel markup.

use crate::chat::{ChatSnapshot, Message, Role};

use super::components::icon;
use super::escape_html;

/// Anchor id of the entry the view scrolls to.
pub const LATEST_ANCHOR: &str = "latest";

/// A single transcript bubble.
pub fn message_bubble(message: &Message, anchor: bool) -> String {
    let (class, avatar) = match message.role {
        Role::User => ("user-message", "user"),
        Role::Assistant => ("ai-message", "robot"),
    };
    let id = if anchor {
        format!(r#" id="{LATEST_ANCHOR}""#)
    } else {
        String::new()
    };

    format!(
        r#"<div class="message {class}"{id} data-role="{role}">
            <div class="avatar">{avatar}</div>
            <div class="content">{text}</div>
        </div>"#,
        role = message.role.as_str(),
        avatar = icon(avatar, ""),
        text = escape_html(&message.text),
    )
}

/// "Thinking" indicator shown while a reply is outstanding.
pub fn thinking_indicator() -> String {
    format!(
        r#"<div id="thinking-indicator" class="message ai-message thinking" aria-live="polite">
            <div class="avatar">{}</div>
            <div class="content"><span class="dot"></span><span class="dot"></span><span class="dot"></span> Thinking</div>
        </div>"#,
        icon("robot", "")
    )
}

/// Transcript followed by the indicator, which always renders last.
pub fn chat_container(chat: &ChatSnapshot) -> String {
    let mut html = String::from(
        r#"<div id="chat-container" class="chat-container" aria-label="Chat messages">"#,
    );

    for (index, message) in chat.messages.iter().enumerate() {
        html.push_str(&message_bubble(message, chat.scroll_anchor == Some(index)));
    }

    if chat.pending {
        html.push_str(&thinking_indicator());
    }

    html.push_str("</div>");
    html
}

/// Chat input. Rendered empty, which clears it after every submission.
pub fn input_area() -> String {
    format!(
        r#"<form id="chat-form" class="input-area" method="post" action="/chat">
            <input id="user-input" name="message" type="text" placeholder="Ask something about your PDF..." autocomplete="off" autofocus>
            <button type="submit" class="btn btn-primary send-btn" aria-label="Send">{}</button>
        </form>"#,
        icon("send", "")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(messages: Vec<Message>, pending: bool) -> ChatSnapshot {
        let scroll_anchor = messages.len().checked_sub(1);
        ChatSnapshot {
            outstanding: usize::from(pending),
            messages,
            pending,
            scroll_anchor,
        }
    }

    #[test]
    fn test_indicator_renders_after_messages() {
        let html = chat_container(&snapshot(
            vec![Message::user("Hello"), Message::assistant("Hi")],
            true,
        ));

        let last_message = html.rfind("data-role=").unwrap();
        let indicator = html.find("thinking-indicator").unwrap();
        assert!(indicator > last_message);
    }

    #[test]
    fn test_indicator_hidden_when_idle() {
        let html = chat_container(&snapshot(vec![Message::user("Hello")], false));
        assert!(!html.contains("thinking-indicator"));
    }

    #[test]
    fn test_only_latest_entry_is_anchored() {
        let html = chat_container(&snapshot(
            vec![Message::user("one"), Message::assistant("two")],
            false,
        ));
        assert_eq!(html.matches(r#"id="latest""#).count(), 1);
        let anchor = html.find(r#"id="latest""#).unwrap();
        assert!(anchor > html.find(">one<").unwrap());
    }

    #[test]
    fn test_message_text_is_escaped() {
        let html = message_bubble(&Message::user("<script>alert(1)</script>"), false);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("user-message"));
    }
}
