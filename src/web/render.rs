//! HTML rendering for the chat page
//!
//! One explicit render function builds the whole page from a view snapshot:
//! styling, notices, conversation history, and the input form. All
//! user-controlled content is escaped before it reaches the markup.

use crate::imaging::ALLOWED_EXTENSIONS;
use crate::session::{ChatMessage, Notice, NoticeLevel, Role};
use std::fmt::Write as _;

/// Message shown when the API credential is missing
pub const MISSING_KEY_ERROR: &str =
    "API key not found. Please set your API key in the .env file.";

/// Snapshot of everything the page needs for one render
pub struct PageView<'a> {
    /// Page title
    pub title: &'a str,
    /// Page subtitle
    pub subtitle: &'a str,
    /// Background image URL for the stylesheet
    pub background_image_url: &'a str,
    /// Whether the banner image is available at /assets/banner
    pub show_banner: bool,
    /// Whether to render the missing-credential error
    pub api_key_missing: bool,
    /// One-shot notices drained from the session
    pub notices: &'a [Notice],
    /// Conversation history in render order
    pub messages: &'a [ChatMessage],
    /// Value to place into the text input
    pub input_value: &'a str,
}

/// Escape text for inclusion in HTML element content or attribute values
///
/// # Examples
///
/// ```
/// use vegapunk::web::render::escape_html;
///
/// assert_eq!(escape_html("<b>&\"'"), "&lt;b&gt;&amp;&quot;&#39;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn message_class(role: Role) -> &'static str {
    match role {
        Role::User => "user-message",
        Role::Assistant => "assistant-message",
    }
}

fn notice_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Warning => "notice-warning",
        NoticeLevel::Error => "notice-error",
    }
}

/// Render the full chat page
pub fn render_page(view: &PageView<'_>) -> String {
    let mut page = String::with_capacity(4096);

    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");

    let _ = write!(
        page,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{
    background-image: url("{background}");
    background-size: cover;
    background-attachment: fixed;
    font-family: sans-serif;
    margin: 0;
}}
.main {{
    background: rgba(0, 0, 0, 0.7);
    padding: 20px;
    border-radius: 15px;
    color: white;
    max-width: 900px;
    margin: 40px auto;
}}
.banner img {{
    width: 100%;
    border-radius: 10px;
}}
.chat-message {{
    padding: 10px;
    border-radius: 10px;
    margin-bottom: 10px;
    word-wrap: break-word;
    max-width: 70%;
}}
.user-message {{
    background-color: rgba(255, 204, 102, 0.8);
    color: #1a1a1a;
    text-align: right;
    margin-left: auto;
}}
.assistant-message {{
    background-color: rgba(102, 255, 255, 0.8);
    color: #1a1a1a;
    text-align: left;
    margin-right: auto;
}}
.notice {{
    padding: 10px;
    border-radius: 8px;
    margin-bottom: 10px;
}}
.notice-warning {{
    background-color: rgba(255, 244, 180, 0.9);
    color: #5c4a00;
}}
.notice-error {{
    background-color: rgba(255, 150, 150, 0.9);
    color: #5c0000;
}}
form input[type="text"] {{
    width: 60%;
    padding: 8px;
}}
</style>
</head>
<body>
<div class="main">
<h1>{title}</h1>
<h3>{subtitle}</h3>
"#,
        title = escape_html(view.title),
        background = escape_html(view.background_image_url),
        subtitle = escape_html(view.subtitle),
    );

    if view.show_banner {
        page.push_str("<div class=\"banner\"><img src=\"/assets/banner\" alt=\"banner\"></div>\n");
    }

    if view.api_key_missing {
        let _ = write!(
            page,
            "<div class=\"notice notice-error\">{}</div>\n",
            escape_html(MISSING_KEY_ERROR)
        );
    }

    for notice in view.notices {
        let _ = write!(
            page,
            "<div class=\"notice {}\">{}</div>\n",
            notice_class(notice.level),
            escape_html(&notice.text)
        );
    }

    for message in view.messages {
        let _ = write!(
            page,
            "<div class=\"chat-message {}\">{}</div>\n",
            message_class(message.role),
            escape_html(&message.content)
        );
    }

    let _ = write!(
        page,
        r#"<form method="post" action="/chat" enctype="multipart/form-data">
<label for="message">Ask Vegapunk anything:</label><br>
<input type="text" id="message" name="message" value="{input}" autocomplete="off">
<input type="file" name="image" accept="{accept}">
<button type="submit">Send</button>
</form>
</div>
</body>
</html>
"#,
        input = escape_html(view.input_value),
        accept = accept,
    );

    page
}
