//! HTTP handlers for the chat page
//!
//! Three routes: the page itself, the form submission, and the proxied
//! banner asset. Each submission is handled synchronously end-to-end and
//! answered with a redirect back to the page, so every state transition is
//! followed by exactly one explicit re-render.

use crate::dispatch::ChatReply;
use crate::error::Result;
use crate::imaging;
use crate::session::Notice;
use crate::web::{render, AppState};

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use uuid::Uuid;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "vegapunk_session";

/// Validation warning for a submission with no text and no image
pub const EMPTY_SUBMISSION_WARNING: &str =
    "Please enter a message or upload an image before sending.";

/// Validation warning for an upload with an unsupported extension
pub const UNSUPPORTED_IMAGE_WARNING: &str =
    "Unsupported image type. Allowed: png, jpg, jpeg, gif, bmp, tiff.";

/// Annotation prepended to the user message when an image is attached
pub const IMAGE_UPLOAD_TAG: &str = "[Image Uploaded]";

/// An uploaded file from the form
struct Upload {
    filename: String,
    bytes: Vec<u8>,
}

/// Fields extracted from one form submission
struct Submission {
    message: String,
    upload: Option<Upload>,
}

/// `GET /` - render the page for this session
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session_id, is_new) = resolve_session(&headers);

    let show_banner = state.banner.load().await.is_some();
    let api_key_missing = !state.dispatcher.has_provider();

    let page = state.sessions.with_session(session_id, |session| {
        let notices = session.take_notices();
        let input_value = session.input_value_for_render();
        render::render_page(&render::PageView {
            title: &state.ui.title,
            subtitle: &state.ui.subtitle,
            background_image_url: &state.ui.background_image_url,
            show_banner,
            api_key_missing,
            notices: &notices,
            messages: session.conversation.messages(),
            input_value: &input_value,
        })
    });

    match page {
        Ok(html) => with_session_cookie(Html(html).into_response(), session_id, is_new),
        Err(e) => internal_error(e),
    }
}

/// `POST /chat` - handle one form submission, then redirect back to `/`
pub async fn submit_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    let (session_id, is_new) = resolve_session(&headers);

    let submission = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(e) => {
            tracing::warn!("Failed to read submission: {:#}", e);
            let outcome = state.sessions.with_session(session_id, |session| {
                session.push_notice(Notice::warning(format!("Could not read submission: {}", e)));
            });
            return match outcome {
                Ok(()) => redirect_home(session_id, is_new),
                Err(e) => internal_error(e),
            };
        }
    };

    let message = submission.message.trim().to_string();

    // Validation happens before any dispatch; an invalid submission leaves
    // the conversation untouched and keeps the draft in the input field.
    let rejection = if message.is_empty() && submission.upload.is_none() {
        Some(EMPTY_SUBMISSION_WARNING)
    } else if submission
        .upload
        .as_ref()
        .is_some_and(|upload| !imaging::extension_allowed(&upload.filename))
    {
        Some(UNSUPPORTED_IMAGE_WARNING)
    } else {
        None
    };

    if let Some(warning) = rejection {
        let outcome = state.sessions.with_session(session_id, |session| {
            session.keep_draft(message.clone());
            session.push_notice(Notice::warning(warning));
        });
        return match outcome {
            Ok(()) => redirect_home(session_id, is_new),
            Err(e) => internal_error(e),
        };
    }

    // Dispatch outside the session lock; the outbound call may take a while.
    let (user_content, reply) = match &submission.upload {
        Some(upload) => {
            let annotated = if message.is_empty() {
                IMAGE_UPLOAD_TAG.to_string()
            } else {
                format!("{} {}", IMAGE_UPLOAD_TAG, message)
            };
            let reply = state.dispatcher.respond_image(&upload.bytes, &message).await;
            (annotated, reply)
        }
        None => {
            let reply = state.dispatcher.respond_text(&message).await;
            (message.clone(), reply)
        }
    };

    let outcome = state.sessions.with_session(session_id, |session| {
        apply_reply(session, user_content, reply);
    });

    match outcome {
        Ok(()) => redirect_home(session_id, is_new),
        Err(e) => internal_error(e),
    }
}

/// `GET /assets/banner` - serve the cached remote banner image
pub async fn banner_asset(State(state): State<AppState>) -> Response {
    match state.banner.load().await {
        Some(banner) => (
            [(header::CONTENT_TYPE, banner.mime_type)],
            banner.bytes,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Append user message and reply to the conversation, in that order
fn apply_reply(session: &mut crate::session::Session, user_content: String, reply: ChatReply) {
    session.conversation.push_user(user_content);
    session.conversation.push_assistant(reply.text);
    if let Some(warning) = reply.warning {
        session.push_notice(Notice::warning(warning));
    }
    session.request_input_clear();
}

async fn read_submission(mut multipart: Multipart) -> Result<Submission> {
    let mut message = String::new();
    let mut upload = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "message" => message = field.text().await?,
            "image" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                // An untouched file control submits an empty part.
                if !filename.is_empty() && !bytes.is_empty() {
                    upload = Some(Upload {
                        filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(Submission { message, upload })
}

fn resolve_session(headers: &HeaderMap) -> (Uuid, bool) {
    match session_id_from_headers(headers) {
        Some(id) => (id, false),
        None => (Uuid::new_v4(), true),
    }
}

fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

fn with_session_cookie(mut response: Response, session_id: Uuid, is_new: bool) -> Response {
    if is_new {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, session_id
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

fn redirect_home(session_id: Uuid, is_new: bool) -> Response {
    with_session_cookie(Redirect::to("/").into_response(), session_id, is_new)
}

fn internal_error(e: anyhow::Error) -> Response {
    tracing::error!("Session store failure: {:#}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_session_id_parsed_from_cookie() {
        let id = Uuid::new_v4();
        let headers = headers_with_cookie(&format!("other=1; {}={}", SESSION_COOKIE, id));
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_missing_cookie_yields_new_session() {
        let (id, is_new) = resolve_session(&HeaderMap::new());
        assert!(is_new);
        assert_ne!(id, Uuid::nil());
    }

    #[test]
    fn test_garbage_cookie_yields_new_session() {
        let headers = headers_with_cookie(&format!("{}=not-a-uuid", SESSION_COOKIE));
        let (_, is_new) = resolve_session(&headers);
        assert!(is_new);
    }

    #[test]
    fn test_new_session_sets_cookie() {
        let id = Uuid::new_v4();
        let response = redirect_home(id, true);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(cookie.contains(&id.to_string()));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_existing_session_sets_no_cookie() {
        let response = redirect_home(Uuid::new_v4(), false);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn test_apply_reply_appends_in_order() {
        let mut session = crate::session::Session::new(Uuid::new_v4());
        apply_reply(
            &mut session,
            "question".to_string(),
            ChatReply {
                text: "answer".to_string(),
                warning: None,
            },
        );

        let messages = session.conversation.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "question");
        assert_eq!(messages[1].content, "answer");
        assert!(session.take_notices().is_empty());
    }

    #[test]
    fn test_apply_reply_carries_warning() {
        let mut session = crate::session::Session::new(Uuid::new_v4());
        apply_reply(
            &mut session,
            "question".to_string(),
            ChatReply {
                text: "apology".to_string(),
                warning: Some("upstream down".to_string()),
            },
        );

        let notices = session.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].text, "upstream down");
        assert_eq!(session.conversation.len(), 2);
    }
}
