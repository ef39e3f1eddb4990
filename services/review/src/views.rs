//! HTML rendering for the review page

use std::fmt::Write;

use crate::models::{ReviewData, channel::ContentType};
use crate::review::{ReviewAction, ReviewState, Selection};
use crate::sessions::{NoticeLevel, SessionView};

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; background-color: #f0f0f0; color: #333; margin: 0; padding: 20px; }
    .full { display: flex; justify-content: center; align-items: center; height: 80vh; font-size: 20px; }
    .notice { max-width: 800px; margin: 0 auto 16px; padding: 10px 16px; border-radius: 5px; }
    .notice.info { background-color: #dff0d8; color: #2e6b30; }
    .notice.error { background-color: #f8d7da; color: #842029; }
    .grid { display: flex; flex-wrap: wrap; justify-content: center; gap: 20px; }
    .tile { width: 400px; margin-bottom: 20px; text-align: center; }
    .tile button { padding: 0; border: 4px solid transparent; background: none; cursor: pointer; width: 100%; }
    .tile button.selected { border-color: green; }
    .tile button:disabled { cursor: not-allowed; }
    .tile img, .tile video { width: 100%; height: auto; display: block; }
    .badge { display: inline-block; margin-left: 6px; padding: 0 8px; border-radius: 10px; background-color: green; color: white; }
    .actions { display: flex; justify-content: center; gap: 20px; margin-top: 20px; }
    .actions button { padding: 10px 20px; font-size: 16px; color: white; border: none; border-radius: 5px; cursor: pointer; }
    .actions button:disabled { opacity: 0.6; cursor: not-allowed; }
    .submit { background-color: #4CAF50; }
    .reject { background-color: #f44336; }
"#;

/// Escape text for use in HTML content and attribute values
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Base path of the session's action routes
fn session_path(view: &SessionView) -> String {
    format!(
        "/{}/sessions/{}",
        urlencoding::encode(&view.process_id),
        view.session_id
    )
}

fn layout(title: &str, refresh_seconds: Option<u32>, body: &str) -> String {
    let refresh = refresh_seconds
        .map(|seconds| format!(r#"<meta http-equiv="refresh" content="{}">"#, seconds))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    {refresh}
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>"#,
        title = escape(title),
    )
}

fn notices(view: &SessionView) -> String {
    view.notices
        .iter()
        .map(|notice| {
            let class = match notice.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Error => "error",
            };
            format!(
                r#"<div class="notice {}" role="status">{}</div>"#,
                class,
                escape(&notice.message)
            )
        })
        .collect()
}

fn full_screen(view: &SessionView, message: &str) -> String {
    format!(
        r#"{}<div class="full">{}</div>"#,
        notices(view),
        escape(message)
    )
}

fn channel_info(data: &ReviewData) -> String {
    let channel = &data.channel;
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<h1>Process Viewer</h1>
<p>Channel ID: {}</p>
<h2>Channel Information</h2>
<p>Author: {}</p>
<p>Channel Name: {}</p>
<p>Video Length: {} seconds</p>
<p>Max File Size: {}</p>
<p>FPS: {}</p>
<p>Prompt: {}</p>"#,
        escape(&data.channel_id),
        escape(&channel.author),
        escape(&channel.channel_name),
        channel.video_lenght_in_seconds,
        channel.max_file_size,
        channel.fps,
        escape(&channel.stability_prompt),
    );
    html
}

fn file_grid(
    base: &str,
    data: &ReviewData,
    selection: &Selection,
    in_flight: Option<ReviewAction>,
) -> String {
    let content_type = data.channel.content_type();
    let heading = match content_type {
        ContentType::Image => "Images",
        ContentType::Video => "Videos",
    };
    let disabled = if in_flight.is_some() { " disabled" } else { "" };

    let mut html = format!(
        "<h2>{}</h2>\n<p>{} / {} selected</p>\n<div class=\"grid\">\n",
        heading,
        selection.len(),
        selection.limit()
    );

    for (index, file) in data.channel.list_of_files.iter().enumerate() {
        let position = selection.position(index);
        let class = if position.is_some() { "selected" } else { "" };
        let badge = position
            .map(|position| format!(r#"<span class="badge">{}</span>"#, position + 1))
            .unwrap_or_default();
        let media = match content_type {
            ContentType::Image => format!(
                r#"<img src="{}" alt="Frame {}">"#,
                escape(&file.s3_url),
                escape(&file.file_id)
            ),
            ContentType::Video => format!(
                r#"<video src="{}" muted loop autoplay playsinline preload="metadata"></video>"#,
                escape(&file.s3_url)
            ),
        };

        let _ = writeln!(
            html,
            r#"<form class="tile" method="post" action="{base}/toggle/{index}">
    <button type="submit" class="{class}"{disabled}>{media}</button>
    <p>{name}{badge}</p>
</form>"#,
            name = escape(&file.name),
        );
    }
    html.push_str("</div>\n");

    let submit_label = match in_flight {
        Some(ReviewAction::Submit) => ReviewAction::Submit.in_flight_label(),
        _ => "Submit Selection",
    };
    let reject_label = match in_flight {
        Some(ReviewAction::Reject) => ReviewAction::Reject.in_flight_label(),
        _ => "Reject",
    };
    let submit_disabled = if in_flight.is_some() || selection.is_empty() {
        " disabled"
    } else {
        ""
    };

    let _ = write!(
        html,
        r#"<div class="actions">
    <form method="post" action="{base}/submit"><button type="submit" class="submit"{submit_disabled}>{submit_label}</button></form>
    <form method="post" action="{base}/reject"><button type="submit" class="reject"{disabled}>{reject_label}</button></form>
</div>"#
    );
    html
}

/// Render the review page for a session
pub fn review_page(view: &SessionView) -> String {
    let base = session_path(view);

    match &view.state {
        ReviewState::Loading => layout("Loading", Some(1), &full_screen(view, "Loading...")),
        ReviewState::Failed { message } => layout(
            "Error",
            None,
            &full_screen(view, &format!("Error: {}", message)),
        ),
        ReviewState::Empty { reason } => {
            layout("Nothing to review", None, &full_screen(view, &reason.message()))
        }
        ReviewState::Ready { data, selection } => {
            let body = format!(
                "{}{}{}",
                notices(view),
                channel_info(data),
                file_grid(&base, data, selection, None)
            );
            layout("Process Viewer", None, &body)
        }
        ReviewState::Submitting {
            data,
            selection,
            action,
        } => {
            let body = format!(
                "{}{}{}",
                notices(view),
                channel_info(data),
                file_grid(&base, data, selection, Some(*action))
            );
            layout("Process Viewer", Some(2), &body)
        }
        ReviewState::Done { status, .. } => layout(
            "Decision recorded",
            None,
            &full_screen(view, &format!("Decision recorded: process {}.", status)),
        ),
    }
}
