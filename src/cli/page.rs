//! HTML rendering for the web UI.

use crate::agent::RunOutcome;
use crate::conversation::Role;
use crate::render::strip_reasoning;

const STYLE: &str = r#"
body { font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif; margin: 0; background: #0e1117; color: #fafafa; }
.layout { display: flex; min-height: 100vh; }
aside { width: 280px; padding: 2em 1.5em; background: #262730; }
main { flex: 1; max-width: 760px; margin: 0 auto; padding: 2em; }
label { display: block; margin: 1em 0 .3em; font-size: .9rem; }
input, textarea { width: 100%; box-sizing: border-box; padding: .6em; border-radius: 8px; border: 1px solid #444; background: #1e1e1e; color: #fafafa; }
button { margin-top: 1em; padding: .6em 1.4em; border-radius: 8px; border: 1px solid #ff4b4b; background: transparent; color: #fafafa; cursor: pointer; }
.block { background-color: #1e1e1e; padding: 1.2em; border-radius: 12px; margin-bottom: 15px; color: #e0e0e0; font-size: 1.05rem; white-space: pre-wrap; }
.role { font-size: .75rem; text-transform: uppercase; color: #999; margin-bottom: .5em; }
.notice { padding: 1em; border-radius: 8px; margin: 1em 0; }
.warning { background: #3d3a1a; color: #ffe08a; }
.error { background: #3e1f1f; color: #ff9c9c; }
.success { background: #1b3a27; color: #8fe3a8; }
pre { background: #1e1e1e; padding: 1em; border-radius: 8px; overflow-x: auto; white-space: pre-wrap; }
"#;

/// Values echoed back into the form. Keys are never echoed.
#[derive(Debug, Default)]
pub struct FormState {
    pub query: String,
}

/// Render the full page, with the outcome of a submission if there is one.
pub fn render_page(form: &FormState, outcome: Option<&RunOutcome>) -> String {
    let mut body = String::new();

    if let Some(outcome) = outcome {
        body.push_str(&render_outcome(outcome));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Deep Research AI Agent</title>
<style>{style}</style>
</head>
<body>
<form method="post" action="/research" class="layout">
<aside>
<h2>Configuration</h2>
<label for="groq_api_key">GROQ API Key</label>
<input type="password" id="groq_api_key" name="groq_api_key" autocomplete="off">
<label for="tavily_api_key">Tavily API Key</label>
<input type="password" id="tavily_api_key" name="tavily_api_key" autocomplete="off">
</aside>
<main>
<h1>Deep Research AI Agent</h1>
<label for="query">Enter your search query:</label>
<textarea id="query" name="query" rows="8">{query}</textarea>
<button type="submit">Search</button>
{body}
</main>
</form>
</body>
</html>"#,
        style = STYLE,
        query = escape_html(&form.query),
        body = body,
    )
}

fn render_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Invalid { warning } => {
            format!(r#"<div class="notice warning">{}</div>"#, escape_html(&warning.message))
        }
        RunOutcome::Failed { error } => {
            format!(r#"<div class="notice error">{}</div>"#, escape_html(error))
        }
        RunOutcome::Completed { transcript } => {
            let mut html = String::from(r#"<div class="notice success">Research Complete</div>"#);
            html.push_str("\n<h2>Final Answer</h2>\n");

            for message in &transcript.messages {
                html.push_str(&format!(
                    "<div class=\"block\"><div class=\"role\">{}</div>{}</div>\n",
                    role_label(message.role),
                    escape_html(&strip_reasoning(&message.content))
                ));
            }

            html.push_str("<details>\n<summary>Show Raw Tool Outputs</summary>\n");
            for (i, message) in transcript.messages.iter().enumerate() {
                html.push_str(&format!(
                    "<p><strong>Message {}:</strong></p>\n<pre><code>{}</code></pre>\n",
                    i + 1,
                    escape_html(&message.pretty_repr())
                ));
            }
            html.push_str("</details>\n");
            html
        }
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "Query",
        Role::Assistant => "Assistant",
        Role::ToolResult => "Tool output",
    }
}

/// Escape text for use in HTML element content and attribute values.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Transcript, ValidationWarning, MISSING_INPUT_WARNING};
    use crate::conversation::{Conversation, Message};

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#39;y&#39;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_empty_form_has_inputs_and_no_notice() {
        let html = render_page(&FormState::default(), None);
        assert!(html.contains(r#"name="groq_api_key""#));
        assert!(html.contains(r#"name="tavily_api_key""#));
        assert!(html.contains(r#"name="query""#));
        assert!(!html.contains("class=\"notice"));
    }

    #[test]
    fn test_warning_is_rendered_once() {
        let outcome = RunOutcome::Invalid {
            warning: ValidationWarning {
                message: MISSING_INPUT_WARNING.to_string(),
                missing: vec!["query"],
            },
        };
        let html = render_page(&FormState::default(), Some(&outcome));
        assert_eq!(html.matches("notice warning").count(), 1);
    }

    #[test]
    fn test_query_is_escaped_in_textarea() {
        let form = FormState {
            query: "</textarea><b>".to_string(),
        };
        let html = render_page(&form, None);
        assert!(html.contains("&lt;/textarea&gt;&lt;b&gt;"));
    }

    #[test]
    fn test_completed_run_renders_stripped_blocks_and_raw_view() {
        let mut messages = Conversation::seeded("Tell me about spacex");
        messages.push(Message::assistant("<think>plan</think>SpaceX & rockets"));

        let outcome = RunOutcome::Completed {
            transcript: Transcript {
                run_id: uuid::Uuid::new_v4(),
                query: "Tell me about spacex".to_string(),
                messages,
                model_turns: 2,
                tool_rounds: 0,
                step_cap_reached: false,
                started_at: chrono::Utc::now(),
                finished_at: chrono::Utc::now(),
            },
        };
        let html = render_page(&FormState::default(), Some(&outcome));

        assert!(html.contains("Research Complete"));
        assert_eq!(html.matches("class=\"block\"").count(), 2);
        assert!(html.contains("</div>SpaceX &amp; rockets</div>"));
        assert!(html.contains("<summary>Show Raw Tool Outputs</summary>"));
        assert!(html.contains("Message 2:"));
        // The raw view keeps the reasoning.
        assert!(html.contains("&lt;think&gt;plan&lt;/think&gt;"));
    }
}
