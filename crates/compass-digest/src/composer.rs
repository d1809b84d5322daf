//! Digest rendering.
//!
//! [`compose`] is the disclosure boundary: a field reaches the message only if
//! its identifier is in the approved list, whatever the summary contains.

use std::fmt::Write;

use serde::Serialize;

use compass_shared::constants::APP_NAME;
use compass_shared::SharedField;

use crate::summary::Summary;

const RECOMMENDED_ACTIONS: &[&str] = &[
    "Maintain consistent sleep routine",
    "Light afternoon walk improves energy",
];

/// Rendered digest content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageBody {
    pub html: String,
}

pub fn compose(summary: &Summary, approved: &[SharedField]) -> MessageBody {
    let mut html = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(html, "<h3>{APP_NAME} Weekly Digest</h3>");
    let _ = writeln!(
        html,
        "<p>Period: {} &rarr; {}</p>",
        summary.period.from.format("%Y-%m-%d"),
        summary.period.to.format("%Y-%m-%d"),
    );

    if approved.contains(&SharedField::MoodTrend) {
        let mood = summary
            .avg_mood
            .map(|m| format!("{m:.2}"))
            .unwrap_or_else(|| "N/A".to_string());
        let _ = writeln!(html, "<p><strong>Average Mood:</strong> {mood}</p>");
    }

    if approved.contains(&SharedField::Notes) {
        if let Some(note) = summary.latest_note() {
            let _ = writeln!(
                html,
                "<p><strong>Recent Note:</strong> &quot;{}&quot;</p>",
                escape_html(note)
            );
        }
    }

    html.push_str("<hr />\n<p><strong>Recommended Actions:</strong></p>\n<ul>\n");
    for action in RECOMMENDED_ACTIONS {
        let _ = writeln!(html, "  <li>{action}</li>");
    }
    html.push_str("</ul>\n");

    MessageBody { html }
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::summary::Period;

    fn summary(avg_mood: Option<f64>, notes: &[&str]) -> Summary {
        Summary {
            period: Period {
                from: Utc.with_ymd_and_hms(2026, 10, 12, 8, 0, 0).unwrap(),
                to: Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap(),
            },
            avg_mood,
            recent_notes: notes.iter().map(|n| n.to_string()).collect(),
            predictive_snapshot: Some(serde_json::json!({ "fatigue": "high" })),
            logs_count: 3,
        }
    }

    #[test]
    fn renders_all_approved_fields() {
        let body = compose(
            &summary(Some(4.0), &["slept well"]),
            &[SharedField::MoodTrend, SharedField::Notes],
        );
        assert!(body.html.contains("Period: 2026-10-12 &rarr; 2026-10-19"));
        assert!(body.html.contains("<strong>Average Mood:</strong> 4.00"));
        assert!(body.html.contains("&quot;slept well&quot;"));
        assert!(body.html.contains("Recommended Actions"));
    }

    #[test]
    fn omits_mood_line_without_mood_trend() {
        let body = compose(&summary(Some(4.0), &["slept well"]), &[SharedField::Notes]);
        assert!(!body.html.contains("Average Mood"));
        assert!(body.html.contains("Recent Note"));
    }

    #[test]
    fn omits_note_line_without_notes() {
        let body = compose(&summary(Some(2.5), &["private"]), &[SharedField::MoodTrend]);
        assert!(!body.html.contains("Recent Note"));
        assert!(!body.html.contains("private"));
    }

    #[test]
    fn nothing_approved_keeps_only_static_content() {
        let body = compose(&summary(Some(2.5), &["private"]), &[]);
        assert!(!body.html.contains("Average Mood"));
        assert!(!body.html.contains("private"));
        assert!(!body.html.contains("fatigue"));
        assert!(body.html.contains("Maintain consistent sleep routine"));
    }

    #[test]
    fn unknown_approved_fields_disclose_nothing_extra() {
        let body = compose(
            &summary(None, &[]),
            &[SharedField::Other("predictive_snapshot".into())],
        );
        assert!(!body.html.contains("fatigue"));
    }

    #[test]
    fn missing_mood_shows_marker() {
        let body = compose(&summary(None, &[]), &[SharedField::MoodTrend, SharedField::Notes]);
        assert!(body.html.contains("<strong>Average Mood:</strong> N/A"));
        assert!(!body.html.contains("Recent Note"));
    }

    #[test]
    fn shows_most_recent_note_escaped() {
        let body = compose(
            &summary(None, &["older", "<b>newest</b>"]),
            &[SharedField::Notes],
        );
        assert!(body.html.contains("&lt;b&gt;newest&lt;/b&gt;"));
        assert!(!body.html.contains("older"));
    }

    #[test]
    fn composition_is_deterministic() {
        let s = summary(Some(3.25), &["a"]);
        let fields = [SharedField::MoodTrend, SharedField::Notes];
        assert_eq!(compose(&s, &fields), compose(&s, &fields));
    }
}
