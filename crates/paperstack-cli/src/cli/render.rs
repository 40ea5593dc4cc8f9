use chrono::{DateTime, Utc};
use console::Style;
use paperstack::commands::{CmdMessage, DocumentSummary, MessageLevel, PageSummary, PageText};
use paperstack::PaperError;
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;

const TIME_WIDTH: usize = 14;
const TITLE_WIDTH: usize = 60;

pub(super) fn render_messages(messages: &[CmdMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        let style = match message.level {
            MessageLevel::Info => Style::new().dim(),
            MessageLevel::Success => Style::new().green(),
            MessageLevel::Warning => Style::new().yellow(),
            MessageLevel::Error => Style::new().red(),
        };
        let _ = writeln!(out, "{}", style.apply_to(&message.content));
    }
    out
}

pub(super) fn render_documents(documents: &[DocumentSummary]) -> String {
    if documents.is_empty() {
        return "No documents found.\n".to_string();
    }

    let id_width = documents.iter().map(|d| d.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for doc in documents {
        let pages = if doc.pages == 1 {
            "1 page".to_string()
        } else {
            format!("{} pages", doc.pages)
        };
        let _ = writeln!(
            out,
            "{:<id_width$}  {:>9}  {}",
            Style::new().yellow().apply_to(&doc.id),
            pages,
            format_time_ago(doc.last_modified),
            id_width = id_width,
        );
    }
    out
}

pub(super) fn render_pages(pages: &[PageSummary]) -> String {
    if pages.is_empty() {
        return "No pages found.\n".to_string();
    }

    let mut out = String::new();
    for page in pages {
        let marker = if page.complete { " " } else { "!" };
        let _ = writeln!(
            out,
            "{:>4}. {} {:<title_width$}  {}",
            Style::new().yellow().apply_to(page.number),
            marker,
            truncate(&page.title, TITLE_WIDTH),
            format_time_ago(page.last_modified),
            title_width = TITLE_WIDTH,
        );
    }
    out
}

pub(super) fn render_texts(texts: &[PageText]) -> String {
    let mut out = String::new();
    for (i, text) in texts.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if texts.len() > 1 {
            let _ = writeln!(
                out,
                "{}",
                Style::new()
                    .bold()
                    .apply_to(format!("{} p{}", text.document, text.number))
            );
        }
        let _ = writeln!(out, "{}", text.text);
    }
    out
}

pub(super) fn render_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("{}\n", p.display()))
        .collect()
}

pub(super) fn render_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}

/// Extra guidance for errors the library refuses to work around.
pub fn error_hint(error: &PaperError) -> Option<&'static str> {
    if !error.is_fatal() {
        return None;
    }
    Some(match error {
        PaperError::NoOcrEngine => "Install tesseract (or set tesseract_path), or scan with --no-ocr.",
        _ => "The operation stopped partway and nothing was repaired. Check the document directory before retrying.",
    })
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut result: String = s.chars().take(max.saturating_sub(1)).collect();
    result.push('…');
    result
}

fn format_time_ago(timestamp: Option<DateTime<Utc>>) -> String {
    let Some(timestamp) = timestamp else {
        return format!("{:>width$}", "-", width = TIME_WIDTH);
    };
    let duration = Utc::now().signed_duration_since(timestamp);

    let formatter = timeago::Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());

    format!("{:>width$}", time_str, width = TIME_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn plain(s: String) -> String {
        console::strip_ansi_codes(&s).into_owned()
    }

    #[test]
    fn test_documents_listing() {
        let docs = vec![
            DocumentSummary {
                id: "20240101_1200_00".to_string(),
                path: PathBuf::from("/p/20240101_1200_00"),
                pages: 1,
                last_modified: Some(Utc::now() - Duration::hours(2)),
            },
            DocumentSummary {
                id: "taxes".to_string(),
                path: PathBuf::from("/p/taxes"),
                pages: 12,
                last_modified: None,
            },
        ];

        let out = plain(render_documents(&docs));
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("1 page"));
        assert!(lines[0].contains("2 hours ago"));
        assert!(lines[1].starts_with("taxes"));
        assert!(lines[1].contains("12 pages"));
        assert!(lines[1].trim_end().ends_with('-'));
    }

    #[test]
    fn test_empty_listings() {
        assert_eq!(render_documents(&[]), "No documents found.\n");
        assert_eq!(render_pages(&[]), "No pages found.\n");
    }

    #[test]
    fn test_pages_mark_incomplete_and_truncate_titles() {
        let pages = vec![PageSummary {
            document: "doc".to_string(),
            number: 3,
            complete: false,
            last_modified: None,
            title: "x".repeat(100),
        }];

        let out = plain(render_pages(&pages));

        assert!(out.starts_with("   3. !"));
        assert!(out.contains('…'));
        assert!(!out.contains(&"x".repeat(TITLE_WIDTH)));
    }

    #[test]
    fn test_texts_get_headers_only_when_several() {
        let one = vec![PageText {
            document: "doc".to_string(),
            number: 1,
            text: "hello".to_string(),
        }];
        assert_eq!(plain(render_texts(&one)), "hello\n");

        let mut two = one.clone();
        two.push(PageText {
            document: "doc".to_string(),
            number: 2,
            text: "world".to_string(),
        });
        assert_eq!(plain(render_texts(&two)), "doc p1\nhello\n\ndoc p2\nworld\n");
    }

    #[test]
    fn test_messages_keep_content() {
        let out = plain(render_messages(&[
            CmdMessage::success("Deleted doc p1"),
            CmdMessage::warning("Feeder appears to be empty"),
        ]));
        assert_eq!(out, "Deleted doc p1\nFeeder appears to be empty\n");
    }

    #[test]
    fn test_hints_only_for_fatal_errors() {
        assert!(error_hint(&PaperError::NoOcrEngine).unwrap().contains("--no-ocr"));
        let collision = error_hint(&PaperError::KeyCollision(PathBuf::from("/p/d/paper.2.jpg")));
        assert!(collision.unwrap().contains("nothing was repaired"));
        assert_eq!(error_hint(&PaperError::DocumentNotFound("d".to_string())), None);
    }

    #[test]
    fn test_json_output() {
        let text = PageText {
            document: "doc".to_string(),
            number: 1,
            text: "hi".to_string(),
        };
        let out = render_json(&[text]).unwrap();
        assert!(out.contains("\"number\": 1"));
    }
}
