//! Note export
//!
//! Produces file payloads from a note's title and content. Export is a
//! pure derivation: no core state is touched. Encrypted notes are
//! rejected — their content is ciphertext, not rich text.
//!
//! The PDF path emits a print-styled standalone HTML document; actual
//! rasterization belongs to the embedder's print pipeline.

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::richtext;
use crate::store::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    PlainText,
    Html,
    Pdf,
}

/// A ready-to-write file payload.
#[derive(Debug, Clone)]
pub struct ExportPayload {
    pub filename: String,
    pub mime_type: &'static str,
    pub body: String,
}

/// Derive an export payload from a note.
pub fn export_note(note: &Note, format: ExportFormat) -> Result<ExportPayload> {
    if note.is_encrypted {
        return Err(AppError::NoteLocked(note.id.to_string()));
    }

    let slug = filename_slug(&note.title);
    let stamp = Utc::now().format("%Y-%m-%d");

    let payload = match format {
        ExportFormat::Markdown => ExportPayload {
            filename: format!("{}-{}.md", slug, stamp),
            mime_type: "text/markdown",
            body: format!("# {}\n\n{}\n", note.title, to_markdown(&note.content)),
        },
        ExportFormat::PlainText => ExportPayload {
            filename: format!("{}-{}.txt", slug, stamp),
            mime_type: "text/plain",
            body: format!("{}\n\n{}\n", note.title, richtext::strip_tags(&note.content)),
        },
        ExportFormat::Html => ExportPayload {
            filename: format!("{}-{}.html", slug, stamp),
            mime_type: "text/html",
            body: html_document(note, false),
        },
        ExportFormat::Pdf => ExportPayload {
            filename: format!("{}-{}.html", slug, stamp),
            mime_type: "text/html",
            body: html_document(note, true),
        },
    };

    tracing::debug!("Exported note {} as {:?}", note.id, format);
    Ok(payload)
}

/// Reduce a title to a safe file name stem.
fn filename_slug(title: &str) -> String {
    let slug: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    let collapsed = slug
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if collapsed.is_empty() {
        "note".to_string()
    } else {
        collapsed
    }
}

/// Wrap the note content in a standalone HTML document.
fn html_document(note: &Note, for_print: bool) -> String {
    let print_style = if for_print {
        "@page { margin: 2cm; } body { font-size: 12pt; }"
    } else {
        ""
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <style>body {{ font-family: sans-serif; max-width: 42em; margin: 2em auto; }} {print}</style>\n\
         </head>\n<body>\n<h1>{title}</h1>\n{content}\n</body>\n</html>\n",
        title = richtext::escape_html(&note.title),
        print = print_style,
        content = note.content,
    )
}

/// Convert the supported rich-text subset to Markdown.
///
/// Same manual scanner approach as the plaintext extractor; unknown
/// tags are dropped, their text kept.
fn to_markdown(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];

        let end = match rest.find('>') {
            Some(e) => e,
            None => {
                rest = "";
                break;
            }
        };
        let tag = rest[..end].trim();
        rest = &rest[end + 1..];

        let closing = tag.starts_with('/');
        let name = tag
            .trim_start_matches('/')
            .trim_end_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();

        match name.as_str() {
            "b" | "strong" => out.push_str("**"),
            "i" | "em" => out.push('*'),
            "code" => out.push('`'),
            "br" => out.push('\n'),
            "p" | "div" | "blockquote" if closing => out.push_str("\n\n"),
            "blockquote" if !closing => out.push_str("> "),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if closing {
                    out.push_str("\n\n");
                } else {
                    let level = name[1..].parse::<usize>().unwrap_or(1);
                    out.push_str(&"#".repeat(level));
                    out.push(' ');
                }
            }
            "li" if !closing => out.push_str("- "),
            "li" if closing => out.push('\n'),
            "ul" | "ol" if closing => out.push('\n'),
            _ => {}
        }
    }
    out.push_str(rest);

    // Collapse runs of blank lines left by adjacent block closers
    let mut collapsed = String::with_capacity(out.len());
    let mut newlines = 0;
    for c in richtext::decode_entities(&out).chars() {
        if c == '\n' {
            newlines += 1;
            if newlines <= 2 {
                collapsed.push(c);
            }
        } else {
            newlines = 0;
            collapsed.push(c);
        }
    }
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_with(title: &str, content: &str) -> Note {
        let mut note = Note::new();
        note.title = title.to_string();
        note.content = content.to_string();
        note
    }

    #[test]
    fn test_markdown_export() {
        let note = note_with(
            "Trip plan",
            "<h2>Day one</h2><p>Visit the <b>old town</b> and <i>harbour</i>.</p>\
             <ul><li>pack</li><li>book tickets</li></ul>",
        );

        let payload = export_note(&note, ExportFormat::Markdown).unwrap();
        assert_eq!(payload.mime_type, "text/markdown");
        assert!(payload.filename.starts_with("trip-plan-"));
        assert!(payload.filename.ends_with(".md"));

        assert!(payload.body.starts_with("# Trip plan\n"));
        assert!(payload.body.contains("## Day one"));
        assert!(payload.body.contains("**old town**"));
        assert!(payload.body.contains("*harbour*"));
        assert!(payload.body.contains("- pack\n- book tickets"));
    }

    #[test]
    fn test_plaintext_export() {
        let note = note_with("Title", "<p>one</p><p>two &amp; three</p>");
        let payload = export_note(&note, ExportFormat::PlainText).unwrap();

        assert_eq!(payload.mime_type, "text/plain");
        assert!(payload.body.contains("one\ntwo & three"));
    }

    #[test]
    fn test_html_export_is_standalone_document() {
        let note = note_with("A <weird> title", "<p>body</p>");
        let payload = export_note(&note, ExportFormat::Html).unwrap();

        assert!(payload.body.starts_with("<!DOCTYPE html>"));
        assert!(payload.body.contains("&lt;weird&gt;"));
        assert!(payload.body.contains("<p>body</p>"));
        assert!(!payload.body.contains("@page"));
    }

    #[test]
    fn test_pdf_export_carries_print_styles() {
        let note = note_with("Print me", "<p>body</p>");
        let payload = export_note(&note, ExportFormat::Pdf).unwrap();

        assert!(payload.body.contains("@page"));
    }

    #[test]
    fn test_encrypted_note_rejected() {
        let mut note = note_with("Locked", "Y2lwaGVydGV4dA==");
        note.is_encrypted = true;

        for format in [
            ExportFormat::Markdown,
            ExportFormat::PlainText,
            ExportFormat::Html,
            ExportFormat::Pdf,
        ] {
            let result = export_note(&note, format);
            assert!(matches!(result, Err(AppError::NoteLocked(_))));
        }
    }

    #[test]
    fn test_filename_slug() {
        assert_eq!(filename_slug("Hello, World!"), "hello-world");
        assert_eq!(filename_slug("   "), "note");
        assert_eq!(filename_slug("déjà vu"), "déjà-vu");
    }
}
