//! Rich-text plaintext extraction
//!
//! Notes store an HTML-ish rich-text document. Search, AI operations,
//! word counts, and derived titles all need the plain text, extracted
//! from the markup string directly — no rendering environment involved.
//!
//! Manual parsing is used instead of regex to avoid adding the `regex`
//! crate dependency; the markup subset here is small enough for a
//! character scanner.

/// Strip markup tags from rich-text content, yielding plain text.
///
/// Block-level closers and `<br>` become newlines so paragraph
/// structure survives; inline tags vanish. Common entities are decoded.
pub fn strip_tags(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '<' {
            out.push(c);
            continue;
        }

        // Consume through the matching '>'; unterminated tags swallow
        // the rest of the input, which is the safe reading of broken markup.
        let rest = &content[i + 1..];
        let end = match rest.find('>') {
            Some(e) => e,
            None => break,
        };
        let tag = rest[..end].trim();

        if is_line_break_tag(tag) && !out.ends_with('\n') {
            out.push('\n');
        }

        // Skip scanner past the tag body
        while let Some(&(_, tc)) = chars.peek() {
            chars.next();
            if tc == '>' {
                break;
            }
        }
    }

    decode_entities(out.trim())
}

/// Tags whose boundary implies a line break in the extracted text.
fn is_line_break_tag(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .trim_end_matches('/')
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    matches!(
        name.as_str(),
        "br" | "p" | "div" | "li" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
            | "blockquote" | "pre" | "tr"
    ) && (tag.starts_with('/') || name == "br")
}

/// Decode the handful of entities rich-text editors actually emit.
pub(crate) fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let decoded = [
            ("&amp;", "&"),
            ("&lt;", "<"),
            ("&gt;", ">"),
            ("&quot;", "\""),
            ("&#39;", "'"),
            ("&apos;", "'"),
            ("&nbsp;", " "),
        ]
        .iter()
        .find(|(entity, _)| rest.starts_with(entity));

        match decoded {
            Some((entity, replacement)) => {
                out.push_str(replacement);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Escape text for embedding into markup (export paths).
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Derive a note title from its content: the first non-empty extracted
/// line, truncated to `max_len` characters with an ellipsis.
pub fn derive_title(content: &str, max_len: usize) -> Option<String> {
    let text = strip_tags(content);
    let line = text.lines().map(str::trim).find(|l| !l.is_empty())?;

    if line.chars().count() <= max_len {
        return Some(line.to_string());
    }
    let truncated: String = line.chars().take(max_len).collect();
    Some(format!("{}…", truncated.trim_end()))
}

/// Count whitespace-separated words in the extracted plain text.
pub fn word_count(content: &str) -> usize {
    strip_tags(content).split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_inline_tags() {
        assert_eq!(strip_tags("<b>bold</b> and <i>italic</i>"), "bold and italic");
    }

    #[test]
    fn test_block_tags_become_newlines() {
        let html = "<p>first</p><p>second</p><ul><li>one</li><li>two</li></ul>";
        assert_eq!(strip_tags(html), "first\nsecond\none\ntwo");
    }

    #[test]
    fn test_br_breaks_line() {
        assert_eq!(strip_tags("a<br>b<br/>c"), "a\nb\nc");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(
            strip_tags("<p>a &amp; b &lt;tag&gt; &quot;q&quot;&nbsp;&#39;s&#39;</p>"),
            "a & b <tag> \"q\" 's'"
        );
    }

    #[test]
    fn test_unknown_entity_passes_through() {
        assert_eq!(strip_tags("fish &chips;"), "fish &chips;");
    }

    #[test]
    fn test_attributes_ignored() {
        assert_eq!(
            strip_tags(r#"<p class="x"><span style="color:red">hi</span></p>"#),
            "hi"
        );
    }

    #[test]
    fn test_unterminated_tag() {
        assert_eq!(strip_tags("ok <b unclosed"), "ok");
    }

    #[test]
    fn test_plain_text_passthrough() {
        assert_eq!(strip_tags("no markup here"), "no markup here");
    }

    #[test]
    fn test_derive_title_first_line() {
        let html = "<h1>Meeting notes</h1><p>agenda items</p>";
        assert_eq!(derive_title(html, 40), Some("Meeting notes".to_string()));
    }

    #[test]
    fn test_derive_title_truncates() {
        let html = format!("<p>{}</p>", "word ".repeat(20));
        let title = derive_title(&html, 10).unwrap();
        assert!(title.ends_with('…'));
        assert!(title.chars().count() <= 11);
    }

    #[test]
    fn test_derive_title_empty_content() {
        assert_eq!(derive_title("<p><br></p>", 40), None);
        assert_eq!(derive_title("", 40), None);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("<p>three little words</p>"), 3);
        assert_eq!(word_count("<p><br></p>"), 0);
    }

    #[test]
    fn test_escape_html_round() {
        assert_eq!(escape_html("a < b & c"), "a &lt; b &amp; c");
    }
}
