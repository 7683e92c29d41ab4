//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Render plain text as HTML paragraphs.
///
/// Blank lines separate paragraphs, single newlines become `<br>`. The text
/// is escaped, so the result is safe to emit with `|safe`.
///
/// Usage in templates: `{{ post.content|paragraphs|safe }}`
#[askama::filter_fn]
pub fn paragraphs(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(to_paragraphs(&value.to_string()))
}

fn escape_html(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
}

fn to_paragraphs(text: &str) -> String {
    let normalized = text.replace("\r\n", "\n");
    let mut html = String::with_capacity(normalized.len() + 16);

    for block in normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|b| !b.is_empty())
    {
        html.push_str("<p>");
        for (i, line) in block.lines().enumerate() {
            if i > 0 {
                html.push_str("<br>");
            }
            escape_html(line.trim_end(), &mut html);
        }
        html.push_str("</p>\n");
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_paragraphs() {
        assert_eq!(
            to_paragraphs("Primeiro\nlinha 2\r\n\r\nSegundo <b>"),
            "<p>Primeiro<br>linha 2</p>\n<p>Segundo &lt;b&gt;</p>\n"
        );
        assert_eq!(to_paragraphs("  \n\n "), "");
    }
}
