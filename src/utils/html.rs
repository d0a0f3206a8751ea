use html2text::from_read_with_decorator;
use html2text::render::TrivialDecorator;

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Turn a feed title into a single plain-text line.
///
/// Outlets routinely ship entity-encoded titles (`&#8220;`, `&amp;`) and the
/// occasional inline tag; `html2text` decodes both without adding markup of
/// its own. Line breaks and runs of whitespace collapse to a single space.
pub fn clean_title(raw: &str) -> String {
    if !raw.contains(['&', '<']) {
        return collapse_whitespace(raw);
    }

    let mut bytes = raw.as_bytes();
    match from_read_with_decorator(&mut bytes, 10_000, TrivialDecorator::new()) {
        Ok(text) => collapse_whitespace(&text),
        Err(e) => {
            tracing::debug!("Falling back to raw title, html2text failed: {}", e);
            collapse_whitespace(raw)
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_REGEX.replace_all(s.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_titles_pass_through() {
        assert_eq!(clean_title("Sánchez convoca elecciones"), "Sánchez convoca elecciones");
    }

    #[test]
    fn decodes_entities() {
        let out = clean_title("Tom &amp; Jerry &#8220;vuelven&#8221;");
        assert!(out.contains("Tom & Jerry"));
        assert!(out.contains("\u{201c}vuelven\u{201d}"));
    }

    #[test]
    fn inline_markup_is_dropped() {
        assert_eq!(
            clean_title("<b>Última hora:</b> el <strong>Gobierno</strong> aprueba <em>los presupuestos</em>"),
            "Última hora: el Gobierno aprueba los presupuestos"
        );
    }

    #[test]
    fn links_leave_no_footnotes() {
        assert_eq!(
            clean_title(r#"Lee <a href="https://example.com">la entrevista</a>"#),
            "Lee la entrevista"
        );
    }

    #[test]
    fn collapses_line_breaks() {
        assert_eq!(clean_title("  Uno\n\n  dos\tTres  "), "Uno dos Tres");
    }
}
