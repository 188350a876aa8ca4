//! Plain-text normalization applied to extracted documents before segmentation.

/// Canonicalizes raw extracted text.
///
/// Every `\r` becomes `\n`, each run of horizontal whitespace collapses to a
/// single space, and runs of two or more consecutive newlines collapse to
/// exactly one blank line. The function is pure and idempotent.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    let mut newline_run = 0usize;

    for ch in raw.chars() {
        let ch = if ch == '\r' { '\n' } else { ch };
        if ch == '\n' {
            if pending_space {
                out.push(' ');
                pending_space = false;
                newline_run = 0;
            }
            newline_run += 1;
            if newline_run <= 2 {
                out.push('\n');
            }
        } else if ch.is_whitespace() {
            pending_space = true;
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            newline_run = 0;
            out.push(ch);
        }
    }
    if pending_space {
        out.push(' ');
    }
    out
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_carriage_returns() {
        assert_eq!(normalize("a\rb"), "a\nb");
        // a CRLF pair becomes two newlines, i.e. one blank line
        assert_eq!(normalize("a\r\nb"), "a\n\nb");
    }

    #[test]
    fn collapses_horizontal_whitespace() {
        assert_eq!(normalize("ARTÍCULO \t  5.   Multas"), "ARTÍCULO 5. Multas");
        assert_eq!(normalize("fin  \ninicio"), "fin \ninicio");
    }

    #[test]
    fn collapses_blank_line_runs() {
        assert_eq!(normalize("uno\n\n\n\n\ndos"), "uno\n\ndos");
        assert_eq!(normalize("uno\ndos"), "uno\ndos");
        assert_eq!(normalize("uno\n\ndos"), "uno\n\ndos");
    }

    #[test]
    fn is_idempotent() {
        let samples = [
            "",
            "   ",
            "\r\r\r\n",
            "ARTICULO 1.\t\tDefiniciones\r\n\r\n\r\nPara efectos\u{a0}\u{a0}de esta ley",
            "a \n \n \n b",
            "\n\n\n  texto \t\n",
            "línea\u{c}\u{c}con saltos de página\n\n\n\n",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn counts_words() {
        assert_eq!(word_count("  uno dos\n\ntres "), 3);
        assert_eq!(word_count(""), 0);
    }
}
