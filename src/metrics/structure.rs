//! Structural pattern detection (lists, numbering, paragraphs, markdown).

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sanitize::restore_apostrophes;

lazy_static! {
    static ref BULLET_LINE: Regex = Regex::new(r"[\n\r][ \t]*[-*•][ \t]").unwrap();
    static ref NUMBERED_LINE: Regex = Regex::new(r"[\n\r][ \t]*\d+\.[ \t]").unwrap();
    static ref PARAGRAPH_BREAK: Regex = Regex::new(r"[\n\r][ \t]*[\n\r]").unwrap();
    static ref MARKDOWN_MARK: Regex = Regex::new(r"[_*#]").unwrap();
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    pub has_lists: bool,
    pub has_numbering: bool,
    pub has_paragraphs: bool,
    pub has_markdown_formatting: bool,
}

impl Structure {
    /// Number of structural signals present.
    pub fn signal_count(&self) -> usize {
        [
            self.has_lists,
            self.has_numbering,
            self.has_paragraphs,
            self.has_markdown_formatting,
        ]
        .iter()
        .filter(|&&flag| flag)
        .count()
    }
}

/// A line after a line break starting with `-`, `*` or `•` followed by a
/// space or tab. The first line of the text never counts.
pub fn has_bullet_list(text: &str) -> bool {
    BULLET_LINE.is_match(text)
}

/// A line after a line break starting with `<number>.` followed by a space
/// or tab.
pub fn has_numbered_list(text: &str) -> bool {
    NUMBERED_LINE.is_match(text)
}

/// At least two non-blank blocks separated by a blank line. `\r\n`, `\n`
/// and `\r` each count as one line break.
pub fn has_paragraphs(text: &str) -> bool {
    let text = text.replace("\r\n", "\n");
    PARAGRAPH_BREAK
        .split(&text)
        .filter(|block| !block.trim().is_empty())
        .count()
        > 1
}

/// Any `_`, `*` or `#` character.
pub fn has_markdown_formatting(text: &str) -> bool {
    MARKDOWN_MARK.is_match(text)
}

/// Run all structural detectors. Escaped apostrophes are read as `'` so
/// their `#` is not taken for markdown.
pub fn structure(text: &str) -> Structure {
    let restored = restore_apostrophes(text);
    let text = restored.as_ref();
    Structure {
        has_lists: has_bullet_list(text),
        has_numbering: has_numbered_list(text),
        has_paragraphs: has_paragraphs(text),
        has_markdown_formatting: has_markdown_formatting(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_sentence_has_no_structure() {
        let s = structure("Fai qualcosa con questo.");
        assert_eq!(s, Structure::default());
        assert_eq!(s.signal_count(), 0);
    }

    #[test]
    fn test_bullet_lists() {
        assert!(has_bullet_list("Requisiti:\n- veloce\n- sicuro"));
        assert!(has_bullet_list("Punti:\r\n  * primo punto"));
        // only lines after a line break count
        assert!(!has_bullet_list("- Scrivi una poesia."));
        assert!(has_bullet_list("Punti:\n\t• uno"));
        // a hyphen inside a line is not a list
        assert!(!has_bullet_list("un testo ben-fatto"));
        // bullet must be followed by whitespace
        assert!(!has_bullet_list("-nessuno spazio"));
    }

    #[test]
    fn test_numbered_lists() {
        assert!(has_numbered_list("Passi:\n1. apri\n2. chiudi"));
        assert!(has_numbered_list("Passi:\n  10.\tdecimo"));
        assert!(!has_numbered_list("1. apri"));
        assert!(!has_numbered_list("Versione 1.5 del testo"));
    }

    #[test]
    fn test_paragraphs() {
        assert!(has_paragraphs("Primo paragrafo.\n\nSecondo paragrafo."));
        assert!(has_paragraphs("Primo.\r\n\r\nSecondo."));
        assert!(has_paragraphs("Primo.\n  \nSecondo."));
        assert!(!has_paragraphs("Una riga.\nAltra riga."));
        // one Windows line break is not a blank line
        assert!(!has_paragraphs("Una riga.\r\nAltra riga."));
        assert!(!has_paragraphs("Una riga.\r\nAltra.\r\nTerza."));
        // a trailing blank line alone does not make two paragraphs
        assert!(!has_paragraphs("Solo uno.\n\n"));
    }

    #[test]
    fn test_markdown_formatting() {
        assert!(has_markdown_formatting("## Titolo"));
        assert!(has_markdown_formatting("testo in **grassetto**"));
        assert!(has_markdown_formatting("nome_variabile"));
        assert!(!has_markdown_formatting("testo semplice"));
        assert!(!structure("Calcola l&#x27;area.").has_markdown_formatting);
    }

    #[test]
    fn test_signal_count() {
        let s = structure("# Obiettivo\n\n- primo\n- secondo\n1. passo");
        assert!(s.has_lists && s.has_numbering && s.has_paragraphs && s.has_markdown_formatting);
        assert_eq!(s.signal_count(), 4);
    }
}
