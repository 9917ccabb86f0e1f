//! Italian stop words.

use phf::phf_set;

static STOP_WORDS: phf::Set<&'static str> = phf_set! {
    "a", "ad", "agli", "ai", "al", "alla", "alle", "allo", "anche", "ancora",
    "avere", "aveva", "avevano", "c'", "che", "chi", "ci", "come", "con",
    "contro", "cui", "da", "dagli", "dai", "dal", "dalla", "dalle", "dallo",
    "degli", "dei", "del", "dell'", "della", "delle", "dello", "di", "dove",
    "e", "è", "ed", "essere", "era", "erano", "fa", "fra", "gli", "ha",
    "hanno", "ho", "i", "il", "in", "io", "l'", "la", "le", "lei", "li", "lo",
    "loro", "lui", "ma", "me", "mi", "mia", "mie", "miei", "mio", "ne", "negli",
    "nei", "nel", "nell'", "nella", "nelle", "nello", "noi", "non", "nostra",
    "nostre", "nostri", "nostro", "o", "per", "perché", "più", "poi", "quale",
    "quando", "quanto", "quella", "quelle", "quelli", "quello", "questa",
    "queste", "questi", "questo", "se", "sei", "senza", "si", "sia", "siamo",
    "siete", "sono", "sta", "su", "sua", "sue", "sugli", "sui", "sul", "sulla",
    "sulle", "sullo", "suo", "suoi", "ti", "tra", "tu", "tua", "tue", "tuo",
    "tuoi", "tutti", "tutto", "un", "un'", "una", "uno", "vi", "voi", "vostra",
    "vostre", "vostri", "vostro",
};

/// Returns true if `word` (any case) is an Italian stop word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_words_case_insensitive() {
        assert!(is_stop_word("questo"));
        assert!(is_stop_word("Della"));
        assert!(is_stop_word("l'"));
        assert!(!is_stop_word("prompt"));
        assert!(!is_stop_word("analizza"));
    }
}
