//! Rule-based tokenizer, sentence splitter and entity finder for Italian.

use std::collections::HashSet;

use super::{is_stop_word, Doc, Entity, LinguisticAnalyzer, LinguisticError, Sentence, Token};
use crate::sanitize::{restore_apostrophes, ESCAPED_APOSTROPHE};

/// Abbreviations whose trailing period does not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "dott", "dr", "sig", "sigg", "prof", "ing", "avv", "ecc", "etc", "es", "pag", "cfr", "art",
    "geom", "rag",
];

/// Titles that mark the following capitalised run as a person.
const TITLES: &[&str] = &["dott", "dr", "sig", "prof", "ing", "avv", "geom", "rag"];

/// Heuristic analyzer that needs no model files.
///
/// Single spaces between tokens are not emitted as tokens; any other
/// whitespace run (newlines, indentation, double spaces) is a space token.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleAnalyzer;

impl RuleAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl LinguisticAnalyzer for RuleAnalyzer {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn analyze(&self, text: &str) -> Result<Doc, LinguisticError> {
        let tokens = tokenize(text);
        let sentences = split_sentences(&tokens);
        let entities = find_entities(text, &tokens, &sentences);
        Ok(Doc {
            tokens,
            sentences,
            entities,
        })
    }
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// Width in chars of the apostrophe starting at `chars[j]`, plain or escaped.
fn apostrophe_width(text: &str, chars: &[(usize, char)], j: usize) -> Option<usize> {
    let &(offset, c) = chars.get(j)?;
    if is_apostrophe(c) {
        Some(1)
    } else if text[offset..].starts_with(ESCAPED_APOSTROPHE) {
        Some(ESCAPED_APOSTROPHE.len())
    } else {
        None
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\u{2026}')
}

fn tokenize(text: &str) -> Vec<Token> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let next_is = |j: usize, pred: fn(char) -> bool| chars.get(j).map(|&(_, c)| pred(c)).unwrap_or(false);

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (start, c) = chars[i];
        let mut j = i + 1;

        if c.is_whitespace() {
            while next_is(j, char::is_whitespace) {
                j += 1;
            }
        } else if c.is_alphanumeric() {
            while j < chars.len() {
                let cj = chars[j].1;
                let apostrophe = apostrophe_width(text, &chars, j);
                if cj.is_alphanumeric() {
                    j += 1;
                } else if let Some(width) =
                    apostrophe.filter(|&width| next_is(j + width, char::is_alphanumeric))
                {
                    // Elision: "l'analisi" -> "l'" + "analisi"
                    j += width;
                    break;
                } else if cj == '-' && next_is(j + 1, char::is_alphanumeric) {
                    j += 1;
                } else if (cj == '.' || cj == ',')
                    && chars[j - 1].1.is_ascii_digit()
                    && next_is(j + 1, |n: char| n.is_ascii_digit())
                {
                    j += 1;
                } else {
                    break;
                }
            }
        } else if is_terminal(c) {
            while next_is(j, is_terminal) {
                j += 1;
            }
        } else if let Some(width) = apostrophe_width(text, &chars, i) {
            j = i + width;
        }

        let end = chars.get(j).map(|&(offset, _)| offset).unwrap_or(text.len());
        let piece = restore_apostrophes(&text[start..end]);
        i = j;

        if piece == " " {
            continue;
        }

        let is_space = c.is_whitespace();
        let is_punct = !is_space && !c.is_alphanumeric();
        tokens.push(Token {
            is_stop: !is_space && !is_punct && is_stop_word(&piece),
            text: piece.into_owned(),
            start,
            end,
            is_punct,
            is_space,
        });
    }

    tokens
}

fn is_abbreviation(token: &Token) -> bool {
    token.is_word() && ABBREVIATIONS.contains(&token.text.to_lowercase().as_str())
}

fn is_title(token: &Token) -> bool {
    token.is_word() && TITLES.contains(&token.text.to_lowercase().as_str())
}

fn closes_sentence(tokens: &[Token], i: usize) -> bool {
    let tok = &tokens[i];
    if tok.is_space {
        return tok.text.matches('\n').count() >= 2;
    }
    if !tok.is_punct || !tok.text.chars().all(is_terminal) {
        return false;
    }
    if tok.text == "." && i > 0 && is_abbreviation(&tokens[i - 1]) {
        // An abbreviation only ends a sentence when nothing follows it.
        return tokens[i + 1..].iter().all(|t| t.is_space);
    }
    true
}

fn make_sentence(tokens: &[Token], first: usize, end_token: usize) -> Sentence {
    Sentence {
        start_token: first,
        end_token,
        start: tokens[first].start,
        end: tokens[end_token - 1].end,
    }
}

fn split_sentences(tokens: &[Token]) -> Vec<Sentence> {
    let mut sentences: Vec<Sentence> = Vec::new();
    let mut open: Option<usize> = None;

    for (i, tok) in tokens.iter().enumerate() {
        if open.is_none() {
            if tok.is_space {
                // Whitespace after a sentence belongs to it.
                if let Some(last) = sentences.last_mut() {
                    last.end_token = i + 1;
                    last.end = tok.end;
                }
                continue;
            }
            open = Some(i);
        }

        if closes_sentence(tokens, i) {
            if let Some(first) = open.take() {
                sentences.push(make_sentence(tokens, first, i + 1));
            }
        }
    }

    if let Some(first) = open {
        sentences.push(make_sentence(tokens, first, tokens.len()));
    }

    sentences
}

fn is_capitalized(token: &Token) -> bool {
    token.is_word()
        && !is_title(token)
        && token
            .text
            .chars()
            .next()
            .map(char::is_uppercase)
            .unwrap_or(false)
}

fn find_entities(text: &str, tokens: &[Token], sentences: &[Sentence]) -> Vec<Entity> {
    let sentence_starts: HashSet<usize> = sentences.iter().map(|s| s.start_token).collect();
    let mut entities = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        if !is_capitalized(&tokens[i]) {
            i += 1;
            continue;
        }
        // A capital at sentence start is just orthography unless a
        // capitalised word follows it.
        if sentence_starts.contains(&i) && !tokens.get(i + 1).map(is_capitalized).unwrap_or(false) {
            i += 1;
            continue;
        }

        let first = i;
        while i < tokens.len() && is_capitalized(&tokens[i]) {
            i += 1;
        }

        let after_title =
            first >= 2 && tokens[first - 1].text == "." && is_title(&tokens[first - 2]);
        let (start, end) = (tokens[first].start, tokens[i - 1].end);
        entities.push(Entity {
            text: text[start..end].to_string(),
            label: if after_title { "PER" } else { "MISC" }.to_string(),
            start,
            end,
        });
    }

    entities
}
