//! Japanese text to capitalized Hepburn romaji

pub mod analyzer;
pub mod kana;

use std::future::Future;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::lazy::{InitError, LazyResource};
use analyzer::Analyzer;

static JAPANESE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x{3000}-\x{303f}\x{3040}-\x{309f}\x{30a0}-\x{30ff}\x{ff00}-\x{ff9f}\x{4e00}-\x{9faf}\x{3400}-\x{4dbf}]")
        .expect("valid regex")
});
static WORD_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w").expect("valid regex"));

/// True when the text has kana, kanji, CJK punctuation or full-width forms
pub fn contains_japanese(text: &str) -> bool {
    JAPANESE_RE.is_match(text)
}

/// Spells long vowels out: ā→aa ī→ii ū→uu ē→ee ō→ou
pub fn expand_long_vowels(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'ā' => out.push_str("aa"),
            'Ā' => out.push_str("Aa"),
            'ī' => out.push_str("ii"),
            'Ī' => out.push_str("Ii"),
            'ū' => out.push_str("uu"),
            'Ū' => out.push_str("Uu"),
            'ē' => out.push_str("ee"),
            'Ē' => out.push_str("Ee"),
            'ō' => out.push_str("ou"),
            'Ō' => out.push_str("Ou"),
            _ => out.push(c),
        }
    }
    out
}

pub fn capitalize_words(text: &str) -> String {
    WORD_START_RE
        .replace_all(text, |caps: &Captures| caps[0].to_uppercase())
        .into_owned()
}

fn is_closing_punctuation(c: char) -> bool {
    matches!(c, '.' | ',' | '!' | '?' | ':' | ';' | ')' | ']' | '}')
}

/// Joins romaji words with single spaces; closing punctuation sticks to the
/// word before it
fn join_words(words: &[String]) -> String {
    let mut out = String::new();
    for word in words.iter().map(|w| w.trim()).filter(|w| !w.is_empty()) {
        if !out.is_empty() && !word.chars().all(is_closing_punctuation) {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

pub struct Romanizer {
    analyzer: LazyResource<Analyzer>,
}

impl Romanizer {
    /// Loads the dictionary at `dict_path` on first use
    pub fn new(dict_path: PathBuf) -> Self {
        Self::with_loader(move || {
            let path = dict_path.clone();
            async move { Analyzer::load(&path).await }
        })
    }

    pub fn with_loader<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Analyzer>> + Send + 'static,
    {
        Self {
            analyzer: LazyResource::new(loader),
        }
    }

    /// Text without Japanese is returned unchanged and never loads the
    /// dictionary.
    pub async fn romanize(&self, text: &str) -> Result<String, InitError> {
        if !contains_japanese(text) {
            return Ok(text.to_string());
        }

        let analyzer = self.analyzer.acquire().await?;
        let romaji = analyzer
            .segment(text)
            .iter()
            .map(|token| kana::to_romaji(token.kana()))
            .collect::<Vec<_>>();
        let spaced = join_words(&romaji);

        Ok(capitalize_words(&expand_long_vowels(&spaced)))
    }
}
