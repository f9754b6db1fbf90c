use std::collections::HashMap;
use std::path::Path;

use anyhow::{bail, Context};

use super::kana::is_kana;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub surface: String,
    /// Kana reading from the dictionary, `None` for kana runs and pass-through text
    pub reading: Option<String>,
}

impl Token {
    fn plain(surface: String) -> Self {
        Self { surface, reading: None }
    }

    /// The text that should be romanized for this token
    pub fn kana(&self) -> &str {
        self.reading.as_deref().unwrap_or(&self.surface)
    }
}

/// Dictionary-driven segmenter. Surfaces are matched longest first.
#[derive(Debug, Default)]
pub struct Analyzer {
    dictionary: HashMap<String, String>,
    /// Longest surface in chars
    longest: usize,
}

impl Analyzer {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut analyzer = Analyzer::default();
        for (surface, reading) in entries {
            analyzer.insert(surface.into(), reading.into());
        }
        analyzer
    }

    fn insert(&mut self, surface: String, reading: String) {
        self.longest = self.longest.max(surface.chars().count());
        self.dictionary.insert(surface, reading);
    }

    /// Parses `surface<TAB>reading` lines. Blank lines and `#` comments
    /// are skipped.
    pub fn parse_dictionary(source: &str) -> anyhow::Result<Self> {
        let mut analyzer = Analyzer::default();

        for (idx, line) in source.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((surface, reading)) = line.split_once('\t') else {
                bail!("line {}: expected surface<TAB>reading", idx + 1);
            };
            let (surface, reading) = (surface.trim(), reading.trim());
            if surface.is_empty() || reading.is_empty() {
                bail!("line {}: empty surface or reading", idx + 1);
            }
            if !reading.chars().all(is_kana) {
                bail!("line {}: reading '{}' is not kana", idx + 1, reading);
            }

            analyzer.insert(surface.to_string(), reading.to_string());
        }

        Ok(analyzer)
    }

    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let source = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read dictionary {}", path.display()))?;
        let analyzer = Self::parse_dictionary(&source)
            .with_context(|| format!("Invalid dictionary {}", path.display()))?;

        if analyzer.is_empty() {
            tracing::warn!("Romanization dictionary {} has no entries", path.display());
        }
        tracing::info!(
            "Loaded romanization dictionary {} ({} entries)",
            path.display(),
            analyzer.len()
        );
        Ok(analyzer)
    }

    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    fn longest_match(&self, chars: &[char]) -> Option<(usize, &str)> {
        let max = self.longest.min(chars.len());
        (1..=max).rev().find_map(|len| {
            let candidate: String = chars[..len].iter().collect();
            self.dictionary
                .get(&candidate)
                .map(|reading| (len, reading.as_str()))
        })
    }

    /// Splits text into dictionary words, kana runs and pass-through runs.
    /// Whitespace separates tokens and is dropped.
    pub fn segment(&self, text: &str) -> Vec<Token> {
        let chars: Vec<char> = text.chars().collect();
        let mut tokens = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            if chars[i].is_whitespace() {
                i += 1;
                continue;
            }

            if let Some((len, reading)) = self.longest_match(&chars[i..]) {
                tokens.push(Token {
                    surface: chars[i..i + len].iter().collect(),
                    reading: Some(reading.to_string()),
                });
                i += len;
                continue;
            }

            let start = i;
            if is_kana(chars[i]) {
                while i < chars.len() && is_kana(chars[i]) {
                    i += 1;
                }
            } else {
                i += 1;
                while i < chars.len()
                    && !chars[i].is_whitespace()
                    && !is_kana(chars[i])
                    && self.longest_match(&chars[i..]).is_none()
                {
                    i += 1;
                }
            }
            tokens.push(Token::plain(chars[start..i].iter().collect()));
        }

        tokens
    }
}
