//! # Candidate Scoring
//!
//! Each orientation candidate's recognized text is scored by a [`ScoreChain`]. Scorers are
//! tried in order and the first one that succeeds decides the score:
//!
//! 1. [`SpellCheckScorer`]: number of words the dictionary recognizes. Needs a spelling
//!    language and a [`SpellChecker`].
//! 2. [`HeuristicScorer`]: number of whitespace-separated tokens made of at least four
//!    ASCII letters.
//! 3. [`NoScore`]: always 0.
//!
//! A scorer failing is not an error for the scan. It is logged and the next scorer runs.

use crate::error::{PaperError, Result};
use crate::model::LanguageConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

static WORD_LIKE: Lazy<std::result::Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{4,}$"));

/// External spell-checking service.
pub trait SpellChecker: Send + Sync {
    /// Number of words in `text` that `dictionary` recognizes.
    fn score(&self, dictionary: &str, text: &str) -> Result<i64>;
}

/// Spell checker backed by hunspell-style word lists, `<dir>/<dictionary>.dic`.
///
/// The first line of a `.dic` file may hold the entry count and is skipped when numeric.
/// Affix flags (`word/FLAGS`) are dropped. Matching is case-insensitive.
pub struct WordListSpellChecker {
    dir: PathBuf,
    loaded: Mutex<HashMap<String, Arc<HashSet<String>>>>,
}

impl WordListSpellChecker {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            loaded: Mutex::new(HashMap::new()),
        }
    }

    fn words(&self, dictionary: &str) -> Result<Arc<HashSet<String>>> {
        let mut loaded = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(words) = loaded.get(dictionary) {
            return Ok(Arc::clone(words));
        }

        let path = self.dir.join(format!("{}.dic", dictionary));
        let raw = fs::read_to_string(&path).map_err(|e| {
            PaperError::Scoring(format!("Cannot read dictionary {}: {}", path.display(), e))
        })?;
        let words = Arc::new(parse_word_list(&raw));
        debug!(dictionary, words = words.len(), "loaded dictionary");
        loaded.insert(dictionary.to_string(), Arc::clone(&words));
        Ok(words)
    }
}

fn parse_word_list(raw: &str) -> HashSet<String> {
    let mut lines = raw.lines().peekable();
    if let Some(first) = lines.peek() {
        if first.trim().parse::<u64>().is_ok() {
            lines.next();
        }
    }
    lines
        .map(|line| line.split('/').next().unwrap_or_default().trim())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

impl SpellChecker for WordListSpellChecker {
    fn score(&self, dictionary: &str, text: &str) -> Result<i64> {
        let words = self.words(dictionary)?;
        let count = text
            .split_whitespace()
            .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|token| !token.is_empty())
            .filter(|token| words.contains(&token.to_lowercase()))
            .count();
        Ok(count as i64)
    }
}

pub trait Scorer: Send + Sync {
    fn name(&self) -> &'static str;

    fn score(&self, text: &str, langs: &LanguageConfig) -> Result<i64>;
}

pub struct SpellCheckScorer {
    checker: Option<Arc<dyn SpellChecker>>,
}

impl SpellCheckScorer {
    pub fn new(checker: Option<Arc<dyn SpellChecker>>) -> Self {
        Self { checker }
    }
}

impl Scorer for SpellCheckScorer {
    fn name(&self) -> &'static str {
        "spell_checker"
    }

    fn score(&self, text: &str, langs: &LanguageConfig) -> Result<i64> {
        let dictionary = langs
            .spelling
            .as_deref()
            .ok_or_else(|| PaperError::Scoring("No spelling language configured".to_string()))?;
        let checker = self
            .checker
            .as_ref()
            .ok_or_else(|| PaperError::Scoring("No spell checker available".to_string()))?;
        checker.score(dictionary, text)
    }
}

pub struct HeuristicScorer;

impl Scorer for HeuristicScorer {
    fn name(&self) -> &'static str {
        "lucky_guess"
    }

    fn score(&self, text: &str, _langs: &LanguageConfig) -> Result<i64> {
        let word_like = WORD_LIKE
            .as_ref()
            .map_err(|e| PaperError::Scoring(e.to_string()))?;
        Ok(text
            .split_whitespace()
            .filter(|token| word_like.is_match(token))
            .count() as i64)
    }
}

pub struct NoScore;

impl Scorer for NoScore {
    fn name(&self) -> &'static str {
        "no_score"
    }

    fn score(&self, _text: &str, _langs: &LanguageConfig) -> Result<i64> {
        Ok(0)
    }
}

#[derive(Clone)]
pub struct ScoreChain {
    scorers: Vec<Arc<dyn Scorer>>,
}

impl ScoreChain {
    pub fn new(scorers: Vec<Arc<dyn Scorer>>) -> Self {
        Self { scorers }
    }

    /// Spell check, then heuristic, then zero.
    pub fn standard(checker: Option<Arc<dyn SpellChecker>>) -> Self {
        Self::new(vec![
            Arc::new(SpellCheckScorer::new(checker)),
            Arc::new(HeuristicScorer),
            Arc::new(NoScore),
        ])
    }

    pub fn score(&self, text: &str, langs: &LanguageConfig) -> i64 {
        for scorer in &self.scorers {
            match scorer.score(text, langs) {
                Ok(score) => return score,
                Err(e) => warn!(scorer = scorer.name(), error = %e, "scorer failed, trying next"),
            }
        }
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingChecker {
        calls: AtomicUsize,
    }

    impl SpellChecker for FailingChecker {
        fn score(&self, _dictionary: &str, _text: &str) -> Result<i64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(PaperError::Scoring("dictionary service down".to_string()))
        }
    }

    struct FixedChecker(i64);

    impl SpellChecker for FixedChecker {
        fn score(&self, _dictionary: &str, _text: &str) -> Result<i64> {
            Ok(self.0)
        }
    }

    struct AlwaysFails;

    impl Scorer for AlwaysFails {
        fn name(&self) -> &'static str {
            "always_fails"
        }

        fn score(&self, _text: &str, _langs: &LanguageConfig) -> Result<i64> {
            Err(PaperError::Scoring("nope".to_string()))
        }
    }

    fn spelling() -> LanguageConfig {
        LanguageConfig::new("eng").with_spelling("en_US")
    }

    #[test]
    fn test_failing_spell_checker_falls_back_to_heuristic() {
        let checker = Arc::new(FailingChecker {
            calls: AtomicUsize::new(0),
        });
        let chain = ScoreChain::standard(Some(checker.clone() as Arc<dyn SpellChecker>));

        let score = chain.score("hello world ab 1234 abcd", &spelling());
        assert_eq!(score, 3);
        assert_eq!(checker.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_spell_checker_wins_when_it_succeeds() {
        let chain = ScoreChain::standard(Some(Arc::new(FixedChecker(42))));
        assert_eq!(chain.score("hello world", &spelling()), 42);
    }

    #[test]
    fn test_no_spelling_language_uses_heuristic() {
        let chain = ScoreChain::standard(Some(Arc::new(FixedChecker(42))));
        assert_eq!(chain.score("hello world", &LanguageConfig::new("eng")), 2);
    }

    #[test]
    fn test_everything_failing_scores_zero() {
        let chain = ScoreChain::new(vec![Arc::new(AlwaysFails), Arc::new(NoScore)]);
        assert_eq!(chain.score("hello world", &spelling()), 0);
        let empty = ScoreChain::new(Vec::new());
        assert_eq!(empty.score("hello world", &spelling()), 0);
    }

    #[test]
    fn test_heuristic_counts_only_plain_words() {
        let langs = LanguageConfig::new("eng");
        assert_eq!(HeuristicScorer.score("", &langs).unwrap(), 0);
        assert_eq!(
            HeuristicScorer
                .score("Invoice number\t1234\ndate: café word", &langs)
                .unwrap(),
            3
        );
    }

    #[test]
    fn test_word_list_checker_reads_dic_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("en_US.dic"),
            "4\nhello/M\nWorld\ninvoice/MS\ntotal\n",
        )
        .unwrap();
        let checker = WordListSpellChecker::new(dir.path());

        assert_eq!(
            checker
                .score("en_US", "Hello, world! Total invoice xyzzy")
                .unwrap(),
            4
        );
        assert!(checker.score("fr_FR", "bonjour").is_err());
    }

    #[test]
    fn test_parse_word_list_without_count_line() {
        let words = parse_word_list("alpha\nBeta/X\n\n");
        assert!(words.contains("alpha"));
        assert!(words.contains("beta"));
        assert_eq!(words.len(), 2);
    }
}
