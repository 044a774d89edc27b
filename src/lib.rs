//! Split concatenated words back into the most probable sequence of words
//!
//! A [`Model`] maps each word observed in a corpus to a cost derived from its frequency rank.
//! Segmentation picks the partition of the input with the lowest total cost, assigning a
//! length-dependent penalty to substrings the model has never seen.
//!
//! ```
//! assert_eq!(
//!     word_splitter::split("Thequickbrownfoxjumpsoverthelazydog"),
//!     "The quick brown fox jumps over the lazy dog"
//! );
//! ```

use std::io::BufRead;
use std::path::Path;
use std::str;

use once_cell::sync::Lazy;
#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;

mod corpus;
pub use corpus::CorpusBuilder;
mod error;
pub use error::{Error, Result};
mod segment;
pub use segment::{Search, Segments};
#[cfg(any(test, feature = "test-cases"))]
pub mod test_cases;

/// Word costs learned from a corpus
///
/// Built once, then shared read-only by any number of segmentation calls.
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
#[derive(Clone)]
pub struct Model {
    costs: HashMap<SmartString, f64>,
    max_word_length: usize,
    unknown_base: f64,
    unknown_length_cost: f64,
}

impl Model {
    /// Build a model from the corpus file at `path`
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut builder = CorpusBuilder::new();
        builder.read_path(path)?;
        builder.build()
    }

    /// Build a model from a corpus stream, consuming it to the end
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut builder = CorpusBuilder::new();
        builder.read(reader)?;
        builder.build()
    }

    /// Build a model from corpus text already in memory
    pub fn from_corpus_str(corpus: &str) -> Result<Self> {
        let mut builder = CorpusBuilder::new();
        builder.feed_str(corpus);
        builder.build()
    }

    /// Build a model from ordered `(word, count)` observations
    ///
    /// Counts for repeated words accumulate. Words containing anything but letters and
    /// combining marks are ignored.
    pub fn from_counts<I, S>(observations: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut builder = CorpusBuilder::new();
        for (word, count) in observations {
            if !builder.observe(word.as_ref(), count) {
                log::debug!("ignoring observation {:?}", word.as_ref());
            }
        }
        builder.build()
    }

    /// Split `text` into words, joined by single spaces
    ///
    /// The casing of `text` is preserved. Whitespace is treated as an existing word boundary;
    /// digits and punctuation are emitted as their own words, except that an apostrophe and `s`
    /// directly after a word stay attached to it (`it's`).
    pub fn split(&self, text: &str) -> String {
        let mut search = Search::default();
        let mut out = String::with_capacity(text.len() + text.len() / 4);
        for (i, word) in self.segment(text, &mut search).enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(word);
        }
        out
    }

    /// Split `bytes`, which must be valid UTF-8
    pub fn split_utf8(&self, bytes: &[u8]) -> Result<String> {
        Ok(self.split(str::from_utf8(bytes)?))
    }

    /// Segment `input`, reusing the buffers in `search`
    ///
    /// The returned iterator yields slices of `input` in order.
    pub fn segment<'a>(&self, input: &'a str, search: &'a mut Search) -> Segments<'a> {
        segment::segment(self, input, search);
        search.segments(input)
    }

    /// Cost of `word` if it is part of the model
    pub fn cost(&self, word: &str) -> Option<f64> {
        let mut key = SmartString::new();
        corpus::normalize_into(word, &mut key);
        self.costs.get(key.as_str()).copied()
    }

    /// Cost assigned to an unknown word of `len` characters
    ///
    /// Combining marks are not counted as characters of their own.
    pub fn unknown_cost(&self, len: usize) -> f64 {
        let len = len.max(1);
        self.unknown_base + (len as f64).ln() + self.unknown_length_cost * (len - 1) as f64
    }

    /// Total cost of the given sequence of words
    ///
    /// Returns `None` iff `words` is empty.
    pub fn sentence_cost<'w, I>(&self, words: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'w str>,
    {
        let mut key = SmartString::new();
        let mut total = None;
        for word in words {
            key.clear();
            corpus::normalize_into(word, &mut key);
            let cost = self.word_cost(&key, corpus::char_len(word));
            total = Some(total.unwrap_or(0.0) + cost);
        }
        total
    }

    /// Length in characters of the longest word in the model
    pub fn max_word_length(&self) -> usize {
        self.max_word_length
    }

    /// Number of distinct words in the model
    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }

    /// `word` must already be normalized, `len` is its length in characters
    fn word_cost(&self, word: &str, len: usize) -> f64 {
        match self.costs.get(word) {
            Some(cost) => *cost,
            None => self.unknown_cost(len),
        }
    }
}

impl Default for Model {
    /// Model built from the embedded English word list
    fn default() -> Self {
        Self::from_corpus_str(DEFAULT_CORPUS).expect("embedded corpus contains words")
    }
}

/// Tunable constants of the cost policy
///
/// A word at 1-based frequency rank `r` costs `ln(r * rank_scale)`. A substring the model does
/// not know, `len` characters long, costs
/// `unknown_base + ln(len) + unknown_length_cost * (len - 1)`.
#[cfg_attr(feature = "with-serde", derive(Deserialize, Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Defaults to `ln(n)` for `n` distinct words, but never less than 1
    pub rank_scale: Option<f64>,
    /// Defaults to the cost of the rank after the least frequent word; must not be lower than
    /// the highest known cost
    pub unknown_base: Option<f64>,
    /// Per-character penalty for unknown words
    pub unknown_length_cost: f64,
    /// Drop corpus words longer than this many characters
    pub max_word_length: Option<usize>,
}

impl Config {
    pub(crate) fn check(&self) -> Result<()> {
        if let Some(scale) = self.rank_scale {
            if !scale.is_finite() || scale < 1.0 {
                return Err(Error::invalid_argument(
                    "rank_scale",
                    format!("{} must be finite and at least 1", scale),
                ));
            }
        }

        if let Some(base) = self.unknown_base {
            if !base.is_finite() {
                return Err(Error::invalid_argument("unknown_base", "must be finite"));
            }
        }

        if !self.unknown_length_cost.is_finite() || self.unknown_length_cost < 0.0 {
            return Err(Error::invalid_argument(
                "unknown_length_cost",
                format!("{} must be finite and non-negative", self.unknown_length_cost),
            ));
        }

        if self.max_word_length == Some(0) {
            return Err(Error::invalid_argument("max_word_length", "must be at least 1"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rank_scale: None,
            unknown_base: None,
            unknown_length_cost: std::f64::consts::LN_10,
            max_word_length: None,
        }
    }
}

/// Process-wide model built from the embedded word list
///
/// Built on first use and never modified afterwards.
pub fn default_model() -> &'static Model {
    &DEFAULT_MODEL
}

/// Split `text` using [`default_model()`]
pub fn split(text: &str) -> String {
    DEFAULT_MODEL.split(text)
}

static DEFAULT_MODEL: Lazy<Model> = Lazy::new(Model::default);

const DEFAULT_CORPUS: &str = include_str!("../data/words-by-frequency.txt");

type HashMap<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::{Duration, Instant};

    use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

    use super::*;

    const FOX: &str = "Thequickbrownfoxjumpsoverthelazydog";
    const FOX_SPLIT: &str = "The quick brown fox jumps over the lazy dog";

    fn fox_model() -> Model {
        Model::from_counts(vec![
            ("dog", 2),
            ("lazy", 1),
            ("the", 9),
            ("over", 3),
            ("jumps", 1),
            ("fox", 4),
            ("brown", 1),
            ("quick", 7),
        ])
        .unwrap()
    }

    #[test]
    fn test_cases() {
        test_cases::run(&Model::default());
    }

    #[test]
    fn failed_cases_keep_their_text() {
        let model = Model::default();
        let mut search = Search::default();
        for case in test_cases::FAILED {
            let input = case.concat();
            let words = model.segment(&input, &mut search).collect::<String>();
            assert_eq!(words, input);
        }
    }

    #[test]
    fn default_model_splits() {
        assert_eq!(Model::default().split(FOX), FOX_SPLIT);
        assert_eq!(split(FOX), FOX_SPLIT);
        assert_eq!(default_model().split(FOX), FOX_SPLIT);
    }

    #[test]
    fn custom_model_splits() {
        assert_eq!(fox_model().split(FOX), FOX_SPLIT);
    }

    #[test]
    fn empty_input() {
        assert_eq!(split(""), "");
        assert_eq!(fox_model().split("   "), "");
    }

    #[test]
    fn spaced_output_is_stable() {
        let model = Model::default();
        for input in &[FOX, "itwasabrightcolddayinaprilandtheclockswerestrikingthirteen"] {
            let once = model.split(input);
            assert_eq!(model.split(&once), once);
        }

        let model = fox_model();
        let once = model.split("thefoxzzqxw42dog!");
        assert_eq!(once, "the fox zzqxw 42 dog !");
        assert_eq!(model.split(&once), once);
    }

    #[test]
    fn cost_follows_frequency() {
        let model = Model::from_corpus_str("apple 50\nbanana 20\ncherry 20\ndate 5\nelder 1\n").unwrap();
        let cost = |w| model.cost(w).unwrap();
        assert!(cost("apple") < cost("banana"));
        assert!(cost("banana") < cost("cherry"));
        assert!(cost("cherry") < cost("date"));
        assert!(cost("date") < cost("elder"));
        assert!(cost("apple") >= 0.0);
        assert!(model.unknown_cost(1) > cost("elder"));
    }

    #[test]
    fn rank_cost_formula() {
        let model = Model::from_corpus_str("one\ntwo\nthree\nfour\nfive\nsix\nseven\n").unwrap();
        let scale = 7f64.ln();
        assert!((model.cost("one").unwrap() - scale.ln()).abs() < 1e-12);
        assert!((model.cost("seven").unwrap() - (7.0 * scale).ln()).abs() < 1e-12);
        assert!((model.unknown_cost(1) - (8.0 * scale).ln()).abs() < 1e-12);
        assert!(model.unknown_cost(3) < model.unknown_cost(4));
    }

    #[test]
    fn single_word_corpus() {
        let model = Model::from_counts(vec![("the", 1)]).unwrap();
        assert_eq!(model.len(), 1);
        assert!(!model.is_empty());
        assert!(model.unknown_cost(1) > model.cost("the").unwrap());
        assert_eq!(model.split("thethe"), "the the");
        assert_eq!(model.split("TheTHEthe"), "The THE the");
    }

    #[test]
    fn unknown_cost_without_length_penalty() {
        let mut builder = CorpusBuilder::new();
        builder.feed_str("one\ntwo\nthree\n");
        let config = Config {
            unknown_base: Some(10.0),
            unknown_length_cost: 0.0,
            ..Config::default()
        };

        let model = builder.build_with(&config).unwrap();
        assert!((model.unknown_cost(5) - (10.0 + 5f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn invalid_config() {
        let configs = vec![
            Config {
                rank_scale: Some(0.5),
                ..Config::default()
            },
            Config {
                unknown_length_cost: f64::NAN,
                ..Config::default()
            },
            Config {
                max_word_length: Some(0),
                ..Config::default()
            },
        ];

        for config in configs {
            let mut builder = CorpusBuilder::new();
            builder.feed_str("word\n");
            assert!(matches!(
                builder.build_with(&config),
                Err(Error::InvalidArgument { .. })
            ));
        }
    }

    #[test]
    fn deterministic() {
        let corpus = "tie 3\nknot 3\nti 3\ne 3\nkn 3\not 3\n";
        let (first, second) = (
            Model::from_corpus_str(corpus).unwrap(),
            Model::from_corpus_str(corpus).unwrap(),
        );

        for word in &["tie", "knot", "ti", "e", "kn", "ot"] {
            assert_eq!(first.cost(word), second.cost(word));
        }
        assert_eq!(first.split("tieknot"), second.split("tieknot"));
        assert_eq!(
            Model::default().split("itwasthebestoftimes").as_bytes(),
            Model::default().split("itwasthebestoftimes").as_bytes()
        );
    }

    #[test]
    fn unknown_input() {
        for model in &[Model::default(), fox_model()] {
            let out = model.split("zzqxw");
            assert!(!out.is_empty());
            assert_eq!(out.replace(' ', ""), "zzqxw");
        }
    }

    #[test]
    fn invalid_utf8() {
        let model = fox_model();
        assert!(matches!(
            model.split_utf8(b"the\xffdog"),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(model.split_utf8(b"thedog").unwrap(), "the dog");
    }

    #[test]
    fn sentence_cost() {
        let model = fox_model();
        assert_eq!(model.sentence_cost(Vec::new()), None);
        let known = model.sentence_cost(vec!["The", "dog"]).unwrap();
        assert!((known - model.cost("the").unwrap() - model.cost("dog").unwrap()).abs() < 1e-12);
        let unknown = model.sentence_cost(vec!["zzz"]).unwrap();
        assert!((unknown - model.unknown_cost(3)).abs() < 1e-12);
    }

    #[test]
    fn from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "the 100\nquick 5\nbrown 4\nfox 3\njumps 2\nover 9\nlazy 1\ndog 6").unwrap();
        let model = Model::from_path(file.path()).unwrap();
        assert_eq!(model.len(), 8);
        assert!(!model.is_empty());
        assert_eq!(model.max_word_length(), 5);
        assert_eq!(model.split(FOX), FOX_SPLIT);
    }

    #[test]
    fn missing_corpus() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Model::from_path(dir.path().join("missing.txt")),
            Err(Error::CorpusRead(_))
        ));
    }

    #[test]
    fn shared_across_threads() {
        let inputs = vec![FOX; 64];
        let model = default_model();
        let outputs = inputs
            .par_iter()
            .map(|input| model.split(input))
            .collect::<Vec<_>>();
        assert!(outputs.iter().all(|out| out == FOX_SPLIT));
    }

    #[test]
    fn split_is_fast() {
        let input = "itwasabrightcolddayinaprilandtheclockswerestrikingthirteenandthe";
        assert_eq!(input.len(), 64);

        let words = (0..100_000)
            .map(|mut i| {
                let mut word = std::string::String::new();
                loop {
                    word.push((b'a' + (i % 26) as u8) as char);
                    i /= 26;
                    if i == 0 {
                        break word;
                    }
                }
            })
            .collect::<Vec<_>>();
        let large = Model::from_counts(words.iter().map(|w| (w.as_str(), 1))).unwrap();
        assert_eq!(large.len(), 100_000);

        for model in &[default_model(), &large] {
            let start = Instant::now();
            model.split(input);
            assert!(start.elapsed() < Duration::from_millis(100));
        }
    }

    #[cfg(feature = "with-serde")]
    #[test]
    fn serde_model() {
        let model = fox_model();
        let bytes = bincode::serialize(&model).unwrap();
        let restored = bincode::deserialize::<Model>(&bytes).unwrap();
        assert_eq!(restored.split(FOX), FOX_SPLIT);
        assert_eq!(restored.cost("quick"), model.cost("quick"));
    }
}
