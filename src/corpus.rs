use std::cmp::Reverse;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str;

use log::{debug, trace, warn};
use smartstring::alias::String;

use crate::error::{Error, Result};
use crate::{Config, HashMap, Model};

/// Accumulates word observations and turns them into a [`Model`]
///
/// Two line formats are accepted and may be mixed within one corpus: a word followed by a
/// numeric count (`word 1234` or `word\t1234`), in which case the count is used as-is, or any
/// number of whitespace-separated words, each counted as a single occurrence. Lines that cannot
/// be used are skipped.
#[derive(Default)]
pub struct CorpusBuilder {
    words: HashMap<String, Observed>,
    lines: usize,
    skipped: usize,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` occurrences of `word`
    ///
    /// Returns `false` (and records nothing) if `word` contains anything other than letters and
    /// combining marks or if `count` is zero.
    pub fn observe(&mut self, word: &str, count: u64) -> bool {
        if count == 0 || word.is_empty() || !word.chars().all(is_word_char) {
            return false;
        }

        let mut key = String::new();
        normalize_into(word, &mut key);
        let seen = self.words.len();
        let entry = self.words.entry(key).or_insert(Observed {
            count: 0,
            first_seen: seen,
        });
        entry.count = entry.count.saturating_add(count);
        true
    }

    /// Parse a single corpus line
    pub fn feed_line(&mut self, line: &str) {
        self.lines += 1;
        if let Err(reason) = self.parse_line(line) {
            debug!("skipping corpus line {}: {}", self.lines, reason);
            self.skipped += 1;
        }
    }

    /// Parse every line of `corpus`
    pub fn feed_str(&mut self, corpus: &str) {
        for line in corpus.lines() {
            self.feed_line(line);
        }
    }

    /// Consume `reader` to the end, parsing it line by line
    ///
    /// Lines that are not valid UTF-8 are skipped; I/O failures abort with
    /// [`Error::CorpusRead`].
    pub fn read<R: BufRead>(&mut self, mut reader: R) -> Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).map_err(Error::CorpusRead)? == 0 {
                break;
            }

            match str::from_utf8(&buf) {
                Ok(line) => self.feed_line(line),
                Err(e) => {
                    self.lines += 1;
                    self.skipped += 1;
                    debug!("skipping corpus line {}: {}", self.lines, e);
                }
            }
        }

        Ok(())
    }

    /// Open and consume the corpus file at `path`
    pub fn read_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = File::open(path.as_ref()).map_err(Error::CorpusRead)?;
        self.read(BufReader::new(file))
    }

    /// Build a [`Model`] using the default [`Config`]
    pub fn build(self) -> Result<Model> {
        self.build_with(&Config::default())
    }

    /// Rank the observed words and compute their costs
    ///
    /// Words are ranked by descending count; equal counts keep the order in which the words were
    /// first observed. Unless configured, the unknown base cost is that of a word one rank below
    /// the least frequent one, so it is strictly above every known cost.
    pub fn build_with(self, config: &Config) -> Result<Model> {
        config.check()?;
        if self.lines > 0 && self.skipped > self.lines - self.skipped {
            warn!(
                "skipped {} of {} corpus lines while building model",
                self.skipped, self.lines
            );
        }

        let distinct = self.words.len();
        let limit = config.max_word_length.unwrap_or(usize::MAX);
        let mut ranked = self
            .words
            .into_iter()
            .map(|(word, observed)| {
                let len = char_len(&word);
                (word, len, observed)
            })
            .filter(|(_, len, _)| *len <= limit)
            .collect::<Vec<_>>();

        if ranked.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        ranked.sort_by_key(|(_, _, observed)| (Reverse(observed.count), observed.first_seen));

        let scale = config
            .rank_scale
            .unwrap_or_else(|| (ranked.len() as f64).ln().max(1.0));

        let retained = ranked.len();
        let mut costs = HashMap::default();
        costs.reserve(retained);
        let (mut max_cost, mut max_word_length) = (0.0f64, 0);
        for (idx, (word, len, _)) in ranked.into_iter().enumerate() {
            let cost = ((idx + 1) as f64 * scale).ln();
            max_cost = max_cost.max(cost);
            max_word_length = max_word_length.max(len);
            costs.insert(word, cost);
        }

        let unknown_base = match config.unknown_base {
            Some(base) if base < max_cost => {
                return Err(Error::invalid_argument(
                    "unknown_base",
                    format!("{} is below the highest known word cost {}", base, max_cost),
                ));
            }
            Some(base) => base,
            None => ((retained + 1) as f64 * scale).ln(),
        };

        debug!(
            "built model: {} distinct words, {} retained, max word length {}, unknown base cost {:.3}",
            distinct,
            costs.len(),
            max_word_length,
            unknown_base
        );

        Ok(Model {
            costs,
            max_word_length,
            unknown_base,
            unknown_length_cost: config.unknown_length_cost,
        })
    }

    fn parse_line(&mut self, line: &str) -> Result<(), &'static str> {
        let mut fields = line.split_whitespace();
        let (first, second) = match (fields.next(), fields.next()) {
            (None, _) => return Ok(()),
            (Some(first), second) => (first, second),
        };

        // A second field starting with a digit marks a frequency-annotated line
        if let Some(count) = second.filter(|s| s.as_bytes()[0].is_ascii_digit()) {
            if fields.next().is_some() {
                return Err("unexpected fields after count");
            }

            let count = count.parse::<u64>().map_err(|_| "malformed count")?;
            return match self.observe(first, count) {
                true => Ok(()),
                false => Err("not a word or zero count"),
            };
        }

        let mut accepted = false;
        for token in line.split_whitespace() {
            match self.observe(token, 1) {
                true => accepted = true,
                false => trace!("discarding corpus token {:?}", token),
            }
        }

        match accepted {
            true => Ok(()),
            false => Err("no alphabetic words"),
        }
    }
}

struct Observed {
    count: u64,
    first_seen: usize,
}

/// Letters and the combining marks that attach to them
pub(crate) fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || is_combining_mark(c)
}

/// Combining diacritical marks, which extend the preceding letter
pub(crate) fn is_combining_mark(c: char) -> bool {
    matches!(
        c,
        '\u{300}'..='\u{36f}'
            | '\u{1ab0}'..='\u{1aff}'
            | '\u{1dc0}'..='\u{1dff}'
            | '\u{20d0}'..='\u{20ff}'
            | '\u{fe20}'..='\u{fe2f}'
    )
}

/// Length of `word` in characters, counting a letter and its combining marks once
pub(crate) fn char_len(word: &str) -> usize {
    word.chars()
        .enumerate()
        .filter(|&(i, c)| i == 0 || !is_combining_mark(c))
        .count()
}

/// Lowercase `word` one `char` at a time, appending to `out`
///
/// Per-char lowercasing keeps lookups during segmentation consistent with the builder, since
/// candidate slices are lowercased the same way.
pub(crate) fn normalize_into(word: &str, out: &mut String) {
    for c in word.chars() {
        for lower in c.to_lowercase() {
            out.push(lower);
        }
    }
}
