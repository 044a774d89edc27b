use std::ops::Range;
use std::slice;

use crate::corpus::{is_combining_mark, is_word_char};
use crate::Model;

/// Find the cheapest segmentation of `input` according to `model`
///
/// Whitespace separates, other non-alphabetic runs are kept as single segments and each
/// alphabetic run is handed to [`SegmentState::run()`]. An apostrophe followed by `s` right
/// after a word is appended to that word.
pub(crate) fn segment(model: &Model, input: &str, search: &mut Search) {
    search.clear();

    let mut chars = input.char_indices().peekable();
    let mut word_end = None;
    while let Some(&(start, c)) = chars.peek() {
        let class = Class::of(c);
        let mut end = input.len();
        while let Some(&(idx, c)) = chars.peek() {
            if Class::of(c) != class {
                end = idx;
                break;
            }
            chars.next();
        }

        match class {
            Class::Alphabetic => {
                SegmentState::new(model, input, start..end, search).run();
                word_end = Some(end);
                continue;
            }
            Class::Other if word_end == Some(start) && is_apostrophe(&input[start..end]) => {
                match chars.peek() {
                    Some(&(idx, 's')) | Some(&(idx, 'S')) => {
                        chars.next();
                        if let Some(last) = search.result.last_mut() {
                            last.end = idx + 1;
                        }
                    }
                    _ => search.result.push(start..end),
                }
            }
            Class::Other => search.result.push(start..end),
            Class::Space => {}
        }

        word_end = None;
    }
}

fn is_apostrophe(s: &str) -> bool {
    s == "'" || s == "\u{2019}"
}

#[derive(Clone, Copy, PartialEq)]
enum Class {
    Alphabetic,
    Space,
    Other,
}

impl Class {
    fn of(c: char) -> Self {
        if is_word_char(c) {
            Self::Alphabetic
        } else if c.is_whitespace() {
            Self::Space
        } else {
            Self::Other
        }
    }
}

struct SegmentState<'a> {
    model: &'a Model,
    search: &'a mut Search,
    /// Number of characters in the run
    len: usize,
}

impl<'a> SegmentState<'a> {
    fn new(model: &'a Model, input: &'a str, run: Range<usize>, search: &'a mut Search) -> Self {
        search.lowered.clear();
        search.offsets.clear();
        search.lowered_offsets.clear();

        // No boundary in front of a combining mark
        for (idx, c) in input[run.clone()].char_indices() {
            if idx == 0 || !is_combining_mark(c) {
                search.offsets.push(run.start + idx);
                search.lowered_offsets.push(search.lowered.len());
            }

            for lower in c.to_lowercase() {
                search.lowered.push(lower);
            }
        }

        search.offsets.push(run.end);
        search.lowered_offsets.push(search.lowered.len());

        Self {
            model,
            len: search.offsets.len() - 1,
            search,
        }
    }

    /// Shortest path over the character boundaries of the run
    ///
    /// `costs[i]` holds the cheapest cost of segmenting the first `i` characters and `cuts[i]`
    /// the start of the last word on that path. Only the last `max_word_length` boundaries are
    /// considered for each position. On equal cost a known last word beats an unknown one, and
    /// among those the later start wins.
    fn run(self) {
        let search = self.search;
        search.costs.clear();
        search.cuts.clear();
        search.costs.push(0.0);
        search.cuts.push(0);

        let limit = self.model.max_word_length.max(1);
        for end in 1..=self.len {
            let (mut best, mut cut, mut best_known) = (f64::INFINITY, end - 1, false);
            for start in end.saturating_sub(limit)..end {
                let word = search.lowered_offsets[start]..search.lowered_offsets[end];
                let word = &search.lowered[word];
                let (cost, known) = match self.model.costs.get(word) {
                    Some(cost) => (*cost, true),
                    None => (self.model.unknown_cost(end - start), false),
                };

                let cost = search.costs[start] + cost;
                if cost < best || (cost == best && (known || !best_known)) {
                    best = cost;
                    cut = start;
                    best_known = known;
                }
            }

            search.costs.push(best);
            search.cuts.push(cut);
        }

        search.cost += search.costs[self.len];

        let first = search.result.len();
        let mut end = self.len;
        while end > 0 {
            let start = search.cuts[end];
            search
                .result
                .push(search.offsets[start]..search.offsets[end]);
            end = start;
        }

        search.result[first..].reverse();
    }
}

/// Reusable buffers for [`Model::segment()`]
///
/// Passing the same `Search` to repeated calls avoids reallocating the intermediate storage.
#[derive(Clone, Default)]
pub struct Search {
    costs: Vec<f64>,
    cuts: Vec<usize>,
    lowered: String,
    lowered_offsets: Vec<usize>,
    offsets: Vec<usize>,
    result: Vec<Range<usize>>,
    cost: f64,
}

impl Search {
    fn clear(&mut self) {
        self.result.clear();
        self.cost = 0.0;
    }

    pub(crate) fn segments<'a>(&'a self, input: &'a str) -> Segments<'a> {
        Segments {
            input,
            ranges: self.result.iter(),
            cost: self.cost,
        }
    }
}

/// Words produced by [`Model::segment()`], in input order
pub struct Segments<'a> {
    input: &'a str,
    ranges: slice::Iter<'a, Range<usize>>,
    cost: f64,
}

impl<'a> Segments<'a> {
    /// Total cost of the chosen segmentation
    ///
    /// Segments that were passed through without segmentation (digits, punctuation) do not
    /// contribute, nor does an attached `'s`.
    pub fn cost(&self) -> f64 {
        self.cost
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let range = self.ranges.next()?;
        Some(&self.input[range.clone()])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ranges.size_hint()
    }
}

impl<'a> ExactSizeIterator for Segments<'a> {}
