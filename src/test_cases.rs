use crate::{Model, Search};

/// Run a model against the built-in test cases
pub fn run(model: &Model) {
    let mut search = Search::default();
    {
        let words = model.segment("", &mut search);
        assert_eq!(words.len(), 0);
        assert_eq!(words.cost(), 0.0);
    }

    let mut success = true;
    for test in TEST_CASES.iter().copied() {
        success &= assert_segments(test, &mut search, model);
    }

    assert!(success);
}

/// Segment the concatenation of `s` and report whether `s` comes back
///
/// Prints the expected and actual words on mismatch.
pub fn assert_segments(s: &[&str], search: &mut Search, model: &Model) -> bool {
    let input = s.concat();
    let cmp = model.segment(&input, search).collect::<Vec<_>>();
    let success = cmp == s;
    if !success {
        println!("expected: {:?}", s);
        println!("actual:   {:?}\n", cmp);
    }
    success
}

pub fn check_segments(s: &[&str], search: &mut Search, model: &Model) -> bool {
    let input = s.concat();
    let words = model.segment(&input, search);
    s.iter().copied().eq(words)
}

/// Built-in test cases
///
/// These are exposed so that you can test with different corpora.
pub const TEST_CASES: &[&[&str]] = &[
    &["the", "quick", "brown", "fox", "jumps", "over", "the", "lazy", "dog"],
    &["choose", "spain"],
    &["this", "is", "a", "test"],
    &["who", "represents"],
    &["experts", "exchange"],
    &["speed", "of", "art"],
    &["rust", "is", "very", "fast"],
    &["python", "is", "fast"],
    &["java", "is", "just", "bad"],
    &["hello", "world"],
    &["now", "is", "the", "time", "for", "all", "good"],
    &["it", "is", "a", "truth", "universally", "acknowledged"],
    &[
        "it", "was", "a", "bright", "cold", "day", "in", "april", "and", "the", "clocks", "were",
        "striking", "thirteen",
    ],
    &[
        "when",
        "in",
        "the",
        "course",
        "of",
        "human",
        "events",
        "it",
        "becomes",
        "necessary",
    ],
    &[
        "it",
        "was",
        "the",
        "best",
        "of",
        "times",
        "it",
        "was",
        "the",
        "worst",
        "of",
        "times",
        "it",
        "was",
        "the",
        "age",
        "of",
        "wisdom",
        "it",
        "was",
        "the",
        "age",
        "of",
        "foolishness",
    ],
];

/// Incorrectly segmented test cases
///
/// Words missing from the embedded list become unknown spans that absorb their neighbours.
pub const FAILED: &[&[&str]] = &[&[
    // The embedded list lacks "hobbit", "nasty", "oozy", "bare" and "sandy"
    "in", "a", "hole", "in", "the", "ground", "there", "lived", "a", "hobbit", "not", "a", "nasty",
    "dirty", "wet", "hole", "filled", "with", "the", "ends", "of", "worms", "and", "an", "oozy",
    "smell", "nor", "yet", "a", "dry", "bare", "sandy", "hole", "with", "nothing", "in", "it", "to",
    "sit", "down", "on", "or", "to", "eat", "it", "was", "a", "hobbit", "hole", "and", "that",
    "means", "comfort",
]];
