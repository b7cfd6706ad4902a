//! Part-of-speech tagging with a trigram → bigram → unigram → default
//! backoff chain, trained once from an annotated corpus.
//!
//! The trained tagger is read-only. It is shared through `Arc` by the
//! quantity extractor and the product-type classifier.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

use crate::model::LexiconError;

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:[.,]\d+)?$").expect("numeric pattern is valid"));

pub const DEFAULT_TAG: &str = "NC";
pub const NUMERAL_TAG: &str = "Z";

/// EAGLES-style tag: `NC` common noun, `AQ` adjective, `SP` preposition,
/// `Z` numeral, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(String);

impl Tag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_noun(&self) -> bool {
        self.0.starts_with("NC")
    }

    pub fn is_adjective(&self) -> bool {
        self.0.starts_with("AQ")
    }

    pub fn is_numeral(&self) -> bool {
        self.0 == NUMERAL_TAG
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type TaggedSentence = Vec<(String, Tag)>;

/// Parses `word/TAG` tokens, one sentence per line. Blank lines and `#`
/// comments are skipped. Words are lowercased.
pub fn parse_corpus(text: &str) -> Result<Vec<TaggedSentence>, LexiconError> {
    let mut sentences = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut sentence = Vec::new();
        for token in line.split_whitespace() {
            let (word, tag) = token
                .rsplit_once('/')
                .filter(|(w, t)| !w.is_empty() && !t.is_empty())
                .ok_or_else(|| LexiconError::MalformedCorpus {
                    line: index + 1,
                    token: token.to_string(),
                })?;
            sentence.push((word.to_lowercase(), Tag::new(tag)));
        }
        sentences.push(sentence);
    }
    Ok(sentences)
}

/// One n-gram stage: (previous `order - 1` tags, word) → most frequent tag.
#[derive(Debug, Default)]
struct NgramTable {
    order: usize,
    table: HashMap<(Vec<Tag>, String), Tag>,
}

impl NgramTable {
    fn train(order: usize, corpus: &[TaggedSentence]) -> Self {
        let mut counts: HashMap<(Vec<Tag>, String), HashMap<Tag, usize>> = HashMap::new();
        for sentence in corpus {
            let gold: Vec<Tag> = sentence.iter().map(|(_, t)| t.clone()).collect();
            for (index, (word, tag)) in sentence.iter().enumerate() {
                let context = (history(&gold[..index], order), word.clone());
                *counts.entry(context).or_default().entry(tag.clone()).or_default() += 1;
            }
        }

        let table = counts
            .into_iter()
            .filter_map(|(context, tags)| {
                tags.into_iter()
                    .max_by(|(ta, ca), (tb, cb)| ca.cmp(cb).then_with(|| tb.cmp(ta)))
                    .map(|(tag, _)| (context, tag))
            })
            .collect();
        Self { order, table }
    }

    fn lookup(&self, previous: &[Tag], word: &str) -> Option<&Tag> {
        let key = (history(previous, self.order), word.to_string());
        self.table.get(&key)
    }
}

fn history(previous: &[Tag], order: usize) -> Vec<Tag> {
    let keep = order.saturating_sub(1).min(previous.len());
    previous[previous.len() - keep..].to_vec()
}

#[derive(Debug)]
pub struct PosTagger {
    chain: Vec<NgramTable>,
    default_tag: Tag,
}

impl PosTagger {
    pub fn train(corpus: &[TaggedSentence]) -> Result<Self, LexiconError> {
        if corpus.iter().all(|s| s.is_empty()) {
            return Err(LexiconError::Empty("tagged corpus"));
        }
        let chain: Vec<NgramTable> = [3, 2, 1]
            .into_iter()
            .map(|order| NgramTable::train(order, corpus))
            .collect();
        debug!(
            "Trained tagger on {} sentences ({} trigram, {} bigram, {} unigram contexts)",
            corpus.len(),
            chain[0].table.len(),
            chain[1].table.len(),
            chain[2].table.len()
        );
        Ok(Self {
            chain,
            default_tag: Tag::new(DEFAULT_TAG),
        })
    }

    pub fn from_corpus_text(text: &str) -> Result<Self, LexiconError> {
        Self::train(&parse_corpus(text)?)
    }

    /// Tags a token sequence. Never fails: unseen tokens get the numeral tag
    /// when they look numeric, the default tag otherwise.
    pub fn tag<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<Tag> {
        let mut tags: Vec<Tag> = Vec::with_capacity(tokens.len());
        for token in tokens {
            let word = token.as_ref().to_lowercase();
            let tag = self
                .chain
                .iter()
                .find_map(|stage| stage.lookup(&tags, &word))
                .cloned()
                .unwrap_or_else(|| self.fallback(&word));
            tags.push(tag);
        }
        tags
    }

    fn fallback(&self, word: &str) -> Tag {
        if NUMERIC.is_match(word) {
            Tag::new(NUMERAL_TAG)
        } else {
            self.default_tag.clone()
        }
    }
}
