// Startup resources: brand gazetteer, stop-words and the trained tagger.
use std::fs;
use std::sync::Arc;
use tracing::info;

use crate::brand::BrandGazetteer;
use crate::config::LexiconConfig;
use crate::model::LexiconError;
use crate::normalizer::StopWordSet;
use crate::tagger::PosTagger;

const EMBEDDED_BRANDS: &str = include_str!("../data/brands.txt");
const EMBEDDED_STOP_WORDS: &str = include_str!("../data/stop_words.txt");
const EMBEDDED_CORPUS: &str = include_str!("../data/tagged_corpus.txt");

#[derive(Debug, Clone)]
pub struct Lexicon {
    pub gazetteer: BrandGazetteer,
    pub stop_words: StopWordSet,
    pub tagger: Arc<PosTagger>,
}

fn entries(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
}

fn read_or_embedded(
    kind: &'static str,
    path: Option<&str>,
    embedded: &'static str,
) -> Result<String, LexiconError> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|source| LexiconError::Io {
            kind,
            path: path.to_string(),
            source,
        }),
        None => Ok(embedded.to_string()),
    }
}

impl Lexicon {
    /// Builds every resource from text. Each one must be non-empty.
    pub fn from_texts(brands: &str, stop_words: &str, corpus: &str) -> Result<Self, LexiconError> {
        let gazetteer = BrandGazetteer::new(entries(brands));
        if gazetteer.is_empty() {
            return Err(LexiconError::Empty("brand gazetteer"));
        }
        let stop_words = StopWordSet::new(entries(stop_words));
        if stop_words.is_empty() {
            return Err(LexiconError::Empty("stop-word list"));
        }
        let tagger = Arc::new(PosTagger::from_corpus_text(corpus)?);
        Ok(Self {
            gazetteer,
            stop_words,
            tagger,
        })
    }

    /// The resources bundled with the crate.
    pub fn embedded() -> Result<Self, LexiconError> {
        Self::from_texts(EMBEDDED_BRANDS, EMBEDDED_STOP_WORDS, EMBEDDED_CORPUS)
    }

    /// Configured files replace the embedded defaults; a configured file that
    /// cannot be read is fatal.
    pub fn load(cfg: &LexiconConfig) -> Result<Self, LexiconError> {
        let brands = read_or_embedded("brands", cfg.brands_path.as_deref(), EMBEDDED_BRANDS)?;
        let stop_words =
            read_or_embedded("stop-words", cfg.stop_words_path.as_deref(), EMBEDDED_STOP_WORDS)?;
        let corpus = read_or_embedded("corpus", cfg.corpus_path.as_deref(), EMBEDDED_CORPUS)?;
        let lexicon = Self::from_texts(&brands, &stop_words, &corpus)?;
        info!(
            "Lexicon loaded: {} brands, {} stop-words",
            lexicon.gazetteer.len(),
            lexicon.stop_words.len()
        );
        Ok(lexicon)
    }
}
