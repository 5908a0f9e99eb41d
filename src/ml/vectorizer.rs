// ============================================================
// Layer 5 — Bag-of-Words Vectorizer
// ============================================================
// Learns a word-level vocabulary from the training titles and
// maps any text to sparse term counts over that vocabulary.
//
// The vocabulary is materialised as a HuggingFace tokenizer:
//
//   normalizer     Lowercase
//   pre_tokenizer  Whitespace   (splits on \w+ | [^\w\s]+)
//   model          WordLevel    { "[UNK]": 0, word_1: 1, ... }
//
// Token id 0 is [UNK]. Every out-of-vocabulary word encodes to
// it and is dropped, so unseen text never fails; it simply
// contributes fewer (or zero) features. Feature index = id - 1.
//
// Word order is by descending corpus frequency, ties broken
// alphabetically, which keeps the feature layout identical
// across runs on the same training set.
//
// Reference: Tokenizers docs (WordLevel model)

use anyhow::{anyhow, ensure, Context, Result};
use serde_json::json;
use std::{collections::BTreeMap, fmt, path::Path, str::FromStr};
use tokenizers::{
    normalizers::Lowercase, pre_tokenizers::whitespace::Whitespace, Normalizer,
    OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer, Tokenizer,
};

pub const UNK_TOKEN: &str = "[UNK]";
const UNK_ID: u32 = 0;

/// A fitted vocabulary plus the tokenizer that applies it.
#[derive(Clone)]
pub struct Vocabulary {
    tokenizer:  Tokenizer,
    n_features: usize,
}

impl Vocabulary {
    /// Count words across `texts` and build the vocabulary.
    /// `max_features` keeps only the most frequent words.
    pub fn fit<S: AsRef<str>>(texts: &[S], max_features: Option<usize>) -> Result<Self> {
        // BTreeMap iterates alphabetically; the stable sort below keeps
        // that order between words with equal counts.
        let mut freq: BTreeMap<String, usize> = BTreeMap::new();
        for text in texts {
            for word in words(text.as_ref())? {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = freq.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(max) = max_features {
            ranked.truncate(max);
        }
        ensure!(!ranked.is_empty(), "Training texts produced an empty vocabulary");

        let mut vocab = serde_json::Map::new();
        vocab.insert(UNK_TOKEN.to_string(), json!(UNK_ID));
        for (i, (word, _)) in ranked.iter().enumerate() {
            vocab.insert(word.clone(), json!(i + 1));
        }

        let tokenizer = build_tokenizer(vocab)?;
        tracing::debug!("Vocabulary fitted with {} words", ranked.len());

        Ok(Self { tokenizer, n_features: ranked.len() })
    }

    /// Rebuild from a saved tokenizer file.
    pub fn load(path: &Path, n_features: usize) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            anyhow!("Cannot load vocabulary from '{}': {}", path.display(), e)
        })?;
        Ok(Self { tokenizer, n_features })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.tokenizer
            .save(path, true)
            .map_err(|e| anyhow!("Cannot write vocabulary to '{}': {}", path.display(), e))
    }

    /// Width of the feature vectors this vocabulary produces.
    pub fn len(&self) -> usize {
        self.n_features
    }

    pub fn is_empty(&self) -> bool {
        self.n_features == 0
    }

    /// Feature index of `word`, if it is in the vocabulary.
    #[cfg(test)]
    pub fn feature_index(&self, word: &str) -> Option<u32> {
        match self.tokenizer.token_to_id(word) {
            Some(UNK_ID) | None => None,
            Some(id)            => Some(id - 1),
        }
    }

    /// Sparse term counts for `text`, sorted by feature index.
    pub fn transform(&self, text: &str) -> Result<Vec<(u32, f32)>> {
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;

        let mut counts: BTreeMap<u32, f32> = BTreeMap::new();
        for &id in encoding.get_ids() {
            if id != UNK_ID {
                *counts.entry(id - 1).or_insert(0.0) += 1.0;
            }
        }
        Ok(counts.into_iter().collect())
    }
}

impl fmt::Debug for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vocabulary")
            .field("n_features", &self.n_features)
            .finish()
    }
}

/// The tokens `transform` will look up for `text`: the same Lowercase
/// normalizer and Whitespace pre-tokenizer the tokenizer applies.
/// Pure punctuation runs are skipped, so they always encode to [UNK].
fn words(text: &str) -> Result<Vec<String>> {
    let mut pretokenized = PreTokenizedString::from(text);
    pretokenized
        .normalize(|s| Lowercase.normalize(s))
        .map_err(|e| anyhow!("Normalisation error: {e}"))?;
    Whitespace::default()
        .pre_tokenize(&mut pretokenized)
        .map_err(|e| anyhow!("Pre-tokenisation error: {e}"))?;

    Ok(pretokenized
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(word, _, _)| word)
        .filter(|word| word.chars().any(|c| c.is_alphanumeric() || c == '_'))
        .map(str::to_string)
        .collect())
}

fn build_tokenizer(vocab: serde_json::Map<String, serde_json::Value>) -> Result<Tokenizer> {
    let tokenizer_json = json!({
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [
            {"id": UNK_ID, "content": UNK_TOKEN, "single_word": false, "lstrip": false,
             "rstrip": false, "normalized": false, "special": true}
        ],
        "normalizer": { "type": "Lowercase" },
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": vocab,
            "unk_token": UNK_TOKEN
        }
    });

    Tokenizer::from_str(&tokenizer_json.to_string())
        .map_err(|e| anyhow!("{e}"))
        .context("Cannot build word-level tokenizer")
}
