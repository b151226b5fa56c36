//! TF-IDF vectorizer for movie text (genres, tags and title).
//!
//! - Lowercased tokens of two or more word characters
//! - Common English stop words removed
//! - Terms kept only when they occur in at least `min_df` documents
//! - Smoothed IDF: `ln((1 + n) / (1 + df)) + 1`
//! - Raw term counts weighted by IDF, then L2-normalized per document
//! - Output vectors are sparse, one slot per vocabulary term

use crate::sparse::SparseVector;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Stop words dropped before counting
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs",
    "them", "themselves", "then", "there", "these", "they", "this", "those", "through", "to",
    "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Term to column, columns assigned in alphabetical term order
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    min_df: usize,
}

impl TfidfVectorizer {
    /// Default minimum document frequency
    pub const DEFAULT_MIN_DF: usize = 2;

    pub fn new() -> Self {
        Self::with_min_df(Self::DEFAULT_MIN_DF)
    }

    pub fn with_min_df(min_df: usize) -> Self {
        Self {
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            min_df: min_df.max(1),
        }
    }

    /// Number of output columns
    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Build the vocabulary and IDF weights from a corpus.
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) {
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for doc in documents {
            let unique: HashSet<String> = tokenize(doc.as_ref()).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let n_docs = documents.len() as f64;
        self.vocabulary.clear();
        self.idf.clear();

        // BTreeMap iteration is alphabetical, so column order is stable
        for (term, df) in doc_freq.into_iter().filter(|(_, df)| *df >= self.min_df) {
            self.vocabulary.insert(term, self.idf.len());
            self.idf.push(((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0);
        }
    }

    /// L2-normalized TF-IDF vector for one document. Unknown terms are ignored.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in tokenize(document) {
            if let Some(&col) = self.vocabulary.get(&term) {
                *counts.entry(col).or_insert(0.0) += 1.0;
            }
        }

        let weighted = counts
            .into_iter()
            .map(|(col, count)| (col as u32, count * self.idf[col]))
            .collect();
        SparseVector::from_entries(weighted).normalized()
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Vec<SparseVector> {
        self.fit(documents);
        documents
            .iter()
            .map(|doc| self.transform(doc.as_ref()))
            .collect()
    }
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase, split on anything that is not alphanumeric or `_`, drop
/// single-character tokens and stop words.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|token| !STOP_WORDS.contains(&token.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_drops_stop_words_and_short_tokens() {
        let tokens: Vec<String> = tokenize("The Lord of the Rings: a Sci-Fi epic (2001)").collect();
        assert_eq!(tokens, vec!["lord", "rings", "sci", "fi", "epic", "2001"]);
    }

    #[test]
    fn test_min_df_filters_rare_terms() {
        let docs = ["space robots", "space pirates", "romantic comedy"];
        let mut vectorizer = TfidfVectorizer::new();
        vectorizer.fit(&docs);

        assert_eq!(vectorizer.vocabulary_len(), 1);
        assert_eq!(vectorizer.term_index("space"), Some(0));
        assert!(vectorizer.term_index("robots").is_none());
    }

    #[test]
    fn test_vectors_are_unit_length_or_zero() {
        let docs = ["dark comedy", "dark thriller", "comedy romance", "documentary"];
        let mut vectorizer = TfidfVectorizer::new();
        let vectors = vectorizer.fit_transform(&docs);

        for (doc, vector) in docs.iter().zip(&vectors) {
            let norm = vector.l2_norm();
            if *doc == "documentary" {
                assert_eq!(norm, 0.0);
            } else {
                assert!((norm - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        let docs = ["heist crime", "heist crime", "crime drama", "crime drama", "crime"];
        let mut vectorizer = TfidfVectorizer::new();
        vectorizer.fit(&docs);

        let v = vectorizer.transform("heist crime");
        let heist = v.get(vectorizer.term_index("heist").unwrap() as u32);
        let crime = v.get(vectorizer.term_index("crime").unwrap() as u32);
        assert!(heist > crime);
    }

    #[test]
    fn test_transform_stores_only_present_terms() {
        let docs = ["space opera", "space western", "opera house", "western town"];
        let mut vectorizer = TfidfVectorizer::new();
        vectorizer.fit(&docs);

        let v = vectorizer.transform("space opera space");
        assert_eq!(v.nnz(), 2);
        assert!(v.get(vectorizer.term_index("space").unwrap() as u32) > 0.0);
        assert_eq!(v.get(vectorizer.term_index("western").unwrap() as u32), 0.0);
    }
}
