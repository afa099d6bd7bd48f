//! # Vetorizador Local por Feature Hashing
//!
//! Alternativa offline e determinística ao modelo de embeddings remoto. Cada
//! texto vira um saco de features esparsas projetado em `dimensions`
//! componentes pelo "hashing trick":
//!
//! - `w:<palavra>` (peso 1.0) para cada palavra que não é stopword;
//! - `c:<trigrama>` (peso 0.5) para cada trigrama de caracteres da palavra
//!   delimitada por `^...$`, o que aproxima formas flexionadas
//!   (`credit` / `credite`, `bancă` / `băncii`).
//!
//! O índice vem do hash FNV-1a de 64 bits da feature e o sinal do bit mais
//! alto (hashing com sinal), reduzindo o viés das colisões.
//!
//! Não captura sinonímia como um modelo neural. Serve para demonstração, para
//! testes e como fallback quando nenhum endpoint de embeddings está configurado.

use async_trait::async_trait;
use rayon::prelude::*;
use unicode_segmentation::UnicodeSegmentation;

use crate::embedding::{EmbeddingVector, Vectorizer};
use crate::error::Result;
use crate::inventory::normalize_lemma;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Palavras funcionais do romeno que não carregam sentido.
const STOPWORDS: &[&str] = &[
    "a", "ai", "al", "ale", "am", "ar", "are", "au", "aș", "ați", "ca", "care", "ce", "cea", "cei", "cel",
    "cele", "cu", "cum", "când", "că", "da", "dacă", "dar", "de", "deci", "din", "dintr", "după", "e", "ea",
    "ei", "el", "ele", "era", "este", "eu", "fi", "fie", "fost", "i", "iar", "l", "la", "le", "lor", "lui",
    "m", "mai", "mi", "n", "ne", "nici", "noi", "nu", "o", "ori", "pe", "pentru", "prin", "s", "sau", "se",
    "sunt", "să", "te", "tot", "tu", "un", "una", "unei", "unui", "va", "voi", "vor", "vă", "într", "îi",
    "îl", "îmi", "în", "și", "ți",
];

/// Vetorizador determinístico baseado em feature hashing.
#[derive(Debug, Clone)]
pub struct HashingVectorizer {
    dimensions: usize,
    model_id: String,
}

impl HashingVectorizer {
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model_id: format!("hashing-{dimensions}"),
        }
    }

    /// Vetoriza de forma síncrona (usado pelas duas operações do trait).
    pub fn vectorize(&self, text: &str) -> EmbeddingVector {
        let mut values = vec![0.0f32; self.dimensions];
        for (feature, weight) in features(text) {
            let hash = fnv1a(feature.as_bytes());
            let index = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            values[index] += sign * weight;
        }
        EmbeddingVector::new(values)
    }
}

impl Default for HashingVectorizer {
    fn default() -> Self {
        Self::new(512)
    }
}

#[async_trait]
impl Vectorizer for HashingVectorizer {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>> {
        Ok(texts.par_iter().map(|text| self.vectorize(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Extrai as features ponderadas de um texto.
fn features(text: &str) -> Vec<(String, f32)> {
    let normalized = normalize_lemma(text);
    let mut out = Vec::new();

    for word in normalized.unicode_words() {
        if STOPWORDS.contains(&word) {
            continue;
        }
        out.push((format!("w:{word}"), WORD_WEIGHT));

        let padded: Vec<char> = std::iter::once('^').chain(word.chars()).chain(std::iter::once('$')).collect();
        for window in padded.windows(3) {
            let trigram: String = window.iter().collect();
            out.push((format!("c:{trigram}"), TRIGRAM_WEIGHT));
        }
    }
    out
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    #[test]
    fn test_deterministic() {
        let v = HashingVectorizer::new(64);
        assert_eq!(v.vectorize("calul aleargă pe câmp"), v.vectorize("calul aleargă pe câmp"));
    }

    #[test]
    fn test_empty_and_stopwords_are_null() {
        let v = HashingVectorizer::default();
        assert!(v.vectorize("").is_null());
        assert!(v.vectorize("   ").is_null());
        assert!(v.vectorize("și la de pe").is_null());
    }

    #[test]
    fn test_dimensions() {
        let v = HashingVectorizer::new(128);
        assert_eq!(v.vectorize("bancă").len(), 128);
        assert_eq!(Vectorizer::dimensions(&v), 128);
        assert_eq!(v.model_id(), "hashing-128");
    }

    #[test]
    fn test_shared_words_increase_similarity() {
        let v = HashingVectorizer::default();
        let context = v.vectorize("am depus bani la bancă și am cerut un credit");
        let finance = v.vectorize("instituție financiară care păstrează bani și acordă credite");
        let bench = v.vectorize("scaun lung de lemn în parc");
        assert!(cosine_similarity(&context, &finance) > cosine_similarity(&context, &bench));
    }

    #[test]
    fn test_case_insensitive() {
        let v = HashingVectorizer::default();
        assert_eq!(v.vectorize("Bancă"), v.vectorize("bancă"));
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let v = HashingVectorizer::new(32);
        let batch = v.embed_batch(&["lac", "vin roșu", ""]).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[1], v.embed("vin roșu").await.unwrap());
        assert!(batch[2].is_null());
    }
}
