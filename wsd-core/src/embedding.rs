//! # Vetorização de Texto
//!
//! Contexto e glosas são projetados no **mesmo** espaço vetorial pelo mesmo
//! [`Vectorizer`]; só assim a similaridade de cosseno entre eles tem sentido.
//!
//! O modelo é uma estratégia trocável escolhida na construção do pipeline:
//!
//! | Implementação                         | Rede | Determinístico |
//! |---------------------------------------|------|----------------|
//! | [`HashingVectorizer`](crate::hashing::HashingVectorizer) | não  | sim |
//! | [`OpenAiVectorizer`](crate::openai::OpenAiVectorizer)    | sim  | por modelo/versão |
//!
//! ## Vetor nulo
//!
//! Texto vazio produz um vetor nulo (todos os componentes zero). A similaridade
//! com um vetor nulo vale `-1.0`, o pior valor possível, de modo que ele nunca
//! vence um empate nem é escolhido como melhor sentido quando há alternativa.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Vetor denso de dimensão fixa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    /// Vetor nulo de `dimensions` componentes.
    pub fn null(dimensions: usize) -> Self {
        Self(vec![0.0; dimensions])
    }

    /// Vazio ou com todos os componentes zero.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Vetor com todos os componentes negados.
    pub fn negated(&self) -> Self {
        Self(self.0.iter().map(|v| -v).collect())
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Similaridade de cosseno, calculada em `f64`.
///
/// `-1.0` se qualquer um dos vetores for nulo ou se as dimensões diferirem.
/// O resultado é limitado a `[-1.0, 1.0]`.
pub fn cosine_similarity(a: &EmbeddingVector, b: &EmbeddingVector) -> f64 {
    if a.len() != b.len() || a.is_null() || b.is_null() {
        return -1.0;
    }

    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.0.iter().zip(&b.0) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return -1.0;
    }
    (dot / denominator).clamp(-1.0, 1.0)
}

/// Estratégia de vetorização: texto → vetor denso.
///
/// Implementações devem ser determinísticas para um modelo/versão fixo e
/// devolver um vetor nulo (não um erro) para texto vazio.
#[async_trait]
pub trait Vectorizer: Send + Sync {
    /// Vetoriza um único texto.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    /// Vetoriza um lote de textos, na mesma ordem.
    ///
    /// A implementação padrão chama [`embed`](Vectorizer::embed) em sequência.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// Dimensão dos vetores produzidos.
    fn dimensions(&self) -> usize;

    /// Identificador do modelo (para logs e relatórios).
    fn model_id(&self) -> &str;
}
