//! # Motor de Desambiguação
//!
//! Para cada ocorrência ambígua:
//!
//! 1. vetoriza o texto da janela de contexto;
//! 2. vetoriza a glosa de cada candidato (ou seus sinônimos, se a glosa faltar);
//! 3. pontua cada candidato pela similaridade de cosseno com o contexto;
//! 4. ordena de forma decrescente e escolhe o melhor;
//! 5. marca baixa confiança se o melhor score ficar abaixo do limiar **ou** se
//!    a margem para o segundo for menor que a mínima (portões independentes).
//!
//! ## Desempate
//!
//! Scores a menos de [`TIE_EPSILON`] do máximo contam como empatados. Entre
//! eles vence o candidato com vetor não nulo e, depois, o que vem primeiro na
//! ordem canônica do inventário. O resultado nunca depende da ordem de
//! conclusão das tarefas nem de instabilidades de ordenação.
//!
//! ## Falhas
//!
//! Cada chamada ao vetorizador é repetida até `max_retries` vezes, com espera
//! exponencial. Esgotadas as tentativas, o erro volta ao chamador, que marca
//! apenas essa ocorrência como não resolvida. Erros fatais
//! ([`WsdError::is_fatal`](crate::WsdError::is_fatal)) não são repetidos.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::{RetryPolicy, WsdConfig};
use crate::context::ContextWindow;
use crate::detector::AmbiguousOccurrence;
use crate::embedding::{cosine_similarity, EmbeddingVector, Vectorizer};
use crate::error::Result;
use crate::inventory::SenseCandidate;
use crate::token::Pos;

/// Dois scores mais próximos que isso estão empatados.
pub const TIE_EPSILON: f64 = 1e-9;

/// Um candidato com seu score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSense {
    pub sense: SenseCandidate,
    pub score: f64,
    /// Posição do candidato na ordem canônica do inventário.
    pub canonical_rank: usize,
    /// A glosa produziu vetor nulo (score fixado em -1).
    pub degenerate: bool,
}

/// Estatísticas dos scores de uma ocorrência.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreStats {
    pub max: f64,
    pub min: f64,
    /// `max - min`
    pub spread: f64,
    /// Desvio padrão populacional.
    pub std_dev: f64,
}

impl ScoreStats {
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self::default();
        }
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            max,
            min,
            spread: max - min,
            std_dev: variance.sqrt(),
        }
    }
}

/// Resultado da desambiguação de uma ocorrência.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisambiguationResult {
    pub position: usize,
    pub surface: String,
    pub lemma: String,
    pub pos: Pos,
    /// Sentido escolhido (sempre presente, mesmo com baixa confiança).
    pub chosen: SenseCandidate,
    pub score: f64,
    /// Todos os candidatos, do melhor para o pior. O primeiro é o escolhido.
    pub ranked: Vec<ScoredSense>,
    pub low_confidence: bool,
    /// Diferença entre o 1º e o 2º score.
    pub margin: f64,
    pub stats: ScoreStats,
    /// Texto da janela de contexto usado como evidência.
    pub context: String,
}

/// Ordena os candidatos e coloca o vencedor do desempate na frente.
///
/// `scores[i]` é o score de `candidates[i]`; `None` indica vetor nulo e vale -1.
/// Devolve lista vazia se não houver candidatos.
pub fn rank(candidates: &[SenseCandidate], scores: &[Option<f64>]) -> Vec<ScoredSense> {
    let mut ranked: Vec<ScoredSense> = candidates
        .iter()
        .zip(scores)
        .enumerate()
        .map(|(i, (sense, score))| ScoredSense {
            sense: sense.clone(),
            score: score.unwrap_or(-1.0),
            canonical_rank: i,
            degenerate: score.is_none(),
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.canonical_rank.cmp(&b.canonical_rank))
    });

    let Some(top) = ranked.first().map(|s| s.score) else {
        return ranked;
    };

    // Entre os empatados no topo: não nulo primeiro, depois ordem canônica
    let winner = ranked
        .iter()
        .enumerate()
        .take_while(|(_, s)| top - s.score <= TIE_EPSILON)
        .min_by_key(|(_, s)| (s.degenerate, s.canonical_rank))
        .map_or(0, |(i, _)| i);

    if winner != 0 {
        let chosen = ranked.remove(winner);
        ranked.insert(0, chosen);
    }
    ranked
}

/// Avalia os portões de confiança: devolve `(low_confidence, margin)`.
pub fn assess(ranked: &[ScoredSense], confidence_threshold: f64, margin_threshold: f64) -> (bool, f64) {
    let top = ranked.first().map_or(-1.0, |s| s.score);
    let second = ranked.get(1).map_or(-1.0, |s| s.score);
    let margin = (top - second).max(0.0);
    let low_confidence = top < confidence_threshold || margin < margin_threshold;
    (low_confidence, margin)
}

/// Motor de desambiguação por similaridade vetorial.
pub struct DisambiguationEngine {
    vectorizer: Arc<dyn Vectorizer>,
    confidence_threshold: f64,
    margin_threshold: f64,
    retry: RetryPolicy,
}

impl DisambiguationEngine {
    /// Cria o motor com os limiares padrão.
    pub fn new(vectorizer: Arc<dyn Vectorizer>) -> Self {
        let defaults = WsdConfig::default();
        Self {
            vectorizer,
            confidence_threshold: defaults.confidence_threshold,
            margin_threshold: defaults.margin_threshold,
            retry: defaults.retry,
        }
    }

    pub fn from_config(vectorizer: Arc<dyn Vectorizer>, config: &WsdConfig) -> Self {
        Self {
            vectorizer,
            confidence_threshold: config.confidence_threshold,
            margin_threshold: config.margin_threshold,
            retry: config.retry,
        }
    }

    pub fn with_thresholds(mut self, confidence: f64, margin: f64) -> Self {
        self.confidence_threshold = confidence;
        self.margin_threshold = margin;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn vectorizer(&self) -> &Arc<dyn Vectorizer> {
        &self.vectorizer
    }

    /// Desambigua uma ocorrência usando a janela de contexto dada.
    ///
    /// # Errors
    ///
    /// [`crate::WsdError::EmbeddingFailure`] quando o vetorizador falha mesmo
    /// depois das retentativas. O erro é local a esta ocorrência.
    pub async fn disambiguate(
        &self,
        occurrence: &AmbiguousOccurrence<'_>,
        context: &ContextWindow,
    ) -> Result<DisambiguationResult> {
        let context_text = context.text();

        let context_vec = self
            .retrying("contexto", || self.vectorizer.embed(&context_text))
            .await?;

        let glosses: Vec<String> = occurrence.candidates.iter().map(SenseCandidate::gloss_text).collect();
        let gloss_refs: Vec<&str> = glosses.iter().map(String::as_str).collect();
        let gloss_vecs = self
            .retrying("glosas", || self.vectorizer.embed_batch(&gloss_refs))
            .await?;

        let scores = score_all(&context_vec, &gloss_vecs);
        let result = self.conclude(occurrence, context_text, scores);

        debug!(
            position = result.position,
            lemma = %result.lemma,
            chosen = %result.chosen.id,
            score = result.score,
            margin = result.margin,
            low_confidence = result.low_confidence,
            "Sentido escolhido"
        );
        Ok(result)
    }

    /// Monta o resultado a partir de scores já calculados (sem I/O).
    pub fn conclude(
        &self,
        occurrence: &AmbiguousOccurrence<'_>,
        context: String,
        scores: Vec<Option<f64>>,
    ) -> DisambiguationResult {
        let token = occurrence.token;
        let ranked = rank(&occurrence.candidates, &scores);
        let (low_confidence, margin) = assess(&ranked, self.confidence_threshold, self.margin_threshold);
        let stats = ScoreStats::from_scores(&ranked.iter().map(|s| s.score).collect::<Vec<_>>());

        // `rank` nunca devolve vazio para uma ocorrência (≥ 2 candidatos)
        let (chosen, score) = ranked
            .first()
            .map(|s| (s.sense.clone(), s.score))
            .unwrap_or_else(|| (SenseCandidate::new("", ""), -1.0));

        DisambiguationResult {
            position: token.position,
            surface: token.surface.clone(),
            lemma: token.lemma.clone(),
            pos: token.pos,
            chosen,
            score,
            ranked,
            low_confidence,
            margin,
            stats,
            context,
        }
    }

    /// Executa `call` com retentativas e espera exponencial.
    ///
    /// Erros fatais voltam na primeira tentativa.
    async fn retrying<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_fatal() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = self.retry.delay(attempt);
                    warn!(
                        target_text = what,
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Falha de embedding, tentando novamente"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    error!(target_text = what, attempts = attempt + 1, error = %err, "Embedding falhou, tentativas esgotadas");
                    return Err(err);
                }
            }
        }
    }
}

/// Score de cada glosa contra o contexto. Vetor nulo (em qualquer lado) vira `None`.
fn score_all(context: &EmbeddingVector, glosses: &[EmbeddingVector]) -> Vec<Option<f64>> {
    glosses
        .iter()
        .map(|gloss| {
            if context.is_null() || gloss.is_null() {
                None
            } else {
                Some(cosine_similarity(context, gloss))
            }
        })
        .collect()
}
