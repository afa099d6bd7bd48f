//! # Enriquecimento: explicações e exemplos gerados
//!
//! Colaborador externo que transforma um sentido escolhido em texto legível
//! (explicação + frases de exemplo). Duas estratégias, escolhidas na construção:
//!
//! - [`ChatExplainer`]: API de chat completions compatível com OpenAI
//!   (ex: DeepSeek via OpenRouter);
//! - [`OfflineExplainer`]: determinístico, monta o texto a partir da glosa e
//!   dos exemplos do inventário.
//!
//! Uma falha do explicador afeta só aquele sentido: ele recebe o texto offline
//! e o resultado é marcado com `fallback = true`. Uma chamada que passa do
//! prazo conta como falha.
//!
//! As chamadas saem em paralelo (`JoinSet` limitado por `Semaphore`, como no
//! pipeline) e o resultado volta ordenado por posição e ranking.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::EnrichmentConfig;
use crate::error::{Result, WsdError};
use crate::inventory::SenseCandidate;
use crate::report::DisambiguationReport;
use crate::token::Pos;

const SYSTEM_PROMPT: &str = "Ești un expert lingvist specializat în limba română. \
Primești un cuvânt, partea sa de vorbire și un sens din dicționar. \
Scrie o explicație clară de 3-5 propoziții, în română, și apoi 2-3 propoziții exemplu. \
Formatează răspunsul exact așa:\n\
EXPLICAȚIE: [explicația]\n\
EXEMPLU 1: [propoziție]\n\
EXEMPLU 2: [propoziție]";

/// Texto gerado para um sentido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub explanation: String,
    pub examples: Vec<String>,
}

/// Enriquecimento de um sentido de uma ocorrência.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SenseEnrichment {
    pub position: usize,
    pub word: String,
    pub sense_id: String,
    /// Posição do sentido no ranking (0 = escolhido).
    pub rank: usize,
    #[serde(flatten)]
    pub content: Explanation,
    /// O texto veio do explicador offline por falha do principal.
    pub fallback: bool,
}

/// Gera explicações para um sentido.
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, word: &str, pos: Pos, sense: &SenseCandidate) -> Result<Explanation>;

    fn name(&self) -> &str;
}

/// Explicador determinístico baseado no próprio inventário.
#[derive(Debug, Clone, Default)]
pub struct OfflineExplainer;

impl OfflineExplainer {
    fn build(word: &str, sense: &SenseCandidate) -> Explanation {
        let explanation = if sense.gloss.trim().is_empty() {
            format!("Nu am putut genera o explicație pentru sensul cuvântului '{word}'.")
        } else {
            format!("În acest sens, „{word}” înseamnă: {}.", sense.gloss.trim().trim_end_matches('.'))
        };
        let examples = if sense.examples.is_empty() {
            vec![format!("Nu am putut genera exemple pentru sensul cuvântului '{word}'.")]
        } else {
            sense.examples.clone()
        };
        Explanation { explanation, examples }
    }
}

#[async_trait]
impl Explainer for OfflineExplainer {
    async fn explain(&self, word: &str, _pos: Pos, sense: &SenseCandidate) -> Result<Explanation> {
        Ok(Self::build(word, sense))
    }

    fn name(&self) -> &str {
        "offline"
    }
}

/// Explicador que consulta uma API de chat completions.
pub struct ChatExplainer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl ChatExplainer {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            timeout: EnrichmentConfig::default().timeout(),
        }
    }

    /// Prazo de cada chamada (conexão, resposta e corpo).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn failure(&self, message: String) -> WsdError {
        WsdError::Enrichment {
            provider: self.model.clone(),
            message,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatContent,
}

#[derive(Deserialize)]
struct ChatContent {
    content: String,
}

#[async_trait]
impl Explainer for ChatExplainer {
    async fn explain(&self, word: &str, pos: Pos, sense: &SenseCandidate) -> Result<Explanation> {
        let definition = if sense.gloss.trim().is_empty() {
            String::new()
        } else {
            format!(" Definiția din dicționar: {}", sense.gloss)
        };
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!("Cuvântul \"{word}\" ({pos}) cu ID-ul sensului: {}.{definition}", sense.id),
                },
            ],
        };

        let mut request = self.client.post(&self.endpoint).timeout(self.timeout).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.failure(format!("requisição falhou: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.failure(format!("API devolveu {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| self.failure(format!("resposta inválida: {e}")))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| self.failure("resposta sem escolhas".into()))?;

        debug!(word, sense = %sense.id, "Explicação recebida");
        parse_explanation(&content).ok_or_else(|| self.failure("resposta fora do formato esperado".into()))
    }

    fn name(&self) -> &str {
        &self.model
    }
}

fn explanation_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)EXPLICA[ȚŢT]I[EA]\s*(?:\d+\s*)?:\s*(.*?)\s*(?:EXEMPLU\s+\d+\s*:|\z)").expect("regex de explicação válida"))
}

fn example_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*EXEMPLU\s+\d+\s*:\s*(.+?)\s*$").expect("regex de exemplo válida"))
}

/// Extrai `EXPLICAȚIE:` e as linhas `EXEMPLU n:` da resposta do modelo.
///
/// `None` se não houver explicação.
pub fn parse_explanation(text: &str) -> Option<Explanation> {
    let explanation = explanation_regex()
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())?;

    let examples = example_regex()
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    Some(Explanation { explanation, examples })
}

/// Constrói o explicador configurado (offline se não houver endpoint).
pub fn explainer_from_config(config: &EnrichmentConfig) -> Arc<dyn Explainer> {
    match &config.endpoint {
        Some(endpoint) => {
            info!(endpoint = %endpoint, model = %config.model, "Enriquecimento via API de chat");
            Arc::new(
                ChatExplainer::new(endpoint.clone(), config.model.clone(), config.api_key.clone())
                    .with_timeout(config.timeout()),
            )
        }
        None => Arc::new(OfflineExplainer),
    }
}

/// Enriquece os `top_n` primeiros sentidos do ranking de cada ocorrência resolvida.
///
/// No máximo `concurrency_limit` chamadas ao explicador ficam em andamento ao
/// mesmo tempo. A saída é ordenada por `(position, rank)`.
///
/// Nunca falha: um erro do explicador vira texto offline para aquele sentido.
pub async fn enrich(
    report: &DisambiguationReport,
    explainer: &Arc<dyn Explainer>,
    top_n: usize,
    concurrency_limit: usize,
) -> Vec<SenseEnrichment> {
    let semaphore = Arc::new(Semaphore::new(concurrency_limit.max(1)));
    let mut set = JoinSet::new();

    for result in report.results() {
        for (rank, scored) in result.ranked.iter().take(top_n).enumerate() {
            let explainer = Arc::clone(explainer);
            let semaphore = Arc::clone(&semaphore);
            let word = result.surface.clone();
            let pos = result.pos;
            let position = result.position;
            let sense = scored.sense.clone();

            set.spawn(async move {
                let explained = match semaphore.acquire_owned().await {
                    Ok(_permit) => explainer.explain(&word, pos, &sense).await,
                    Err(_) => Err(WsdError::Enrichment {
                        provider: explainer.name().to_string(),
                        message: "limite de concorrência fechado".into(),
                    }),
                };
                let (content, fallback) = match explained {
                    Ok(content) => (content, false),
                    Err(err) => {
                        warn!(
                            explainer = explainer.name(),
                            word = %word,
                            sense = %sense.id,
                            error = %err,
                            "Falha no enriquecimento, usando texto offline"
                        );
                        (OfflineExplainer::build(&word, &sense), true)
                    }
                };
                SenseEnrichment {
                    position,
                    word,
                    sense_id: sense.id,
                    rank,
                    content,
                    fallback,
                }
            });
        }
    }

    let mut out = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(enrichment) => out.push(enrichment),
            Err(err) => warn!(error = %err, "Tarefa de enriquecimento falhou"),
        }
    }
    out.sort_by_key(|e| (e.position, e.rank));

    info!(senses = out.len(), explainer = explainer.name(), "Enriquecimento concluído");
    out
}
