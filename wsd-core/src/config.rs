//! # Configuração do Pipeline
//!
//! Todos os parâmetros reconhecidos pelo núcleo: janela de contexto, limiares de
//! confiança, filtro de classes gramaticais, backend de embeddings, limite de
//! concorrência e política de retentativas.
//!
//! A configuração é validada **uma vez**, na inicialização; valores inválidos
//! produzem [`WsdError::Configuration`] antes de qualquer texto ser processado.
//!
//! ```rust
//! use wsd_core::config::{ContextSpan, WsdConfig};
//!
//! let config = WsdConfig::builder()
//!     .context_span(ContextSpan::Sentence)
//!     .confidence_threshold(0.4)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.context_span, ContextSpan::Sentence);
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WsdError};
use crate::token::Pos;

/// Maior espera entre duas tentativas de embedding.
const MAX_BACKOFF: Duration = Duration::from_secs(10);

/// Extensão da janela de contexto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextSpan {
    /// N tokens à esquerda e N à direita da ocorrência.
    Tokens(usize),
    /// A sentença inteira que contém a ocorrência.
    Sentence,
}

impl Default for ContextSpan {
    fn default() -> Self {
        ContextSpan::Tokens(5)
    }
}

impl FromStr for ContextSpan {
    type Err = WsdError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("sentence") {
            return Ok(ContextSpan::Sentence);
        }
        s.parse::<usize>()
            .map(ContextSpan::Tokens)
            .map_err(|_| WsdError::Configuration(format!("janela de contexto inválida: '{s}' (use um inteiro ou 'sentence')")))
    }
}

/// Filtro de classes gramaticais para a detecção de ambiguidade.
///
/// Lista de permissão vazia significa "todas as classes". A lista de negação
/// sempre vence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosFilter {
    pub allow: Vec<Pos>,
    pub deny: Vec<Pos>,
}

impl Default for PosFilter {
    fn default() -> Self {
        Self {
            allow: Pos::CONTENT.to_vec(),
            deny: vec![],
        }
    }
}

impl PosFilter {
    /// Filtro que aceita todas as classes exceto pontuação.
    pub fn permissive() -> Self {
        Self {
            allow: vec![],
            deny: vec![Pos::Punctuation],
        }
    }

    pub fn accepts(&self, pos: Pos) -> bool {
        if self.deny.contains(&pos) {
            return false;
        }
        self.allow.is_empty() || self.allow.contains(&pos)
    }
}

/// Backend de vetorização.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum EmbeddingBackend {
    /// Vetorizador local e determinístico (feature hashing). Não depende de rede.
    Hashing { dimensions: usize },
    /// API de embeddings compatível com OpenAI (`/v1/embeddings`).
    OpenAi {
        endpoint: String,
        model: String,
        #[serde(default)]
        dimensions: Option<usize>,
        #[serde(default, skip_serializing)]
        api_key: Option<String>,
    },
}

impl Default for EmbeddingBackend {
    fn default() -> Self {
        EmbeddingBackend::Hashing { dimensions: 512 }
    }
}

impl EmbeddingBackend {
    /// Identificador do modelo, para logs e relatórios.
    pub fn model_id(&self) -> String {
        match self {
            EmbeddingBackend::Hashing { dimensions } => format!("hashing-{dimensions}"),
            EmbeddingBackend::OpenAi { model, .. } => model.clone(),
        }
    }
}

/// Política de retentativas para chamadas de embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Tentativas extras depois da primeira.
    pub max_retries: u32,
    /// Espera base; dobra a cada tentativa.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, backoff_ms: 200 }
    }
}

impl RetryPolicy {
    /// Espera antes da tentativa `attempt` (1 = primeira retentativa).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_ms.saturating_mul(factor)).min(MAX_BACKOFF)
    }
}

/// Colaborador de enriquecimento (explicações geradas).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Endpoint de chat completions; ausente = explicador offline.
    pub endpoint: Option<String>,
    pub model: String,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Quantos sentidos (do ranking) enriquecer por ocorrência.
    pub top_senses: usize,
    /// Prazo de cada chamada ao explicador; esgotado, o sentido recebe o texto offline.
    pub timeout_ms: u64,
    /// Máximo de chamadas ao explicador em paralelo.
    pub concurrency_limit: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "deepseek/deepseek-chat".to_string(),
            api_key: None,
            top_senses: 3,
            timeout_ms: 20_000,
            concurrency_limit: 4,
        }
    }
}

impl EnrichmentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Configuração completa do núcleo de desambiguação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WsdConfig {
    pub context_span: ContextSpan,
    /// Abaixo deste score o resultado é marcado como de baixa confiança.
    pub confidence_threshold: f64,
    /// Distância mínima entre o 1º e o 2º score para um resultado confiante.
    pub margin_threshold: f64,
    pub pos_filter: PosFilter,
    /// Ignora tokens marcados como entidade nomeada pelo anotador.
    pub skip_named_entities: bool,
    pub embedding: EmbeddingBackend,
    /// Máximo de ocorrências desambiguadas em paralelo.
    pub concurrency_limit: usize,
    pub retry: RetryPolicy,
    /// URL do serviço Teprolin; ausente = anotador offline.
    pub teprolin_url: Option<String>,
    /// Arquivo JSON do inventário; ausente = inventário embutido.
    pub inventory_path: Option<PathBuf>,
    /// Prazo de uma requisição inteira (anotação e desambiguação).
    pub request_timeout_ms: u64,
    pub enrichment: EnrichmentConfig,
}

impl Default for WsdConfig {
    fn default() -> Self {
        Self {
            context_span: ContextSpan::default(),
            confidence_threshold: 0.30,
            margin_threshold: 0.02,
            pos_filter: PosFilter::default(),
            skip_named_entities: true,
            embedding: EmbeddingBackend::default(),
            concurrency_limit: 4,
            retry: RetryPolicy::default(),
            teprolin_url: None,
            inventory_path: None,
            request_timeout_ms: 30_000,
            enrichment: EnrichmentConfig::default(),
        }
    }
}

impl WsdConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Cria um builder a partir dos valores padrão.
    pub fn builder() -> WsdConfigBuilder {
        WsdConfigBuilder::default()
    }

    /// Lê a configuração das variáveis de ambiente `WSD_*` (carregando `.env`, se existir).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lê a configuração a partir de uma função de busca chave → valor.
    ///
    /// Separado de [`from_env`](Self::from_env) para que os testes não
    /// dependam do ambiente do processo.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut builder = WsdConfig::builder();

        if let Some(span) = get("WSD_CONTEXT_WINDOW") {
            builder = builder.context_span(span.parse()?);
        }
        if let Some(v) = parse_opt::<f64>("WSD_CONFIDENCE_THRESHOLD", get("WSD_CONFIDENCE_THRESHOLD"))? {
            builder = builder.confidence_threshold(v);
        }
        if let Some(v) = parse_opt::<f64>("WSD_MARGIN_THRESHOLD", get("WSD_MARGIN_THRESHOLD"))? {
            builder = builder.margin_threshold(v);
        }
        let allow = get("WSD_POS_ALLOW").map(|list| parse_pos_list(&list)).transpose()?;
        let deny = get("WSD_POS_DENY").map(|list| parse_pos_list(&list)).transpose()?;
        match (allow, deny) {
            (Some(allow), deny) => {
                builder = builder.pos_allow(allow);
                if let Some(deny) = deny {
                    builder = builder.pos_deny(deny);
                }
            }
            // só negação: as classes negadas saem da permissão padrão
            (None, Some(deny)) => {
                let allow = Pos::CONTENT.iter().copied().filter(|p| !deny.contains(p)).collect();
                builder = builder.pos_allow(allow).pos_deny(deny);
            }
            (None, None) => {}
        }
        if let Some(v) = get("WSD_SKIP_NAMED_ENTITIES") {
            builder = builder.skip_named_entities(parse_bool("WSD_SKIP_NAMED_ENTITIES", &v)?);
        }
        if let Some(v) = parse_opt::<usize>("WSD_CONCURRENCY_LIMIT", get("WSD_CONCURRENCY_LIMIT"))? {
            builder = builder.concurrency_limit(v);
        }
        if let Some(v) = parse_opt::<u32>("WSD_MAX_RETRIES", get("WSD_MAX_RETRIES"))? {
            builder = builder.max_retries(v);
        }
        if let Some(v) = parse_opt::<u64>("WSD_RETRY_BACKOFF_MS", get("WSD_RETRY_BACKOFF_MS"))? {
            builder = builder.retry_backoff_ms(v);
        }
        if let Some(url) = get("WSD_TEPROLIN_URL") {
            builder = builder.teprolin_url(url);
        }
        if let Some(path) = get("WSD_INVENTORY_PATH") {
            builder = builder.inventory_path(path);
        }
        if let Some(ms) = parse_opt::<u64>("WSD_REQUEST_TIMEOUT_MS", get("WSD_REQUEST_TIMEOUT_MS"))? {
            builder = builder.request_timeout_ms(ms);
        }

        let dimensions = parse_opt::<usize>("WSD_EMBEDDING_DIMENSIONS", get("WSD_EMBEDDING_DIMENSIONS"))?;
        let backend = get("WSD_EMBEDDING_BACKEND").unwrap_or_else(|| "hashing".to_string());
        let embedding = match backend.to_lowercase().as_str() {
            "hashing" => EmbeddingBackend::Hashing {
                dimensions: dimensions.unwrap_or(512),
            },
            "openai" => EmbeddingBackend::OpenAi {
                endpoint: get("WSD_EMBEDDING_ENDPOINT")
                    .unwrap_or_else(|| "https://api.openai.com/v1/embeddings".to_string()),
                model: get("WSD_EMBEDDING_MODEL").unwrap_or_else(|| "text-embedding-3-small".to_string()),
                dimensions,
                api_key: get("WSD_EMBEDDING_API_KEY").or_else(|| get("OPENAI_API_KEY")),
            },
            other => {
                return Err(WsdError::Configuration(format!(
                    "WSD_EMBEDDING_BACKEND desconhecido: '{other}' (use 'hashing' ou 'openai')"
                )))
            }
        };
        builder = builder.embedding(embedding);

        let mut enrichment = EnrichmentConfig {
            endpoint: get("WSD_ENRICHMENT_ENDPOINT"),
            api_key: get("WSD_ENRICHMENT_API_KEY"),
            ..EnrichmentConfig::default()
        };
        if let Some(model) = get("WSD_ENRICHMENT_MODEL") {
            enrichment.model = model;
        }
        if let Some(n) = parse_opt::<usize>("WSD_ENRICHMENT_TOP_SENSES", get("WSD_ENRICHMENT_TOP_SENSES"))? {
            enrichment.top_senses = n;
        }
        if let Some(ms) = parse_opt::<u64>("WSD_ENRICHMENT_TIMEOUT_MS", get("WSD_ENRICHMENT_TIMEOUT_MS"))? {
            enrichment.timeout_ms = ms;
        }
        if let Some(n) = parse_opt::<usize>("WSD_ENRICHMENT_CONCURRENCY", get("WSD_ENRICHMENT_CONCURRENCY"))? {
            enrichment.concurrency_limit = n;
        }
        builder = builder.enrichment(enrichment);

        builder.build()
    }
}

fn parse_opt<T: FromStr>(key: &str, value: Option<String>) -> Result<Option<T>> {
    value
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| WsdError::Configuration(format!("{key}: valor inválido '{v}'")))
        })
        .transpose()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "da" => Ok(true),
        "0" | "false" | "f" | "no" | "nu" => Ok(false),
        _ => Err(WsdError::Configuration(format!("{key}: booleano inválido '{value}'"))),
    }
}

/// Converte "noun, verb,ADJ" em classes; nomes desconhecidos são erro.
fn parse_pos_list(list: &str) -> Result<Vec<Pos>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            Pos::from_name(name)
                .ok_or_else(|| WsdError::Configuration(format!("classe gramatical desconhecida: '{name}'")))
        })
        .collect()
}

/// Builder que valida a [`WsdConfig`].
#[derive(Debug, Clone, Default)]
pub struct WsdConfigBuilder {
    config: WsdConfig,
}

impl WsdConfigBuilder {
    pub fn context_span(mut self, span: ContextSpan) -> Self {
        self.config.context_span = span;
        self
    }

    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.config.confidence_threshold = threshold;
        self
    }

    pub fn margin_threshold(mut self, margin: f64) -> Self {
        self.config.margin_threshold = margin;
        self
    }

    pub fn pos_allow(mut self, allow: Vec<Pos>) -> Self {
        self.config.pos_filter.allow = allow;
        self
    }

    pub fn pos_deny(mut self, deny: Vec<Pos>) -> Self {
        self.config.pos_filter.deny = deny;
        self
    }

    pub fn skip_named_entities(mut self, skip: bool) -> Self {
        self.config.skip_named_entities = skip;
        self
    }

    pub fn embedding(mut self, backend: EmbeddingBackend) -> Self {
        self.config.embedding = backend;
        self
    }

    pub fn concurrency_limit(mut self, limit: usize) -> Self {
        self.config.concurrency_limit = limit;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry.backoff_ms = ms;
        self
    }

    pub fn teprolin_url(mut self, url: impl Into<String>) -> Self {
        self.config.teprolin_url = Some(url.into());
        self
    }

    pub fn inventory_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.inventory_path = Some(path.into());
        self
    }

    pub fn request_timeout_ms(mut self, ms: u64) -> Self {
        self.config.request_timeout_ms = ms;
        self
    }

    pub fn enrichment(mut self, enrichment: EnrichmentConfig) -> Self {
        self.config.enrichment = enrichment;
        self
    }

    /// Valida e devolve a configuração.
    ///
    /// # Errors
    ///
    /// [`WsdError::Configuration`] se:
    /// - `confidence_threshold` fora de `[0, 1]`
    /// - `margin_threshold` negativo ou não finito
    /// - janela de `0` tokens
    /// - `concurrency_limit == 0` (do pipeline ou do enriquecimento)
    /// - prazo de requisição ou de enriquecimento igual a zero
    /// - uma classe aparece tanto na permissão quanto na negação
    /// - vetorizador hashing com menos de 8 dimensões
    pub fn build(self) -> Result<WsdConfig> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.confidence_threshold) {
            return Err(WsdError::Configuration(format!(
                "confidence_threshold ({}) deve estar em [0, 1]",
                c.confidence_threshold
            )));
        }
        if !c.margin_threshold.is_finite() || c.margin_threshold < 0.0 {
            return Err(WsdError::Configuration(format!(
                "margin_threshold ({}) deve ser finito e >= 0",
                c.margin_threshold
            )));
        }
        if c.context_span == ContextSpan::Tokens(0) {
            return Err(WsdError::Configuration("a janela de contexto deve ter ao menos 1 token".to_string()));
        }
        if c.concurrency_limit == 0 {
            return Err(WsdError::Configuration("concurrency_limit deve ser maior que zero".to_string()));
        }
        if c.request_timeout_ms == 0 || c.enrichment.timeout_ms == 0 {
            return Err(WsdError::Configuration("os prazos devem ser maiores que zero".to_string()));
        }
        if c.enrichment.concurrency_limit == 0 {
            return Err(WsdError::Configuration(
                "o limite de concorrência do enriquecimento deve ser maior que zero".to_string(),
            ));
        }
        if let Some(pos) = c.pos_filter.allow.iter().find(|p| c.pos_filter.deny.contains(p)) {
            return Err(WsdError::Configuration(format!(
                "a classe {pos} está na lista de permissão e na de negação"
            )));
        }
        if let EmbeddingBackend::Hashing { dimensions } = c.embedding {
            if dimensions < 8 {
                return Err(WsdError::Configuration(format!(
                    "o vetorizador hashing precisa de ao menos 8 dimensões (recebido {dimensions})"
                )));
            }
        }
        Ok(self.config)
    }
}
