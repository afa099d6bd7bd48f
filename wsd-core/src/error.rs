//! # Erros do pipeline de desambiguação
//!
//! Apenas falhas de pré-requisitos compartilhados (anotação, carga do inventário,
//! configuração) abortam um documento inteiro. Falhas locais a uma ocorrência
//! (`EmbeddingFailure`) viram marcadores `unresolved` no relatório.
//!
//! Lema desconhecido e vetor nulo **não** são erros: são valores normais
//! (conjunto de candidatos vazio, similaridade mínima).

use thiserror::Error;

/// Erros que podem ocorrer ao desambiguar um texto.
#[derive(Debug, Error)]
pub enum WsdError {
    /// O serviço externo de anotação (Teprolin) está inacessível ou respondeu com erro.
    #[error("Serviço de anotação indisponível ({service}): {message}")]
    AnnotationUnavailable {
        /// Nome do serviço que falhou.
        service: String,
        /// Descrição da falha.
        message: String,
    },

    /// Falha (transitória) ao vetorizar um contexto ou uma glosa.
    #[error("Falha de embedding ({provider}): {message}")]
    EmbeddingFailure {
        /// Provedor de embeddings que falhou.
        provider: String,
        /// Descrição da falha.
        message: String,
    },

    /// Configuração inválida detectada na inicialização.
    #[error("Erro de configuração: {0}")]
    Configuration(String),

    /// O inventário de sentidos não pôde ser carregado.
    #[error("Falha ao carregar o inventário de sentidos: {0}")]
    InventoryLoad(String),

    /// O colaborador de enriquecimento (geração de explicações) falhou.
    #[error("Falha de enriquecimento ({provider}): {message}")]
    Enrichment {
        /// Provedor de geração de texto.
        provider: String,
        /// Descrição da falha.
        message: String,
    },

    /// O documento foi cancelado (prazo do chamador expirou).
    #[error("Processamento cancelado")]
    Cancelled,
}

impl WsdError {
    /// Indica se o erro aborta o documento inteiro.
    ///
    /// `EmbeddingFailure` é local a uma ocorrência e `Enrichment` a um sentido
    /// enriquecido; todo o resto é fatal. O motor não repete erros fatais e o
    /// pipeline aborta o documento quando uma ocorrência devolve um deles.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, WsdError::EmbeddingFailure { .. } | WsdError::Enrichment { .. })
    }
}

/// Alias de resultado usado em todo o crate.
pub type Result<T> = std::result::Result<T, WsdError>;
