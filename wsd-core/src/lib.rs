//! # wsd-core: Desambiguação do Sentido das Palavras (WSD) para o Romeno
//!
//! Este crate implementa um pipeline completo que, para cada palavra ambígua de
//! um texto, escolhe o sentido mais provável comparando o contexto com as
//! glosas do inventário num espaço vetorial.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui e é transformado passo a passo:
//!
//! 1.  **Anotação** ([`annotation`]): texto bruto → [`AnnotatedToken`] (lema, POS, MSD),
//!     via serviço Teprolin ou anotador local.
//! 2.  **Detecção** ([`detector`]): tokens com dois ou mais sentidos no
//!     [`inventory`] viram ocorrências ambíguas.
//! 3.  **Contexto** ([`context`]): janela de N tokens ou a sentença inteira.
//! 4.  **Vetorização** ([`embedding`]): contexto e glosas no mesmo espaço
//!     ([`hashing`] local ou [`openai`] remoto).
//! 5.  **Escolha** ([`engine`]): similaridade do cosseno, desempate pela ordem
//!     canônica, sinalização de baixa confiança.
//! 6.  **Agregação** ([`report`]): relatório ordenado por posição.
//!
//! Depois do relatório, [`recommend`] sugere sinônimos e [`enrichment`] gera
//! explicações para os sentidos escolhidos.
//!
//! ## Exemplo de Uso
//!
//! ```rust,no_run
//! use wsd_core::{WsdConfig, WsdPipeline};
//!
//! # async fn demo() -> wsd_core::Result<()> {
//! // 1. Configuração a partir do ambiente (WSD_*)
//! let config = WsdConfig::from_env()?;
//!
//! // 2. Pipeline com anotador, inventário e vetorizador configurados
//! let pipeline = WsdPipeline::from_config(&config)?;
//!
//! // 3. Desambigua
//! let report = pipeline.analyze("Stau pe o bancă în parc.").await?;
//! for result in report.results() {
//!     println!("{} → {} ({:.2})", result.surface, result.chosen.id, result.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod annotation;
pub mod config;
pub mod context;
pub mod corpus;
pub mod detector;
pub mod embedding;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod hashing;
pub mod inventory;
pub mod openai;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod token;
pub mod tokenizer;

pub use annotation::{Annotator, RuleAnnotator, ServiceHealth, TeprolinAnnotator};
pub use config::{ContextSpan, EmbeddingBackend, PosFilter, RetryPolicy, WsdConfig};
pub use detector::{AmbiguityDetector, AmbiguousOccurrence};
pub use embedding::{cosine_similarity, EmbeddingVector, Vectorizer};
pub use engine::{DisambiguationEngine, DisambiguationResult, ScoreStats, ScoredSense};
pub use enrichment::{enrich, Explainer, Explanation, SenseEnrichment};
pub use error::{Result, WsdError};
pub use hashing::HashingVectorizer;
pub use inventory::{SenseCandidate, SenseInventory, StaticInventory};
pub use pipeline::{PipelineEvent, WsdPipeline};
pub use recommend::{recommend, Recommendation};
pub use report::{aggregate, DisambiguationReport, SenseOutcome};
pub use token::{AnnotatedToken, Pos};
