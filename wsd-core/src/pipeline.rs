//! # Pipeline WSD: Orquestrador com Eventos Observáveis
//!
//! O pipeline coordena todos os estágios (anotação, detecção, contexto,
//! vetorização, escolha do sentido, agregação) e pode emitir eventos em cada
//! passo via um canal `tokio::sync::mpsc`, permitindo que o servidor WebSocket
//! transmita o progresso em tempo real para o cliente.
//!
//! ## Concorrência
//!
//! Um documento por chamada. As ocorrências ambíguas são desambiguadas em
//! paralelo (`JoinSet`), limitadas por um `Semaphore` com `concurrency_limit`
//! permissões. Cada tarefa devolve `(posição, resultado)`; o relatório é
//! remontado por posição, então a ordem de término não importa.
//!
//! ## Cancelamento
//!
//! [`WsdPipeline::analyze_until`] corre a análise contra um futuro de
//! cancelamento. Se o cancelamento vence, o `JoinSet` é descartado (o que aborta
//! todas as tarefas em andamento) e a chamada devolve [`WsdError::Cancelled`],
//! nunca um relatório parcial.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::annotation::{Annotator, RuleAnnotator, TeprolinAnnotator};
use crate::config::{ContextSpan, EmbeddingBackend, WsdConfig};
use crate::context::{self, ContextWindow};
use crate::detector::{AmbiguityDetector, AmbiguousOccurrence};
use crate::embedding::Vectorizer;
use crate::engine::{DisambiguationEngine, DisambiguationResult};
use crate::error::{Result, WsdError};
use crate::hashing::HashingVectorizer;
use crate::inventory::{SenseCandidate, SenseInventory, StaticInventory};
use crate::openai::OpenAiVectorizer;
use crate::report::{aggregate, DisambiguationReport, ReportSummary, SenseOutcome};
use crate::token::{reindex, AnnotatedToken, Pos};

/// Resumo de uma ocorrência ambígua, para os eventos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceInfo {
    pub position: usize,
    pub surface: String,
    pub lemma: String,
    pub pos: Pos,
    pub candidates: usize,
}

/// Eventos emitidos pelo pipeline durante o processamento.
///
/// Permitem que a UI mostre o andamento passo a passo.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: texto anotado.
    AnnotationDone { tokens: Vec<AnnotatedToken>, total: usize },
    /// **Passo 2**: ocorrências ambíguas encontradas.
    AmbiguityDetected { occurrences: Vec<OccurrenceInfo>, total: usize },
    /// **Passo 3**: uma ocorrência foi resolvida (chega na ordem de término).
    SenseScored { result: Box<DisambiguationResult> },
    /// Uma ocorrência não pôde ser resolvida; o documento continua.
    OccurrenceUnresolved { position: usize, surface: String, reason: String },
    /// **Conclusão**.
    Done { summary: ReportSummary, model: String, processing_ms: u64 },
    /// **Falha**: erro que abortou o documento.
    Error { message: String },
}

type EventSink<'a> = Option<&'a mpsc::UnboundedSender<PipelineEvent>>;

fn emit(events: EventSink<'_>, event: PipelineEvent) {
    if let Some(tx) = events {
        // receptor descartado não interrompe a análise
        let _ = tx.send(event);
    }
}

/// Trabalho de uma ocorrência, já desacoplado do empréstimo dos tokens.
struct Job {
    position: usize,
    candidates: Arc<[SenseCandidate]>,
    window: ContextWindow,
}

/// O pipeline de desambiguação.
///
/// Colaboradores compartilhados (inventário, vetorizador, anotador) são
/// handles `Arc` somente leitura: clonar o pipeline é barato.
#[derive(Clone)]
pub struct WsdPipeline {
    annotator: Arc<dyn Annotator>,
    inventory: Arc<dyn SenseInventory>,
    engine: Arc<DisambiguationEngine>,
    detector: AmbiguityDetector,
    context_span: ContextSpan,
    concurrency_limit: usize,
}

impl WsdPipeline {
    /// Monta o pipeline com os parâmetros padrão de [`WsdConfig`].
    pub fn new(
        annotator: Arc<dyn Annotator>,
        inventory: Arc<dyn SenseInventory>,
        vectorizer: Arc<dyn Vectorizer>,
    ) -> Self {
        let config = WsdConfig::default();
        Self::with_parts(annotator, inventory, vectorizer, &config)
    }

    /// Monta o pipeline a partir de colaboradores já construídos e da configuração.
    pub fn with_parts(
        annotator: Arc<dyn Annotator>,
        inventory: Arc<dyn SenseInventory>,
        vectorizer: Arc<dyn Vectorizer>,
        config: &WsdConfig,
    ) -> Self {
        Self {
            annotator,
            inventory,
            engine: Arc::new(DisambiguationEngine::from_config(vectorizer, config)),
            detector: AmbiguityDetector::from_config(config),
            context_span: config.context_span,
            concurrency_limit: config.concurrency_limit.max(1),
        }
    }

    /// Constrói todos os colaboradores a partir da configuração.
    ///
    /// # Errors
    ///
    /// `InventoryLoad` se o arquivo do inventário não puder ser lido;
    /// `Configuration` para um backend de embeddings inválido.
    pub fn from_config(config: &WsdConfig) -> Result<Self> {
        let annotator = build_annotator(config)?;
        let inventory = build_inventory(config)?;
        let vectorizer = build_vectorizer(&config.embedding)?;

        info!(
            annotator = annotator.name(),
            model = vectorizer.model_id(),
            context = ?config.context_span,
            concurrency = config.concurrency_limit,
            "Pipeline WSD pronto"
        );
        Ok(Self::with_parts(annotator, inventory, vectorizer, config))
    }

    pub fn with_engine(mut self, engine: DisambiguationEngine) -> Self {
        self.engine = Arc::new(engine);
        self
    }

    pub fn with_detector(mut self, detector: AmbiguityDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_context_span(mut self, span: ContextSpan) -> Self {
        self.context_span = span;
        self
    }

    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit.max(1);
        self
    }

    pub fn annotator(&self) -> &Arc<dyn Annotator> {
        &self.annotator
    }

    pub fn inventory(&self) -> &Arc<dyn SenseInventory> {
        &self.inventory
    }

    /// Identificador do modelo de embeddings em uso.
    pub fn model_id(&self) -> &str {
        self.engine.vectorizer().model_id()
    }

    /// Anota e desambigua `text`.
    ///
    /// Texto vazio produz um relatório vazio.
    ///
    /// # Errors
    ///
    /// Só falhas compartilhadas abortam: `AnnotationUnavailable` do anotador ou
    /// um erro fatal do vetorizador (ver [`WsdError::is_fatal`]). Falhas de
    /// embedding viram ocorrências `unresolved` no relatório.
    pub async fn analyze(&self, text: &str) -> Result<DisambiguationReport> {
        self.run_text(text, None).await
    }

    /// Desambigua tokens já anotados (sem passar pelo anotador).
    ///
    /// As posições são renumeradas `0..n` na ordem recebida.
    pub async fn analyze_tokens(&self, tokens: Vec<AnnotatedToken>) -> Result<DisambiguationReport> {
        self.run(tokens, Instant::now(), None).await
    }

    /// Como [`analyze`](Self::analyze), emitindo [`PipelineEvent`]s em `tx`.
    ///
    /// O último evento é sempre `Done` ou `Error`.
    pub async fn analyze_streaming(
        &self,
        text: &str,
        tx: mpsc::UnboundedSender<PipelineEvent>,
    ) -> Result<DisambiguationReport> {
        let result = self.run_text(text, Some(&tx)).await;
        if let Err(err) = &result {
            emit(Some(&tx), PipelineEvent::Error { message: err.to_string() });
        }
        result
    }

    /// Corre a análise até `cancel` completar.
    ///
    /// # Errors
    ///
    /// [`WsdError::Cancelled`] se `cancel` terminar antes; as tarefas em
    /// andamento são abortadas.
    pub async fn analyze_until<F>(&self, text: &str, cancel: F) -> Result<DisambiguationReport>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                warn!("Análise cancelada pelo chamador");
                Err(WsdError::Cancelled)
            }
            result = self.analyze(text) => result,
        }
    }

    /// Cancela a análise se ela passar de `timeout`.
    pub async fn analyze_with_timeout(&self, text: &str, timeout: Duration) -> Result<DisambiguationReport> {
        self.analyze_until(text, tokio::time::sleep(timeout)).await
    }

    async fn run_text(&self, text: &str, events: EventSink<'_>) -> Result<DisambiguationReport> {
        let start = Instant::now();
        let tokens = self.annotator.annotate(text).await?;
        self.run(tokens, start, events).await
    }

    async fn run(
        &self,
        mut tokens: Vec<AnnotatedToken>,
        start: Instant,
        events: EventSink<'_>,
    ) -> Result<DisambiguationReport> {
        reindex(&mut tokens);
        emit(
            events,
            PipelineEvent::AnnotationDone {
                tokens: tokens.clone(),
                total: tokens.len(),
            },
        );

        let jobs = self.plan(&tokens, events);
        let total_jobs = jobs.len();

        let tokens = Arc::new(tokens);
        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut set = JoinSet::new();

        // Cada slot começa como não resolvido: uma tarefa que entre em pânico
        // deixa a sua ocorrência marcada em vez de sumir do relatório.
        let mut slots: BTreeMap<usize, SenseOutcome> = jobs
            .iter()
            .map(|job| {
                (
                    job.position,
                    SenseOutcome::Unresolved {
                        reason: "tarefa interrompida".into(),
                    },
                )
            })
            .collect();

        for job in jobs {
            let engine = Arc::clone(&self.engine);
            let tokens = Arc::clone(&tokens);
            let semaphore = Arc::clone(&semaphore);

            set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return (
                        job.position,
                        Ok(SenseOutcome::Unresolved {
                            reason: "limite de concorrência fechado".into(),
                        }),
                    );
                };
                let occurrence = AmbiguousOccurrence {
                    token: &tokens[job.position],
                    candidates: job.candidates,
                };
                let outcome = match engine.disambiguate(&occurrence, &job.window).await {
                    Ok(result) => Ok(SenseOutcome::Resolved(result)),
                    Err(err) if err.is_fatal() => Err(err),
                    Err(err) => Ok(SenseOutcome::Unresolved { reason: err.to_string() }),
                };
                (job.position, outcome)
            });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((position, Err(err))) => {
                    // descartar o JoinSet aborta as ocorrências restantes
                    error!(position, error = %err, "Erro fatal, abortando o documento");
                    return Err(err);
                }
                Ok((position, Ok(outcome))) => {
                    match &outcome {
                        SenseOutcome::Resolved(result) => emit(
                            events,
                            PipelineEvent::SenseScored {
                                result: Box::new(result.clone()),
                            },
                        ),
                        SenseOutcome::Unresolved { reason } => {
                            warn!(position, reason = %reason, "Ocorrência não resolvida");
                            emit(
                                events,
                                PipelineEvent::OccurrenceUnresolved {
                                    position,
                                    surface: tokens[position].surface.clone(),
                                    reason: reason.clone(),
                                },
                            );
                        }
                        SenseOutcome::NotAmbiguous => {}
                    }
                    slots.insert(position, outcome);
                }
                Err(err) => warn!(error = %err, "Tarefa de desambiguação falhou"),
            }
        }

        // todas as tarefas terminaram: as cópias do Arc já foram descartadas
        let tokens = Arc::try_unwrap(tokens).unwrap_or_else(|shared| shared.as_ref().clone());
        let mut report = aggregate(tokens, slots);
        report.model = self.model_id().to_string();
        report.processing_ms = start.elapsed().as_millis() as u64;

        info!(
            tokens = report.summary.total_tokens,
            ambiguous = total_jobs,
            resolved = report.summary.resolved,
            unresolved = report.summary.unresolved,
            low_confidence = report.summary.low_confidence,
            elapsed_ms = report.processing_ms,
            "Documento desambiguado"
        );
        emit(
            events,
            PipelineEvent::Done {
                summary: report.summary,
                model: report.model.clone(),
                processing_ms: report.processing_ms,
            },
        );
        Ok(report)
    }

    /// Detecta as ocorrências e extrai as janelas de contexto.
    fn plan(&self, tokens: &[AnnotatedToken], events: EventSink<'_>) -> Vec<Job> {
        let occurrences = self.detector.detect(tokens, self.inventory.as_ref());
        debug!(count = occurrences.len(), "Ocorrências ambíguas detectadas");

        emit(
            events,
            PipelineEvent::AmbiguityDetected {
                occurrences: occurrences
                    .iter()
                    .map(|o| OccurrenceInfo {
                        position: o.position(),
                        surface: o.token.surface.clone(),
                        lemma: o.token.lemma.clone(),
                        pos: o.token.pos,
                        candidates: o.candidates.len(),
                    })
                    .collect(),
                total: occurrences.len(),
            },
        );

        occurrences
            .iter()
            .map(|occurrence| Job {
                position: occurrence.position(),
                candidates: Arc::clone(&occurrence.candidates),
                window: context::extract(occurrence, tokens, self.context_span),
            })
            .collect()
    }
}

/// Teprolin se houver URL configurada, senão o anotador local.
pub fn build_annotator(config: &WsdConfig) -> Result<Arc<dyn Annotator>> {
    match &config.teprolin_url {
        Some(url) => Ok(Arc::new(TeprolinAnnotator::new(url.clone())?)),
        None => Ok(Arc::new(RuleAnnotator::new())),
    }
}

/// Inventário do arquivo configurado ou o embutido.
pub fn build_inventory(config: &WsdConfig) -> Result<Arc<dyn SenseInventory>> {
    match &config.inventory_path {
        Some(path) => Ok(Arc::new(StaticInventory::from_path(path)?)),
        None => Ok(Arc::new(StaticInventory::builtin())),
    }
}

pub fn build_vectorizer(backend: &EmbeddingBackend) -> Result<Arc<dyn Vectorizer>> {
    match backend {
        EmbeddingBackend::Hashing { dimensions } => Ok(Arc::new(HashingVectorizer::new(*dimensions))),
        EmbeddingBackend::OpenAi {
            endpoint,
            model,
            dimensions,
            api_key,
        } => {
            let mut vectorizer = OpenAiVectorizer::new(endpoint.clone(), api_key.clone())?.with_model(model.clone());
            if let Some(dims) = dimensions {
                vectorizer = vectorizer.with_dimensions(*dims);
            }
            Ok(Arc::new(vectorizer))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::embedding::EmbeddingVector;

    fn builtin_pipeline() -> WsdPipeline {
        WsdPipeline::from_config(&WsdConfig::default()).unwrap()
    }

    /// Um eixo por palavra-chave; falha para textos que contêm "quebrado",
    /// falha de forma fatal para "revogada" e dorme `delay` antes de responder.
    struct ScriptedVectorizer {
        axes: Vec<&'static str>,
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedVectorizer {
        fn new(axes: Vec<&'static str>) -> Self {
            Self {
                axes,
                delay: Duration::ZERO,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    struct InFlight<'a>(&'a AtomicUsize);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Vectorizer for ScriptedVectorizer {
        async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            {
                // decrementa também quando a tarefa é abortada no meio da espera
                let _guard = InFlight(&self.in_flight);
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
            }

            if text.contains("revogada") {
                return Err(WsdError::Configuration("chave de API revogada".into()));
            }

            if text.contains("quebrado") {
                return Err(WsdError::EmbeddingFailure {
                    provider: "script".into(),
                    message: "falha simulada".into(),
                });
            }
            if text.trim().is_empty() {
                return Ok(EmbeddingVector::null(self.axes.len()));
            }
            Ok(EmbeddingVector::new(
                self.axes.iter().map(|a| if text.contains(a) { 1.0 } else { 0.0 }).collect(),
            ))
        }

        fn dimensions(&self) -> usize {
            self.axes.len()
        }

        fn model_id(&self) -> &str {
            "script"
        }
    }

    fn scripted_inventory() -> StaticInventory {
        let mut inv = StaticInventory::new();
        inv.insert(
            "bancă",
            Pos::Noun,
            vec![SenseCandidate::new("bani", "bani credit"), SenseCandidate::new("scaun", "scaun parc")],
        );
        inv.insert(
            "cal",
            Pos::Noun,
            vec![SenseCandidate::new("animal", "animal câmp"), SenseCandidate::new("aparat", "quebrado")],
        );
        inv.insert(
            "lac",
            Pos::Noun,
            vec![SenseCandidate::new("apă", "apă"), SenseCandidate::new("vopsea", "revogada")],
        );
        inv
    }

    fn scripted_pipeline(vectorizer: ScriptedVectorizer) -> (WsdPipeline, Arc<ScriptedVectorizer>) {
        let vectorizer = Arc::new(vectorizer);
        let config = WsdConfig::builder()
            .max_retries(1)
            .retry_backoff_ms(10)
            .concurrency_limit(2)
            .build()
            .unwrap();
        let pipeline = WsdPipeline::with_parts(
            Arc::new(RuleAnnotator::new()),
            Arc::new(scripted_inventory()),
            Arc::clone(&vectorizer) as Arc<dyn Vectorizer>,
            &config,
        );
        (pipeline, vectorizer)
    }

    #[tokio::test]
    async fn test_empty_text_gives_empty_report() {
        let report = builtin_pipeline().analyze("").await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.summary, ReportSummary::default());
    }

    #[tokio::test]
    async fn test_bench_context_picks_bench_sense() {
        let report = builtin_pipeline()
            .analyze("Copiii stau pe o bancă în parc după școală.")
            .await
            .unwrap();
        let results: Vec<_> = report.results().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chosen.id, "bancă.n.02");
        assert_eq!(results[0].position, 4);
        assert!(!results[0].low_confidence);
        assert_eq!(report.model, "hashing-512");
    }

    #[tokio::test]
    async fn test_money_context_picks_institution_sense() {
        let report = builtin_pipeline()
            .analyze("Am depus bani la bancă și am primit credite.")
            .await
            .unwrap();
        let chosen: Vec<&str> = report.results().map(|r| r.chosen.id.as_str()).collect();
        assert_eq!(chosen, vec!["bancă.n.01"]);
    }

    #[tokio::test]
    async fn test_positions_match_indices() {
        let report = builtin_pipeline()
            .analyze("Calul aleargă pe câmp. La sala de sport, gimnastul a sărit peste cal.")
            .await
            .unwrap();
        for (i, t) in report.tokens.iter().enumerate() {
            assert_eq!(t.position, i);
            assert_eq!(t.token.position, i);
        }
        assert_eq!(report.summary.ambiguous, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_gloss_leaves_only_that_occurrence_unresolved() {
        let (pipeline, _) = scripted_pipeline(ScriptedVectorizer::new(vec!["bani", "scaun", "parc", "animal"]));
        let report = pipeline.analyze("Stau pe bancă în parc. Un cal pe câmp.").await.unwrap();

        let resolved: Vec<&str> = report.results().map(|r| r.chosen.id.as_str()).collect();
        assert_eq!(resolved, vec!["scaun"]);

        let unresolved: Vec<&str> = report.unresolved().map(|(t, _)| t.token.surface.as_str()).collect();
        assert_eq!(unresolved, vec!["cal"]);
        assert_eq!(report.summary.unresolved, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_limit_respected() {
        let vectorizer = ScriptedVectorizer::new(vec!["bani", "scaun"]).with_delay(Duration::from_millis(50));
        let (pipeline, vectorizer) = scripted_pipeline(vectorizer);
        let text = "bancă bancă bancă bancă bancă bancă";
        let report = pipeline.analyze(text).await.unwrap();

        assert_eq!(report.summary.resolved, 6);
        assert!(vectorizer.peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_cancels_without_partial_report() {
        let vectorizer = ScriptedVectorizer::new(vec!["bani", "scaun"]).with_delay(Duration::from_secs(10));
        let (pipeline, vectorizer) = scripted_pipeline(vectorizer);
        let err = pipeline
            .analyze_with_timeout("Stau pe bancă.", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, WsdError::Cancelled));

        // a ocorrência chegou ao vetorizador e foi abortada junto com o documento
        assert_eq!(vectorizer.peak.load(Ordering::SeqCst), 1);
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert_eq!(vectorizer.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_vectorizer_error_aborts_document() {
        let (pipeline, _) = scripted_pipeline(ScriptedVectorizer::new(vec!["apă", "bani"]));
        let err = pipeline.analyze("Un lac.").await.unwrap_err();
        assert!(matches!(err, WsdError::Configuration(_)));

        // erro local continua marcando só a ocorrência
        let report = pipeline.analyze("Un cal.").await.unwrap();
        assert_eq!(report.summary.unresolved, 1);
    }

    #[tokio::test]
    async fn test_analyze_until_completes_when_not_cancelled() {
        let report = builtin_pipeline()
            .analyze_until("Un cal alb.", std::future::pending())
            .await
            .unwrap();
        assert_eq!(report.len(), 4);
    }

    #[tokio::test]
    async fn test_analyze_tokens_renumbers_positions() {
        let tokens = vec![
            AnnotatedToken::new("Banca", "bancă", Pos::Noun, 7),
            AnnotatedToken::new("dă", "da", Pos::Verb, 3),
            AnnotatedToken::new("credite", "credit", Pos::Noun, 1),
        ];
        let report = builtin_pipeline().analyze_tokens(tokens).await.unwrap();
        let positions: Vec<usize> = report.tokens.iter().map(|t| t.token.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
        assert_eq!(report.results().next().map(|r| r.position), Some(0));
    }

    #[tokio::test]
    async fn test_streaming_events_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        builtin_pipeline()
            .analyze_streaming("Leul doarme în savana din Africa.", tx)
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events.first(), Some(PipelineEvent::AnnotationDone { .. })));
        assert!(matches!(events.get(1), Some(PipelineEvent::AmbiguityDetected { total: 1, .. })));
        assert!(events.iter().any(|e| matches!(e, PipelineEvent::SenseScored { .. })));
        assert!(matches!(events.last(), Some(PipelineEvent::Done { .. })));
    }

    #[tokio::test]
    async fn test_annotation_failure_aborts_and_emits_error() {
        let config = WsdConfig::builder().teprolin_url("http://127.0.0.1:1").build().unwrap();
        let pipeline = WsdPipeline::from_config(&config).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let err = pipeline.analyze_streaming("Banca e închisă.", tx).await.unwrap_err();
        assert!(matches!(err, WsdError::AnnotationUnavailable { .. }));
        assert!(matches!(rx.try_recv(), Ok(PipelineEvent::Error { .. })));
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = PipelineEvent::OccurrenceUnresolved {
            position: 2,
            surface: "cal".into(),
            reason: "x".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "OccurrenceUnresolved");
        assert_eq!(json["data"]["position"], 2);
    }

    #[test]
    fn test_build_vectorizer_from_backend() {
        let hashing = build_vectorizer(&EmbeddingBackend::Hashing { dimensions: 64 }).unwrap();
        assert_eq!(hashing.dimensions(), 64);

        let remote = build_vectorizer(&EmbeddingBackend::OpenAi {
            endpoint: "http://localhost:8080/v1/embeddings".into(),
            model: "local".into(),
            dimensions: Some(256),
            api_key: None,
        })
        .unwrap();
        assert_eq!(remote.model_id(), "local");
        assert_eq!(remote.dimensions(), 256);
    }
}
