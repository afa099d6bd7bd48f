//! # Adaptador de Anotação
//!
//! Transforma texto bruto na sequência de [`AnnotatedToken`] consumida pelo
//! resto do pipeline. Duas estratégias:
//!
//! - [`TeprolinAnnotator`]: cliente HTTP do serviço Teprolin (tokenização,
//!   lematização, POS e entidades nomeadas numa única chamada);
//! - [`RuleAnnotator`]: anotador determinístico e local, construído sobre o
//!   [`tokenizer`](crate::tokenizer). Não é um etiquetador: usa um léxico de
//!   classes fechadas e uma pequena tabela de flexões para as palavras de demonstração.
//!
//! Uma falha do Teprolin aborta o documento com
//! [`WsdError::AnnotationUnavailable`]; não há fallback silencioso.
//!
//! ## Formato da resposta do Teprolin
//!
//! ```json
//! { "teprolin-result": { "tokenized": [
//!     [ { "_wordform": "Banca", "_lemma": "bancă", "_ctg": "NSRY",
//!         "_msd": "Ncfsry", "_ner": "O" }, ... ],
//!     ...
//! ] } }
//! ```
//!
//! A lista externa são as sentenças; o índice dela vira `AnnotatedToken::sentence`.

use std::collections::HashMap;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{Result, WsdError};
use crate::inventory::normalize_lemma;
use crate::token::{AnnotatedToken, Pos};
use crate::tokenizer::tokenize;

/// Operações pedidas ao Teprolin numa única chamada.
const TEPROLIN_EXEC: &str = "tokenization,lemmatization,pos-tagging,named-entity-recognition";

const TEPROLIN: &str = "teprolin";

/// Prazo da verificação de saúde (`GET /operations`).
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Prazo de uma anotação completa.
pub const ANNOTATE_TIMEOUT: Duration = Duration::from_secs(60);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Estado de um serviço de anotação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub service: String,
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Produz tokens anotados a partir de texto bruto.
#[async_trait]
pub trait Annotator: Send + Sync {
    /// Anota `text`. Texto vazio devolve uma sequência vazia.
    async fn annotate(&self, text: &str) -> Result<Vec<AnnotatedToken>>;

    /// Verifica se o serviço responde.
    async fn health(&self) -> ServiceHealth;

    fn name(&self) -> &str;
}

// ============================================================================
// Teprolin
// ============================================================================

/// Cliente do serviço Teprolin (`POST {base}/process`).
///
/// Toda requisição tem prazo: um serviço que aceita a conexão e nunca
/// responde vira `AnnotationUnavailable` (ou `available: false` na saúde).
pub struct TeprolinAnnotator {
    client: reqwest::Client,
    base_url: String,
    annotate_timeout: Duration,
    health_timeout: Duration,
}

impl TeprolinAnnotator {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(WsdError::Configuration("URL do Teprolin vazia".into()));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| WsdError::Configuration(format!("cliente HTTP do Teprolin: {e}")))?;
        info!(url = %base_url, "Anotador Teprolin configurado");
        Ok(Self {
            client,
            base_url,
            annotate_timeout: ANNOTATE_TIMEOUT,
            health_timeout: HEALTH_TIMEOUT,
        })
    }

    /// Troca os prazos de anotação e de verificação de saúde.
    pub fn with_timeouts(mut self, annotate: Duration, health: Duration) -> Self {
        self.annotate_timeout = annotate;
        self.health_timeout = health;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn unavailable(message: String) -> WsdError {
        WsdError::AnnotationUnavailable {
            service: TEPROLIN.into(),
            message,
        }
    }
}

#[derive(Deserialize)]
struct TeprolinResponse {
    #[serde(rename = "teprolin-result")]
    result: TeprolinResult,
}

#[derive(Deserialize)]
struct TeprolinResult {
    #[serde(default)]
    tokenized: Vec<Vec<TeprolinToken>>,
}

#[derive(Deserialize)]
struct TeprolinToken {
    #[serde(rename = "_wordform", default)]
    wordform: String,
    #[serde(rename = "_lemma", default)]
    lemma: String,
    #[serde(rename = "_ctg", default)]
    ctg: String,
    #[serde(rename = "_msd", default)]
    msd: String,
    #[serde(rename = "_ner", default)]
    ner: String,
}

/// Converte o corpo JSON do Teprolin em tokens anotados.
///
/// Tokens sem forma de superfície são descartados; a POS vem da MSD e, na
/// falta dela, da etiqueta `_ctg`.
pub fn parse_teprolin(body: &str) -> Result<Vec<AnnotatedToken>> {
    let response: TeprolinResponse =
        serde_json::from_str(body).map_err(|e| TeprolinAnnotator::unavailable(format!("resposta inválida: {e}")))?;

    let mut tokens = Vec::new();
    for (sentence, words) in response.result.tokenized.into_iter().enumerate() {
        for word in words.into_iter().filter(|w| !w.wordform.is_empty()) {
            let tag = if word.msd.is_empty() { &word.ctg } else { &word.msd };
            let pos = Pos::normalize(tag);
            let lemma = if word.lemma.is_empty() { word.wordform.to_lowercase() } else { word.lemma };

            let mut token = AnnotatedToken::new(word.wordform, lemma, pos, tokens.len())
                .with_msd(word.msd)
                .in_sentence(sentence);
            if !word.ner.is_empty() && word.ner != "O" {
                token = token.with_entity(word.ner);
            }
            tokens.push(token);
        }
    }
    Ok(tokens)
}

#[async_trait]
impl Annotator for TeprolinAnnotator {
    async fn annotate(&self, text: &str) -> Result<Vec<AnnotatedToken>> {
        if text.trim().is_empty() {
            return Ok(vec![]);
        }
        let start = Instant::now();
        let url = format!("{}/process", self.base_url);
        debug!(url = %url, chars = text.chars().count(), "Enviando texto ao Teprolin");

        let response = self
            .client
            .post(&url)
            .form(&[("text", text), ("exec", TEPROLIN_EXEC)])
            .timeout(self.annotate_timeout)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Teprolin inacessível");
                Self::unavailable(format!("requisição falhou: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(%status, "Teprolin respondeu com erro");
            return Err(Self::unavailable(format!("serviço devolveu {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Self::unavailable(format!("corpo ilegível: {e}")))?;
        let tokens = parse_teprolin(&body)?;

        info!(
            tokens = tokens.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Anotação concluída"
        );
        Ok(tokens)
    }

    async fn health(&self) -> ServiceHealth {
        let start = Instant::now();
        let result = self
            .client
            .get(format!("{}/operations", self.base_url))
            .timeout(self.health_timeout)
            .send()
            .await;
        let elapsed = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) if response.status().is_success() => ServiceHealth {
                service: TEPROLIN.into(),
                available: true,
                response_ms: Some(elapsed),
                detail: None,
            },
            Ok(response) => ServiceHealth {
                service: TEPROLIN.into(),
                available: false,
                response_ms: Some(elapsed),
                detail: Some(format!("status {}", response.status())),
            },
            Err(e) => ServiceHealth {
                service: TEPROLIN.into(),
                available: false,
                response_ms: None,
                detail: Some(e.to_string()),
            },
        }
    }

    fn name(&self) -> &str {
        TEPROLIN
    }
}

// ============================================================================
// Anotador local
// ============================================================================

/// Palavras de classe fechada do romeno (já normalizadas, sem hífen de clítico).
const CLOSED_CLASS: &[(&str, Pos)] = &[
    // determinantes e artigos
    ("un", Pos::Determiner), ("o", Pos::Determiner), ("niște", Pos::Determiner),
    ("al", Pos::Determiner), ("a", Pos::Determiner), ("ai", Pos::Determiner), ("ale", Pos::Determiner),
    ("acest", Pos::Determiner), ("această", Pos::Determiner), ("acel", Pos::Determiner), ("acea", Pos::Determiner),
    ("fiecare", Pos::Determiner), ("orice", Pos::Determiner), ("toți", Pos::Determiner), ("toate", Pos::Determiner),
    // preposições
    ("la", Pos::Adposition), ("pe", Pos::Adposition), ("în", Pos::Adposition), ("din", Pos::Adposition),
    ("de", Pos::Adposition), ("cu", Pos::Adposition), ("pentru", Pos::Adposition), ("spre", Pos::Adposition),
    ("peste", Pos::Adposition), ("lângă", Pos::Adposition), ("sub", Pos::Adposition), ("între", Pos::Adposition),
    ("prin", Pos::Adposition), ("fără", Pos::Adposition), ("după", Pos::Adposition), ("către", Pos::Adposition),
    ("într", Pos::Adposition), ("dintr", Pos::Adposition), ("printr", Pos::Adposition),
    // conjunções
    ("și", Pos::Conjunction), ("sau", Pos::Conjunction), ("dar", Pos::Conjunction), ("iar", Pos::Conjunction),
    ("că", Pos::Conjunction), ("dacă", Pos::Conjunction), ("ori", Pos::Conjunction), ("însă", Pos::Conjunction),
    ("deci", Pos::Conjunction), ("ci", Pos::Conjunction), ("când", Pos::Conjunction),
    // pronomes e clíticos
    ("eu", Pos::Pronoun), ("tu", Pos::Pronoun), ("el", Pos::Pronoun), ("ea", Pos::Pronoun),
    ("noi", Pos::Pronoun), ("voi", Pos::Pronoun), ("ei", Pos::Pronoun), ("ele", Pos::Pronoun),
    ("care", Pos::Pronoun), ("ce", Pos::Pronoun), ("cine", Pos::Pronoun), ("se", Pos::Pronoun),
    ("s", Pos::Pronoun), ("m", Pos::Pronoun), ("mi", Pos::Pronoun), ("îmi", Pos::Pronoun),
    ("i", Pos::Pronoun), ("îi", Pos::Pronoun), ("îl", Pos::Pronoun), ("l", Pos::Pronoun),
    ("le", Pos::Pronoun), ("ne", Pos::Pronoun), ("te", Pos::Pronoun), ("vă", Pos::Pronoun),
    ("ți", Pos::Pronoun), ("își", Pos::Pronoun),
    // auxiliares e cópula
    ("am", Pos::Verb), ("ai", Pos::Verb), ("are", Pos::Verb), ("au", Pos::Verb), ("ați", Pos::Verb),
    ("este", Pos::Verb), ("e", Pos::Verb), ("sunt", Pos::Verb), ("era", Pos::Verb), ("fost", Pos::Verb),
    ("fi", Pos::Verb), ("aș", Pos::Verb), ("ar", Pos::Verb), ("va", Pos::Verb), ("vor", Pos::Verb),
    // partículas e advérbios frequentes
    ("să", Pos::Particle), ("nu", Pos::Particle), ("mai", Pos::Adverb), ("foarte", Pos::Adverb),
    ("aici", Pos::Adverb), ("acolo", Pos::Adverb), ("azi", Pos::Adverb), ("ieri", Pos::Adverb),
    ("timp", Pos::Noun),
];

/// Formas flexionadas conhecidas → (lema, POS).
///
/// Cobre as palavras de demonstração do inventário embutido.
const INFLECTIONS: &[(&str, &str, Pos)] = &[
    ("banca", "bancă", Pos::Noun), ("bănci", "bancă", Pos::Noun), ("băncii", "bancă", Pos::Noun),
    ("băncile", "bancă", Pos::Noun), ("bancă", "bancă", Pos::Noun),
    ("masa", "masă", Pos::Noun), ("mese", "masă", Pos::Noun), ("mesei", "masă", Pos::Noun),
    ("masă", "masă", Pos::Noun),
    ("nota", "notă", Pos::Noun), ("note", "notă", Pos::Noun), ("notei", "notă", Pos::Noun),
    ("notă", "notă", Pos::Noun),
    ("calul", "cal", Pos::Noun), ("cai", "cal", Pos::Noun), ("caii", "cal", Pos::Noun),
    ("calului", "cal", Pos::Noun), ("cal", "cal", Pos::Noun),
    ("broasca", "broască", Pos::Noun), ("broaște", "broască", Pos::Noun), ("broaștei", "broască", Pos::Noun),
    ("broască", "broască", Pos::Noun),
    ("lacul", "lac", Pos::Noun), ("lacuri", "lac", Pos::Noun), ("lac", "lac", Pos::Noun),
    ("vinul", "vin", Pos::Noun), ("vinuri", "vin", Pos::Noun), ("vin", "vin", Pos::Noun),
    ("vine", "veni", Pos::Verb), ("venit", "veni", Pos::Verb), ("veni", "veni", Pos::Verb),
    ("tocul", "toc", Pos::Noun), ("tocuri", "toc", Pos::Noun), ("toc", "toc", Pos::Noun),
    ("marea", "mare", Pos::Noun), ("mării", "mare", Pos::Noun), ("mări", "mare", Pos::Noun),
    ("mare", "mare", Pos::Adjective), ("mari", "mare", Pos::Adjective),
    ("leul", "leu", Pos::Noun), ("lei", "leu", Pos::Noun), ("leului", "leu", Pos::Noun),
    ("leu", "leu", Pos::Noun),
];

fn closed_class() -> &'static HashMap<&'static str, Pos> {
    static TABLE: OnceLock<HashMap<&'static str, Pos>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::new();
        for &(word, pos) in CLOSED_CLASS {
            // a primeira entrada vence ("ai" artigo antes de "ai" auxiliar)
            table.entry(word).or_insert(pos);
        }
        table
    })
}

fn inflections() -> &'static HashMap<&'static str, (&'static str, Pos)> {
    static TABLE: OnceLock<HashMap<&'static str, (&'static str, Pos)>> = OnceLock::new();
    TABLE.get_or_init(|| INFLECTIONS.iter().map(|&(form, lemma, pos)| (form, (lemma, pos))).collect())
}

/// Anotador local e determinístico.
///
/// - lema: tabela de flexões ou a forma em minúsculas;
/// - POS: pontuação, numeral, léxico de classe fechada, senão substantivo;
/// - entidade: palavra com maiúscula fora do início de sentença e fora dos léxicos;
/// - sentença: incrementada depois de cada pontuação final.
#[derive(Debug, Clone, Default)]
pub struct RuleAnnotator;

impl RuleAnnotator {
    pub fn new() -> Self {
        Self
    }

    /// Versão síncrona de [`Annotator::annotate`].
    pub fn annotate_sync(&self, text: &str) -> Vec<AnnotatedToken> {
        let mut sentence = 0;
        let mut sentence_start = true;

        tokenize(text)
            .into_iter()
            .map(|raw| {
                let token = Self::annotate_word(&raw.text, raw.index, sentence_start).in_sentence(sentence);
                if token.is_sentence_final() {
                    sentence += 1;
                    sentence_start = true;
                } else if token.pos != Pos::Punctuation {
                    sentence_start = false;
                }
                token
            })
            .collect()
    }

    fn annotate_word(surface: &str, position: usize, sentence_start: bool) -> AnnotatedToken {
        if surface.chars().all(|c| !c.is_alphanumeric()) {
            return AnnotatedToken::new(surface, surface, Pos::Punctuation, position);
        }
        let key = normalize_lemma(surface.trim_end_matches('-'));

        if key.chars().all(|c| c.is_ascii_digit() || c == ',' || c == '.') {
            return AnnotatedToken::new(surface, key, Pos::Numeral, position);
        }
        if let Some(&(lemma, pos)) = inflections().get(key.as_str()) {
            return AnnotatedToken::new(surface, lemma, pos, position);
        }
        if let Some(&pos) = closed_class().get(key.as_str()) {
            return AnnotatedToken::new(surface, key, pos, position);
        }

        let capitalized = surface.chars().next().is_some_and(char::is_uppercase);
        let token = AnnotatedToken::new(surface, key, Pos::Noun, position);
        if capitalized && !sentence_start {
            token.with_entity("ENT")
        } else {
            token
        }
    }
}

#[async_trait]
impl Annotator for RuleAnnotator {
    async fn annotate(&self, text: &str) -> Result<Vec<AnnotatedToken>> {
        let tokens = self.annotate_sync(text);
        debug!(tokens = tokens.len(), "Anotação local concluída");
        Ok(tokens)
    }

    async fn health(&self) -> ServiceHealth {
        ServiceHealth {
            service: "rules".into(),
            available: true,
            response_ms: Some(0),
            detail: None,
        }
    }

    fn name(&self) -> &str {
        "rules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEPROLIN_BODY: &str = r#"{
        "teprolin-result": {
            "tokenized": [
                [
                    {"_wordform": "Banca", "_lemma": "bancă", "_ctg": "NSRY", "_msd": "Ncfsry", "_ner": "O"},
                    {"_wordform": "BCR", "_lemma": "BCR", "_ctg": "NP", "_msd": "Np", "_ner": "ORG"},
                    {"_wordform": ".", "_lemma": ".", "_ctg": "PERIOD", "_msd": "PERIOD", "_ner": ""}
                ],
                [
                    {"_wordform": "Stau", "_lemma": "sta", "_ctg": "V1", "_msd": "Vmip1s"},
                    {"_wordform": "", "_lemma": ""}
                ]
            ]
        }
    }"#;

    #[test]
    fn test_parse_teprolin_response() {
        let tokens = parse_teprolin(TEPROLIN_BODY).unwrap();
        assert_eq!(tokens.len(), 4);

        assert_eq!(tokens[0].lemma, "bancă");
        assert_eq!(tokens[0].pos, Pos::Noun);
        assert_eq!(tokens[0].msd, "Ncfsry");
        assert!(!tokens[0].is_named_entity());

        assert_eq!(tokens[1].entity.as_deref(), Some("ORG"));
        assert_eq!(tokens[2].pos, Pos::Punctuation);

        assert_eq!(tokens[3].sentence, 1);
        assert_eq!(tokens[3].pos, Pos::Verb);
        for (i, t) in tokens.iter().enumerate() {
            assert_eq!(t.position, i);
        }
    }

    #[test]
    fn test_parse_teprolin_rejects_garbage() {
        let err = parse_teprolin("<html>erro</html>").unwrap_err();
        assert!(matches!(err, WsdError::AnnotationUnavailable { .. }));
    }

    #[test]
    fn test_teprolin_empty_url_is_configuration_error() {
        assert!(matches!(TeprolinAnnotator::new("  "), Err(WsdError::Configuration(_))));
        let annotator = TeprolinAnnotator::new("http://localhost:5000/").unwrap();
        assert_eq!(annotator.base_url(), "http://localhost:5000");
    }

    #[tokio::test]
    async fn test_teprolin_unreachable_is_unavailable() {
        let annotator = TeprolinAnnotator::new("http://127.0.0.1:1").unwrap();
        let err = annotator.annotate("Banca e închisă.").await.unwrap_err();
        assert!(matches!(err, WsdError::AnnotationUnavailable { .. }));
        assert!(!annotator.health().await.available);
    }

    /// Aceita conexões e nunca responde.
    async fn silent_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_teprolin_silent_service_times_out() {
        let annotator = TeprolinAnnotator::new(silent_server().await)
            .unwrap()
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(200));

        let health = tokio::time::timeout(Duration::from_secs(5), annotator.health())
            .await
            .expect("a verificação de saúde deveria respeitar o prazo");
        assert!(!health.available);
        assert!(health.detail.is_some());

        let err = tokio::time::timeout(Duration::from_secs(5), annotator.annotate("Banca e închisă."))
            .await
            .expect("a anotação deveria respeitar o prazo")
            .unwrap_err();
        assert!(matches!(err, WsdError::AnnotationUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_teprolin_empty_text_skips_request() {
        let annotator = TeprolinAnnotator::new("http://127.0.0.1:1").unwrap();
        assert!(annotator.annotate("   ").await.unwrap().is_empty());
    }

    #[test]
    fn test_rule_annotator_lemmas_and_pos() {
        let tokens = RuleAnnotator::new().annotate_sync("Banca a dat un credit.");
        let view: Vec<(&str, Pos)> = tokens.iter().map(|t| (t.lemma.as_str(), t.pos)).collect();
        assert_eq!(
            view,
            vec![
                ("bancă", Pos::Noun),
                ("a", Pos::Determiner),
                ("dat", Pos::Noun),
                ("un", Pos::Determiner),
                ("credit", Pos::Noun),
                (".", Pos::Punctuation),
            ]
        );
    }

    #[test]
    fn test_rule_annotator_sentences_and_entities() {
        let tokens = RuleAnnotator::new().annotate_sync("Leul doarme în Africa. Calul aleargă!");
        let africa = tokens.iter().find(|t| t.surface == "Africa").unwrap();
        assert!(africa.is_named_entity());
        assert_eq!(africa.sentence, 0);

        // início de sentença não vira entidade
        let calul = tokens.iter().find(|t| t.surface == "Calul").unwrap();
        assert!(!calul.is_named_entity());
        assert_eq!(calul.lemma, "cal");
        assert_eq!(calul.sentence, 1);
    }

    #[test]
    fn test_rule_annotator_clitics_and_numbers() {
        let tokens = RuleAnnotator::new().annotate_sync("M-am dus cu 3,5 lei.");
        assert_eq!(tokens[0].surface, "M-");
        assert_eq!(tokens[0].pos, Pos::Pronoun);
        assert_eq!(tokens[1].pos, Pos::Verb);
        let number = tokens.iter().find(|t| t.surface == "3,5").unwrap();
        assert_eq!(number.pos, Pos::Numeral);
        let lei = tokens.iter().find(|t| t.surface == "lei").unwrap();
        assert_eq!(lei.lemma, "leu");
    }

    #[tokio::test]
    async fn test_rule_annotator_empty_text() {
        let annotator = RuleAnnotator::new();
        assert!(annotator.annotate("").await.unwrap().is_empty());
        assert!(annotator.health().await.available);
    }
}
