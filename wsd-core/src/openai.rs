//! Vetorizador remoto para qualquer API de embeddings compatível com OpenAI
//! (`POST {endpoint}` com `{ model, input, dimensions? }`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::{EmbeddingVector, Vectorizer};
use crate::error::{Result, WsdError};

/// Endpoint padrão da OpenAI.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/embeddings";

/// Modelo padrão.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Dimensão de `text-embedding-3-small`.
const DEFAULT_DIMENSIONS: usize = 1536;

const PROVIDER: &str = "OpenAI";

/// [`Vectorizer`] que chama um endpoint `/v1/embeddings` via `reqwest`.
///
/// Texto vazio não gera requisição: devolve o vetor nulo, como o contrato exige
/// (a API rejeitaria a entrada vazia).
pub struct OpenAiVectorizer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
    /// Repassado à API para truncamento Matryoshka, se definido.
    request_dimensions: Option<usize>,
}

impl OpenAiVectorizer {
    /// Cria o vetorizador para `endpoint`. A chave é opcional para servidores
    /// locais compatíveis que não exigem autenticação.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(WsdError::Configuration("endpoint de embeddings vazio".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key: api_key.filter(|k| !k.is_empty()),
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            request_dimensions: None,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Define a dimensão de saída (também enviada à API).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self.request_dimensions = Some(dims);
        self
    }

    fn failure(message: String) -> WsdError {
        WsdError::EmbeddingFailure {
            provider: PROVIDER.into(),
            message,
        }
    }

    async fn request(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>> {
        debug!(provider = PROVIDER, batch_size = texts.len(), model = %self.model, "Vetorizando lote");

        let body = EmbeddingRequest {
            model: &self.model,
            input: texts.to_vec(),
            dimensions: self.request_dimensions,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "Falha na requisição de embeddings");
            Self::failure(format!("requisição falhou: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(provider = PROVIDER, %status, "API de embeddings respondeu com erro");
            return Err(Self::failure(format!("API devolveu {status}: {detail}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Self::failure(format!("resposta inválida: {e}")))?;

        if parsed.data.len() != texts.len() {
            return Err(Self::failure(format!(
                "esperados {} vetores, recebidos {}",
                texts.len(),
                parsed.data.len()
            )));
        }

        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| EmbeddingVector::new(d.embedding)).collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl Vectorizer for OpenAiVectorizer {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors.pop().ok_or_else(|| Self::failure("resposta vazia".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<EmbeddingVector>> {
        // Textos vazios ficam fora da requisição e recebem o vetor nulo
        let pending: Vec<(usize, &str)> = texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.trim().is_empty())
            .map(|(i, t)| (i, *t))
            .collect();

        let mut out = vec![EmbeddingVector::null(self.dimensions); texts.len()];
        if pending.is_empty() {
            return Ok(out);
        }

        let inputs: Vec<&str> = pending.iter().map(|(_, t)| *t).collect();
        let vectors = self.request(&inputs).await?;
        for ((slot, _), vector) in pending.into_iter().zip(vectors) {
            out[slot] = vector;
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_empty_endpoint() {
        assert!(matches!(
            OpenAiVectorizer::new("  ", None),
            Err(WsdError::Configuration(_))
        ));
    }

    #[test]
    fn test_builder() {
        let v = OpenAiVectorizer::new(DEFAULT_ENDPOINT, Some(String::new()))
            .unwrap()
            .with_model("text-embedding-3-large")
            .with_dimensions(256);
        assert_eq!(v.model_id(), "text-embedding-3-large");
        assert_eq!(Vectorizer::dimensions(&v), 256);
        assert!(v.api_key.is_none());
    }

    #[tokio::test]
    async fn test_empty_text_skips_request() {
        // endpoint inalcançável: só passa se nenhuma requisição for feita
        let v = OpenAiVectorizer::new("http://127.0.0.1:9/v1/embeddings", None)
            .unwrap()
            .with_dimensions(8);
        let out = v.embed_batch(&["", "   "]).await.unwrap();
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(EmbeddingVector::is_null));
    }

    #[test]
    fn test_request_serialization() {
        let body = EmbeddingRequest {
            model: "m",
            input: vec!["a"],
            dimensions: None,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"model":"m","input":["a"]}"#);
    }
}
