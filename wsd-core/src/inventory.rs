//! # Inventário de Sentidos
//!
//! Mapeamento `(lema, classe gramatical) → sentidos candidatos`, carregado uma
//! única vez e compartilhado somente-leitura por todas as tarefas de
//! desambiguação (sem locks).
//!
//! O pipeline depende apenas do trait [`SenseInventory`], com uma única operação
//! (`resolve`). Isso permite usar dublês de teste com conjuntos de candidatos
//! controlados.
//!
//! ## Formato do arquivo
//!
//! ```json
//! [
//!   {
//!     "lemma": "bancă",
//!     "pos": "noun",
//!     "senses": [
//!       { "id": "bancă.n.01", "gloss": "instituție financiară", "synonyms": ["instituție bancară"] },
//!       { "id": "bancă.n.02", "gloss": "scaun lung", "examples": ["Stau pe bancă."] }
//!     ]
//!   }
//! ]
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::corpus::builtin_lexicon;
use crate::error::{Result, WsdError};
use crate::token::Pos;

/// Um sentido possível de um lema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenseCandidate {
    /// Identificador único dentro do par (lema, classe).
    pub id: String,
    /// Definição curta (glosa). Pode estar vazia.
    #[serde(default)]
    pub gloss: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub examples: Vec<String>,
}

impl SenseCandidate {
    pub fn new(id: impl Into<String>, gloss: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            gloss: gloss.into(),
            synonyms: vec![],
            examples: vec![],
        }
    }

    pub fn with_synonyms<I, S>(mut self, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.synonyms = synonyms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_examples<I, S>(mut self, examples: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.examples = examples.into_iter().map(Into::into).collect();
        self
    }

    /// Texto que representa o sentido no espaço vetorial.
    ///
    /// A glosa, ou, se ela estiver vazia, os sinônimos separados por espaço.
    /// Pode resultar em texto vazio (vetor nulo).
    pub fn gloss_text(&self) -> String {
        if self.gloss.trim().is_empty() {
            self.synonyms.join(" ")
        } else {
            self.gloss.clone()
        }
    }
}

/// Capacidade somente-leitura de resolver candidatos de sentido.
pub trait SenseInventory: Send + Sync {
    /// Sentidos de `(lemma, pos)` na ordem canônica do inventário.
    ///
    /// Lema desconhecido não é erro: devolve uma lista vazia.
    fn resolve(&self, lemma: &str, pos: Pos) -> Arc<[SenseCandidate]>;
}

/// Normaliza o lema para busca: minúsculas e diacríticos romenos com vírgula
/// (`ş`/`ţ` com cedilha viram `ș`/`ț`).
pub fn normalize_lemma(lemma: &str) -> String {
    lemma
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'ş' => 'ș',
            'ţ' => 'ț',
            other => other,
        })
        .collect()
}

#[derive(Deserialize)]
struct InventoryRecord {
    lemma: String,
    pos: String,
    senses: Vec<SenseCandidate>,
}

/// Inventário em memória, preenchido na inicialização.
#[derive(Debug, Clone)]
pub struct StaticInventory {
    entries: HashMap<(String, Pos), Arc<[SenseCandidate]>>,
    empty: Arc<[SenseCandidate]>,
}

impl Default for StaticInventory {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            empty: Arc::from(Vec::new()),
        }
    }
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inventário de demonstração embutido no crate.
    pub fn builtin() -> Self {
        let mut inventory = Self::new();
        for entry in builtin_lexicon() {
            let senses = entry
                .senses
                .iter()
                .map(|(id, gloss, synonyms, examples)| {
                    SenseCandidate::new(*id, *gloss)
                        .with_synonyms(synonyms.iter().copied())
                        .with_examples(examples.iter().copied())
                })
                .collect();
            inventory.insert(entry.lemma, entry.pos, senses);
        }
        inventory
    }

    /// Carrega o inventário de uma string JSON.
    ///
    /// # Errors
    ///
    /// [`WsdError::InventoryLoad`] se o JSON for inválido ou se uma classe
    /// gramatical não for reconhecida.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let records: Vec<InventoryRecord> =
            serde_json::from_str(json).map_err(|e| WsdError::InventoryLoad(format!("JSON inválido: {e}")))?;

        let mut inventory = Self::new();
        for record in records {
            let pos = Pos::from_name(&record.pos).ok_or_else(|| {
                WsdError::InventoryLoad(format!(
                    "classe gramatical desconhecida '{}' para o lema '{}'",
                    record.pos, record.lemma
                ))
            })?;
            inventory.insert(&record.lemma, pos, record.senses);
        }
        Ok(inventory)
    }

    /// Carrega o inventário de um arquivo JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| WsdError::InventoryLoad(format!("{}: {e}", path.display())))?;
        let inventory = Self::from_json_str(&json)?;
        info!(path = %path.display(), entries = inventory.len(), "Inventário de sentidos carregado");
        Ok(inventory)
    }

    /// Adiciona sentidos a `(lemma, pos)`, preservando a ordem.
    ///
    /// Entradas repetidas do mesmo par são concatenadas. IDs duplicados são
    /// descartados (fica o primeiro) com um aviso no log.
    pub fn insert(&mut self, lemma: &str, pos: Pos, senses: Vec<SenseCandidate>) {
        let key = (normalize_lemma(lemma), pos);
        let mut merged: Vec<SenseCandidate> = self.entries.get(&key).map(|s| s.to_vec()).unwrap_or_default();

        for sense in senses {
            if merged.iter().any(|s| s.id == sense.id) {
                warn!(lemma = %key.0, pos = %pos, id = %sense.id, "ID de sentido duplicado ignorado");
                continue;
            }
            merged.push(sense);
        }

        self.entries.insert(key, Arc::from(merged));
    }

    /// Número de pares (lema, classe) no inventário.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SenseInventory for StaticInventory {
    fn resolve(&self, lemma: &str, pos: Pos) -> Arc<[SenseCandidate]> {
        self.entries
            .get(&(normalize_lemma(lemma), pos))
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.empty))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_resolve_preserves_canonical_order() {
        let inventory = StaticInventory::builtin();
        let senses = inventory.resolve("bancă", Pos::Noun);
        let ids: Vec<&str> = senses.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["bancă.n.01", "bancă.n.02", "bancă.n.03"]);
    }

    #[test]
    fn test_resolve_unknown_is_empty() {
        let inventory = StaticInventory::builtin();
        assert!(inventory.resolve("zmeu", Pos::Noun).is_empty());
        // mesmo lema, outra classe
        assert!(inventory.resolve("bancă", Pos::Verb).is_empty());
    }

    #[test]
    fn test_resolve_normalizes_case_and_cedilla() {
        let mut inventory = StaticInventory::new();
        inventory.insert(
            "ș",
            Pos::Noun,
            vec![SenseCandidate::new("a", "x"), SenseCandidate::new("b", "y")],
        );
        assert_eq!(inventory.resolve("Ş", Pos::Noun).len(), 2);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut inventory = StaticInventory::new();
        inventory.insert(
            "toc",
            Pos::Noun,
            vec![
                SenseCandidate::new("toc.1", "primeiro"),
                SenseCandidate::new("toc.1", "segundo"),
                SenseCandidate::new("toc.2", "terceiro"),
            ],
        );
        let senses = inventory.resolve("toc", Pos::Noun);
        assert_eq!(senses.len(), 2);
        assert_eq!(senses[0].gloss, "primeiro");
    }

    #[test]
    fn test_gloss_falls_back_to_synonyms() {
        let sense = SenseCandidate::new("x", "  ").with_synonyms(["mal", "țărm"]);
        assert_eq!(sense.gloss_text(), "mal țărm");
        assert_eq!(SenseCandidate::new("y", "").gloss_text(), "");
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"[
            {"lemma": "Cal", "pos": "NOUN", "senses": [
                {"id": "c1", "gloss": "animal"},
                {"id": "c2", "gloss": "", "synonyms": ["capră"]}
            ]}
        ]"#;
        let inventory = StaticInventory::from_json_str(json).unwrap();
        let senses = inventory.resolve("cal", Pos::Noun);
        assert_eq!(senses.len(), 2);
        assert_eq!(senses[1].gloss_text(), "capră");
    }

    #[test]
    fn test_from_json_rejects_unknown_pos() {
        let json = r#"[{"lemma": "cal", "pos": "substantiv", "senses": []}]"#;
        assert!(matches!(
            StaticInventory::from_json_str(json),
            Err(WsdError::InventoryLoad(_))
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"lemma": "lac", "pos": "noun", "senses": [{{"id": "l1", "gloss": "apă"}}, {{"id": "l2", "gloss": "vopsea"}}]}}]"#
        )
        .unwrap();
        let inventory = StaticInventory::from_path(file.path()).unwrap();
        assert_eq!(inventory.resolve("lac", Pos::Noun).len(), 2);

        assert!(StaticInventory::from_path("/caminho/que/nao/existe.json").is_err());
    }
}
