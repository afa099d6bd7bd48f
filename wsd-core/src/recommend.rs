//! Recomendações de reescrita para palavras ambíguas: os três sentidos mais
//! bem pontuados e sinônimos que evitam a ambiguidade.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::report::DisambiguationReport;
use crate::token::Pos;

/// Quantos sentidos entram em cada recomendação.
pub const TOP_OPTIONS: usize = 3;

const NO_DEFINITION: &str = "Nu există o definiție disponibilă";
const NO_SYNONYMS: &str = "Nu există sinonime directe";

/// Uma alternativa de sentido.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationOption {
    pub sense_id: String,
    pub meaning: String,
    pub synonyms: Vec<String>,
    pub score: f64,
}

/// Recomendação para uma ocorrência resolvida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub position: usize,
    pub word: String,
    pub pos: Pos,
    /// Mensagem ao usuário (em romeno).
    pub message: String,
    pub options: Vec<RecommendationOption>,
}

/// Gera uma recomendação por ocorrência resolvida, em ordem de posição.
pub fn recommend(report: &DisambiguationReport) -> Vec<Recommendation> {
    let recommendations: Vec<Recommendation> = report
        .results()
        .filter(|result| result.ranked.len() > 1)
        .map(|result| {
            let word = result.surface.clone();
            let options = result
                .ranked
                .iter()
                .take(TOP_OPTIONS)
                .map(|scored| {
                    let sense = &scored.sense;
                    let synonyms: Vec<String> = sense
                        .synonyms
                        .iter()
                        .filter(|s| s.to_lowercase() != word.to_lowercase() && s.to_lowercase() != result.lemma.to_lowercase())
                        .cloned()
                        .collect();
                    RecommendationOption {
                        sense_id: sense.id.clone(),
                        meaning: if sense.gloss.trim().is_empty() {
                            NO_DEFINITION.to_string()
                        } else {
                            sense.gloss.clone()
                        },
                        synonyms: if synonyms.is_empty() {
                            vec![NO_SYNONYMS.to_string()]
                        } else {
                            synonyms
                        },
                        score: scored.score,
                    }
                })
                .collect();

            Recommendation {
                position: result.position,
                message: format!(
                    "Cuvântul „{word}” este ambiguu. Folosiți un sinonim mai precis, potrivit sensului dorit:"
                ),
                word,
                pos: result.pos,
                options,
            }
        })
        .collect();

    debug!(count = recommendations.len(), "Recomendações geradas");
    recommendations
}
