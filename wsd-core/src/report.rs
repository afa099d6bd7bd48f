//! # Agregador de Resultados
//!
//! Junta os resultados por ocorrência com a sequência completa de tokens num
//! único relatório ordenado. Invariante: `report.tokens[i].position == i`,
//! independentemente da ordem em que as tarefas paralelas terminaram.
//!
//! Todo token carrega um [`SenseOutcome`]:
//!
//! - `not_ambiguous`: sem resultado (0 ou 1 candidato, ou classe filtrada);
//! - `resolved`: resultado completo, talvez com baixa confiança;
//! - `unresolved`: a ocorrência era ambígua mas o embedding falhou. Nunca é
//!   descartada em silêncio.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::DisambiguationResult;
use crate::token::AnnotatedToken;

/// Situação de um token no relatório.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SenseOutcome {
    NotAmbiguous,
    Resolved(DisambiguationResult),
    Unresolved { reason: String },
}

impl SenseOutcome {
    pub fn result(&self) -> Option<&DisambiguationResult> {
        match self {
            SenseOutcome::Resolved(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, SenseOutcome::Unresolved { .. })
    }
}

/// Um token do documento e sua situação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenReport {
    pub position: usize,
    pub token: AnnotatedToken,
    pub outcome: SenseOutcome,
}

/// Contagens do relatório.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_tokens: usize,
    pub ambiguous: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub low_confidence: usize,
}

/// Artefato final do núcleo: todos os tokens, na ordem original.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisambiguationReport {
    pub tokens: Vec<TokenReport>,
    pub summary: ReportSummary,
    /// Modelo de embeddings usado.
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub processing_ms: u64,
}

impl DisambiguationReport {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Resultados resolvidos, em ordem de posição.
    pub fn results(&self) -> impl Iterator<Item = &DisambiguationResult> {
        self.tokens.iter().filter_map(|t| t.outcome.result())
    }

    /// Ocorrências não resolvidas e o motivo.
    pub fn unresolved(&self) -> impl Iterator<Item = (&TokenReport, &str)> {
        self.tokens.iter().filter_map(|t| match &t.outcome {
            SenseOutcome::Unresolved { reason } => Some((t, reason.as_str())),
            _ => None,
        })
    }

    pub fn outcome_at(&self, position: usize) -> Option<&SenseOutcome> {
        self.tokens.get(position).map(|t| &t.outcome)
    }
}

/// Reassocia cada resultado ao seu token pela posição.
///
/// Os tokens são renumerados `0..n` na ordem recebida. Resultados cuja posição
/// não existe são ignorados com um aviso; se duas saídas disputarem a mesma
/// posição, vale a última.
pub fn aggregate<I>(tokens: Vec<AnnotatedToken>, outcomes: I) -> DisambiguationReport
where
    I: IntoIterator<Item = (usize, SenseOutcome)>,
{
    let mut slots: Vec<SenseOutcome> = vec![SenseOutcome::NotAmbiguous; tokens.len()];
    for (position, outcome) in outcomes {
        match slots.get_mut(position) {
            Some(slot) => *slot = outcome,
            None => warn!(position, total = tokens.len(), "Resultado para posição inexistente ignorado"),
        }
    }

    let mut summary = ReportSummary {
        total_tokens: tokens.len(),
        ..ReportSummary::default()
    };

    let tokens: Vec<TokenReport> = tokens
        .into_iter()
        .zip(slots)
        .enumerate()
        .map(|(position, (mut token, outcome))| {
            token.position = position;
            match &outcome {
                SenseOutcome::NotAmbiguous => {}
                SenseOutcome::Resolved(result) => {
                    summary.ambiguous += 1;
                    summary.resolved += 1;
                    if result.low_confidence {
                        summary.low_confidence += 1;
                    }
                }
                SenseOutcome::Unresolved { .. } => {
                    summary.ambiguous += 1;
                    summary.unresolved += 1;
                }
            }
            TokenReport {
                position,
                token,
                outcome,
            }
        })
        .collect();

    DisambiguationReport {
        tokens,
        summary,
        model: String::new(),
        processing_ms: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScoreStats;
    use crate::inventory::SenseCandidate;
    use crate::token::Pos;

    fn tokens(n: usize) -> Vec<AnnotatedToken> {
        (0..n)
            .map(|i| AnnotatedToken::new(format!("w{i}"), format!("w{i}"), Pos::Noun, i))
            .collect()
    }

    fn resolved(position: usize, low_confidence: bool) -> SenseOutcome {
        let chosen = SenseCandidate::new("s0", "glosa");
        SenseOutcome::Resolved(DisambiguationResult {
            position,
            surface: format!("w{position}"),
            lemma: format!("w{position}"),
            pos: Pos::Noun,
            chosen,
            score: 0.5,
            ranked: vec![],
            low_confidence,
            margin: 0.1,
            stats: ScoreStats::default(),
            context: String::new(),
        })
    }

    #[test]
    fn test_order_independent_of_completion() {
        let report = aggregate(
            tokens(5),
            vec![
                (3, resolved(3, false)),
                (1, SenseOutcome::Unresolved { reason: "timeout".into() }),
                (0, resolved(0, true)),
            ],
        );
        for (i, t) in report.tokens.iter().enumerate() {
            assert_eq!(t.position, i);
            assert_eq!(t.token.position, i);
            assert_eq!(t.token.surface, format!("w{i}"));
        }
        assert_eq!(report.results().map(|r| r.position).collect::<Vec<_>>(), vec![0, 3]);
        assert_eq!(report.unresolved().map(|(t, r)| (t.position, r)).collect::<Vec<_>>(), vec![(1, "timeout")]);
        assert_eq!(report.outcome_at(2), Some(&SenseOutcome::NotAmbiguous));
    }

    #[test]
    fn test_summary_counts() {
        let report = aggregate(
            tokens(4),
            vec![
                (0, resolved(0, true)),
                (2, resolved(2, false)),
                (3, SenseOutcome::Unresolved { reason: "x".into() }),
            ],
        );
        assert_eq!(
            report.summary,
            ReportSummary {
                total_tokens: 4,
                ambiguous: 3,
                resolved: 2,
                unresolved: 1,
                low_confidence: 1,
            }
        );
    }

    #[test]
    fn test_out_of_range_ignored() {
        let report = aggregate(tokens(2), vec![(9, resolved(9, false))]);
        assert_eq!(report.len(), 2);
        assert_eq!(report.results().count(), 0);
    }

    #[test]
    fn test_empty() {
        let report = aggregate(vec![], Vec::<(usize, SenseOutcome)>::new());
        assert!(report.is_empty());
        assert_eq!(report.summary, ReportSummary::default());
    }

    #[test]
    fn test_outcome_serialization_tag() {
        let json = serde_json::to_value(SenseOutcome::Unresolved { reason: "falha".into() }).unwrap();
        assert_eq!(json["status"], "unresolved");
        assert_eq!(json["reason"], "falha");
        let json = serde_json::to_value(SenseOutcome::NotAmbiguous).unwrap();
        assert_eq!(json["status"], "not_ambiguous");
    }
}
