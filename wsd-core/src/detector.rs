//! # Detector de Ambiguidade
//!
//! Percorre os tokens anotados e marca como ambíguos os que têm **dois ou mais**
//! sentidos candidatos no inventário para `(lema, classe)`.
//!
//! - 0 candidatos: fora do vocabulário, não é erro, o token segue sem resultado.
//! - 1 candidato: monossêmico, nada a desambiguar.
//! - Classes fora do filtro (ex: determinantes, conjunções) são ignoradas.
//! - Entidades nomeadas são ignoradas se `skip_named_entities` estiver ativo.
//!
//! Função pura sobre entradas imutáveis: nenhuma ocorrência copia o token,
//! apenas o referencia.

use std::sync::Arc;

use tracing::debug;

use crate::config::{PosFilter, WsdConfig};
use crate::inventory::{SenseCandidate, SenseInventory};
use crate::token::AnnotatedToken;

/// Um token ambíguo e seus sentidos candidatos (cardinalidade ≥ 2).
#[derive(Debug, Clone)]
pub struct AmbiguousOccurrence<'a> {
    pub token: &'a AnnotatedToken,
    pub candidates: Arc<[SenseCandidate]>,
}

impl AmbiguousOccurrence<'_> {
    /// Posição do token no documento.
    pub fn position(&self) -> usize {
        self.token.position
    }
}

/// Regras de seleção de tokens candidatos à desambiguação.
#[derive(Debug, Clone, Default)]
pub struct AmbiguityDetector {
    pub pos_filter: PosFilter,
    pub skip_named_entities: bool,
}

impl AmbiguityDetector {
    pub fn new(pos_filter: PosFilter, skip_named_entities: bool) -> Self {
        Self {
            pos_filter,
            skip_named_entities,
        }
    }

    pub fn from_config(config: &WsdConfig) -> Self {
        Self::new(config.pos_filter.clone(), config.skip_named_entities)
    }

    /// Devolve as ocorrências ambíguas, na ordem dos tokens.
    pub fn detect<'a>(&self, tokens: &'a [AnnotatedToken], inventory: &dyn SenseInventory) -> Vec<AmbiguousOccurrence<'a>> {
        tokens
            .iter()
            .filter(|token| self.pos_filter.accepts(token.pos))
            .filter(|token| !(self.skip_named_entities && token.is_named_entity()))
            .filter_map(|token| {
                let candidates = inventory.resolve(&token.lookup_key(), token.pos);
                if candidates.len() < 2 {
                    return None;
                }
                debug!(
                    position = token.position,
                    lemma = %token.lemma,
                    pos = %token.pos,
                    candidates = candidates.len(),
                    "Token ambíguo"
                );
                Some(AmbiguousOccurrence { token, candidates })
            })
            .collect()
    }
}

/// Atalho para [`AmbiguityDetector::detect`].
pub fn detect<'a>(
    tokens: &'a [AnnotatedToken],
    inventory: &dyn SenseInventory,
    pos_filter: &PosFilter,
    skip_named_entities: bool,
) -> Vec<AmbiguousOccurrence<'a>> {
    AmbiguityDetector::new(pos_filter.clone(), skip_named_entities).detect(tokens, inventory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::StaticInventory;
    use crate::token::Pos;

    fn inventory() -> StaticInventory {
        let mut inv = StaticInventory::new();
        inv.insert(
            "bancă",
            Pos::Noun,
            vec![SenseCandidate::new("b1", "bani"), SenseCandidate::new("b2", "scaun")],
        );
        inv.insert("vin", Pos::Noun, vec![SenseCandidate::new("v1", "băutură")]);
        inv.insert(
            "o",
            Pos::Determiner,
            vec![SenseCandidate::new("o1", "art"), SenseCandidate::new("o2", "num")],
        );
        inv
    }

    fn tokens() -> Vec<AnnotatedToken> {
        vec![
            AnnotatedToken::new("O", "o", Pos::Determiner, 0),
            AnnotatedToken::new("bancă", "bancă", Pos::Noun, 1),
            AnnotatedToken::new("și", "și", Pos::Conjunction, 2),
            AnnotatedToken::new("vin", "vin", Pos::Noun, 3),
            AnnotatedToken::new("zmeu", "zmeu", Pos::Noun, 4),
        ]
    }

    #[test]
    fn test_only_multi_sense_tokens() {
        let tokens = tokens();
        let found = detect(&tokens, &inventory(), &PosFilter::default(), true);
        let positions: Vec<usize> = found.iter().map(|o| o.position()).collect();
        assert_eq!(positions, vec![1]);
        assert!(found.iter().all(|o| o.candidates.len() >= 2));
    }

    #[test]
    fn test_pos_filter_controls_closed_classes() {
        let tokens = tokens();
        let inv = inventory();
        let permissive = detect(&tokens, &inv, &PosFilter::permissive(), true);
        assert_eq!(permissive.iter().map(|o| o.position()).collect::<Vec<_>>(), vec![0, 1]);

        let deny_nouns = PosFilter {
            allow: vec![],
            deny: vec![Pos::Noun],
        };
        let found = detect(&tokens, &inv, &deny_nouns, true);
        assert_eq!(found.iter().map(|o| o.position()).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_named_entities_skipped() {
        let tokens = vec![AnnotatedToken::new("Banca", "bancă", Pos::Noun, 0).with_entity("ORGANIZATION")];
        let inv = inventory();
        assert!(detect(&tokens, &inv, &PosFilter::default(), true).is_empty());
        assert_eq!(detect(&tokens, &inv, &PosFilter::default(), false).len(), 1);
    }

    #[test]
    fn test_occurrence_references_token() {
        let tokens = tokens();
        let found = detect(&tokens, &inventory(), &PosFilter::default(), true);
        assert!(std::ptr::eq(found[0].token, &tokens[1]));
    }
}
