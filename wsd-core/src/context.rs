//! # Extrator de Contexto
//!
//! Monta, para cada ocorrência ambígua, a janela de tokens usada como evidência.
//!
//! - `Tokens(n)`: `n` tokens à esquerda e `n` à direita, cortados nas bordas
//!   do documento (sem padding, sem wraparound). O próprio token fica na janela.
//!   Só as bordas do documento cortam: a janela atravessa fins de sentença.
//!   Quem quer contexto restrito à sentença usa `Sentence`.
//! - `Sentence`: a sentença inteira, delimitada pela pontuação de fim de
//!   sentença vinda da anotação.
//!
//! Uma janela menor que a pedida (ocorrência perto da borda) é usada como está.

use serde::{Deserialize, Serialize};

use crate::config::ContextSpan;
use crate::detector::AmbiguousOccurrence;
use crate::token::AnnotatedToken;

/// Janela de contexto de uma ocorrência. Imutável depois de construída.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Posição do token ambíguo.
    pub center: usize,
    /// Primeira posição da janela (inclusiva).
    pub start: usize,
    /// Última posição da janela (exclusiva).
    pub end: usize,
    /// Formas de superfície dos tokens da janela, em ordem.
    pub surfaces: Vec<String>,
}

impl ContextWindow {
    /// Texto da janela: as formas unidas por espaço.
    pub fn text(&self) -> String {
        self.surfaces.join(" ")
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

/// Extrai a janela de `occurrence` dentro de `tokens`.
///
/// Usa a posição do token como índice em `tokens` (o pipeline garante
/// `tokens[i].position == i`).
pub fn extract(occurrence: &AmbiguousOccurrence<'_>, tokens: &[AnnotatedToken], span: ContextSpan) -> ContextWindow {
    window_at(occurrence.position(), tokens, span)
}

/// Janela centrada em `center`.
pub fn window_at(center: usize, tokens: &[AnnotatedToken], span: ContextSpan) -> ContextWindow {
    if tokens.is_empty() {
        return ContextWindow {
            center,
            start: 0,
            end: 0,
            surfaces: vec![],
        };
    }
    let center = center.min(tokens.len() - 1);

    let (start, end) = match span {
        ContextSpan::Tokens(n) => (center.saturating_sub(n), (center + n + 1).min(tokens.len())),
        ContextSpan::Sentence => sentence_bounds(center, tokens),
    };

    ContextWindow {
        center,
        start,
        end,
        surfaces: tokens[start..end].iter().map(|t| t.surface.clone()).collect(),
    }
}

/// Limites da sentença que contém `center`: começa depois da pontuação final
/// anterior e termina na próxima (inclusive).
fn sentence_bounds(center: usize, tokens: &[AnnotatedToken]) -> (usize, usize) {
    let start = tokens[..center]
        .iter()
        .rposition(AnnotatedToken::is_sentence_final)
        .map_or(0, |i| i + 1);

    let end = tokens[center..]
        .iter()
        .position(AnnotatedToken::is_sentence_final)
        .map_or(tokens.len(), |i| center + i + 1);

    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Pos;

    fn doc(words: &[&str]) -> Vec<AnnotatedToken> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| AnnotatedToken::new(*w, w.to_lowercase(), Pos::Noun, i))
            .collect()
    }

    #[test]
    fn test_token_window_centered() {
        let tokens = doc(&["a", "b", "c", "d", "e", "f", "g"]);
        let w = window_at(3, &tokens, ContextSpan::Tokens(2));
        assert_eq!(w.text(), "b c d e f");
        assert_eq!((w.start, w.end), (1, 6));
    }

    #[test]
    fn test_token_window_clipped_at_edges() {
        let tokens = doc(&["a", "b", "c", "d"]);
        let w = window_at(0, &tokens, ContextSpan::Tokens(5));
        assert_eq!(w.text(), "a b c d");
        let w = window_at(3, &tokens, ContextSpan::Tokens(1));
        assert_eq!(w.text(), "c d");
    }

    #[test]
    fn test_token_window_crosses_sentence_end() {
        let tokens = doc(&["Stau", "pe", "bancă", ".", "Banca", "dă", "credite", "!"]);
        let w = window_at(2, &tokens, ContextSpan::Tokens(4));
        assert_eq!(w.text(), "Stau pe bancă . Banca dă credite");
        assert_eq!((w.start, w.end), (0, 7));
    }

    #[test]
    fn test_sentence_window() {
        let tokens = doc(&["Stau", "pe", "bancă", ".", "Banca", "dă", "credite", "!", "Gata"]);
        assert_eq!(window_at(2, &tokens, ContextSpan::Sentence).text(), "Stau pe bancă .");
        assert_eq!(window_at(4, &tokens, ContextSpan::Sentence).text(), "Banca dă credite !");
        // última sentença sem pontuação final
        assert_eq!(window_at(8, &tokens, ContextSpan::Sentence).text(), "Gata");
    }

    #[test]
    fn test_sentence_window_without_punctuation_is_whole_document() {
        let tokens = doc(&["un", "cal", "alb"]);
        let w = window_at(1, &tokens, ContextSpan::Sentence);
        assert_eq!((w.start, w.end), (0, 3));
    }

    #[test]
    fn test_empty_document() {
        let w = window_at(0, &[], ContextSpan::Tokens(5));
        assert!(w.is_empty());
        assert_eq!(w.text(), "");
    }
}
