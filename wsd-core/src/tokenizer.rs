//! # Tokenizador para Română
//!
//! Responsável por dividir o texto bruto em tokens (palavras, pontuações) quando
//! o serviço Teprolin não está configurado. Cada token preserva sua posição
//! original no texto (offset).
//!
//! ## Esquema de Tokenização
//!
//! - Palavras separadas por espaços/pontuações.
//! - Abreviações comuns (`dl.`, `dna.`, `nr.`) mantêm o ponto.
//! - Números decimais (`3,5` / `1.234`) ficam inteiros.
//! - Clíticos com hífen são separados como no Teprolin: `m-am` → `m-`, `am`;
//!   `într-o` → `într-`, `o`. Compostos (`bine-cunoscut`) ficam juntos.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use wsd_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("M-am dus la bancă.");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, vec!["M-", "am", "dus", "la", "bancă", "."]);
//! ```

use serde::{Deserialize, Serialize};

/// Um token extraído do texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token (ex: "bancă", ",", "m-").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
}

/// Abreviações comuns em romeno que não devem ter o ponto tratado como fim de sentença
const ABBREVIATIONS: &[&str] = &[
    "dl", "Dl", "dna", "Dna", "dra", "Dra", "dr", "Dr", "prof", "Prof", "ing", "Ing",
    "nr", "Nr", "str", "Str", "bd", "Bd", "etc", "ex", "pag", "p", "art", "alin",
    "lit", "cap", "vol", "sec", "km", "cm", "mm", "kg", "mg", "ml", "ha", "tel", "jud",
];

/// Clíticos que se separam pelo hífen (a parte da esquerda fica com o hífen).
const CLITICS: &[&str] = &[
    "m", "s", "l", "n", "i", "v", "c", "ne", "te", "mi", "ți", "și", "le", "o", "a",
    "ai", "am", "au", "ați", "aș", "ar", "îl", "îi", "într", "dintr", "printr", "nu",
];

/// Tokeniza um texto romeno.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = split_clitics(tokenize_standard(text));

    // Re-indexa os tokens
    for (i, token) in tokens.iter_mut().enumerate() {
        token.index = i;
    }
    tokens
}

/// Separa palavras com hífen quando uma das partes é um clítico.
fn split_clitics(tokens: Vec<Token>) -> Vec<Token> {
    let mut expanded = Vec::with_capacity(tokens.len());

    for token in tokens {
        let Some(hyphen) = token.text.find('-') else {
            expanded.push(token);
            continue;
        };
        let left = &token.text[..hyphen];
        let right = &token.text[hyphen + 1..];

        let left_lower = left.to_lowercase();
        let right_head = right.split('-').next().unwrap_or(right).to_lowercase();
        let is_clitic = !left.is_empty()
            && !right.is_empty()
            && (CLITICS.contains(&left_lower.as_str()) || CLITICS.contains(&right_head.as_str()));

        if !is_clitic {
            expanded.push(token);
            continue;
        }

        // Parte esquerda leva o hífen (1 byte)
        let split = token.start + left.len() + 1;
        expanded.push(Token {
            text: format!("{left}-"),
            start: token.start,
            end: split,
            index: 0,
        });
        // A parte direita pode ter outro clítico ("dă-mi-l")
        let rest = Token {
            text: right.to_string(),
            start: split,
            end: token.end,
            index: 0,
        };
        expanded.extend(split_clitics(vec![rest]));
    }

    expanded
}

fn tokenize_standard(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current_start = 0;
    let mut current_text = String::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (byte_pos, ch) = chars[i];

        let next_is_alnum = chars.get(i + 1).map(|(_, c)| c.is_alphanumeric()).unwrap_or(false);

        if ch.is_alphanumeric() || (ch == '-' && !current_text.is_empty() && next_is_alnum) {
            if current_text.is_empty() {
                current_start = byte_pos;
            }
            current_text.push(ch);
        } else if (ch == '.' || ch == ',') && !current_text.is_empty() {
            let is_abbrev = ch == '.' && ABBREVIATIONS.contains(&current_text.as_str());
            let current_is_num = current_text.chars().all(char::is_numeric);
            let next_is_num = chars.get(i + 1).map(|(_, c)| c.is_numeric()).unwrap_or(false);

            if is_abbrev || (current_is_num && next_is_num) {
                current_text.push(ch);
            } else {
                flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
                push_token(&mut tokens, ch.to_string(), byte_pos, byte_pos + 1);
            }
        } else if ch.is_whitespace() {
            flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
        } else if ch == '.' && tokens.last().is_some_and(|t: &Token| t.end == byte_pos && t.text.chars().all(|c| c == '.')) {
            // Reticências "..." viram um único token
            if let Some(last) = tokens.last_mut() {
                last.text.push('.');
                last.end = byte_pos + 1;
            }
        } else {
            flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
            push_token(&mut tokens, ch.to_string(), byte_pos, byte_pos + ch.len_utf8());
        }
        i += 1;
    }

    flush_token(&mut tokens, &mut current_text, current_start, text.len());

    tokens
}

/// Fecha o token acumulado e adiciona à lista (se não vazio)
fn flush_token(tokens: &mut Vec<Token>, text: &mut String, start: usize, end: usize) {
    if !text.is_empty() {
        tokens.push(Token {
            text: text.clone(),
            start,
            end,
            index: 0, // será atribuído depois
        });
        text.clear();
    }
}

/// Adiciona um token de pontuação diretamente
fn push_token(tokens: &mut Vec<Token>, text: String, start: usize, end: usize) {
    tokens.push(Token { text, start, end, index: 0 });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(texts("Merg la masă."), vec!["Merg", "la", "masă", "."]);
    }

    #[test]
    fn test_tokenize_clitics() {
        assert_eq!(texts("M-am așezat"), vec!["M-", "am", "așezat"]);
        assert_eq!(texts("într-o zi"), vec!["într-", "o", "zi"]);
        assert_eq!(texts("dă-mi-l"), vec!["dă-", "mi-", "l"]);
    }

    #[test]
    fn test_tokenize_keeps_compounds() {
        assert_eq!(texts("un autor bine-cunoscut"), vec!["un", "autor", "bine-cunoscut"]);
    }

    #[test]
    fn test_tokenize_abbreviation_and_numbers() {
        assert_eq!(texts("Dl. Popescu are 3,5 lei."), vec!["Dl.", "Popescu", "are", "3,5", "lei", "."]);
    }

    #[test]
    fn test_tokenize_offsets() {
        let text = "Ion a luat o notă.";
        for token in tokenize(text) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn test_tokenize_ellipsis() {
        assert_eq!(texts("Ei bine..."), vec!["Ei", "bine", "..."]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("   ").is_empty());
    }
}
