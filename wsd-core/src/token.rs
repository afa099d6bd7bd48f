//! # Tokens Anotados e Classes Gramaticais
//!
//! Define o contrato de saída do adaptador de anotação: cada token traz a forma
//! de superfície, o lema, a classe gramatical normalizada ([`Pos`]) e a etiqueta
//! morfossintática bruta (MSD) devolvida pelo serviço externo.
//!
//! ## Normalização de POS
//!
//! O serviço Teprolin devolve etiquetas MULTEXT-East (ex: `Ncfsry`, `Vmis3s`),
//! enquanto outras fontes usam nomes UPOS (`NOUN`, `VERB`). Ambas convergem para
//! o mesmo [`Pos`], que é a chave usada no inventário de sentidos.
//!
//! | MSD | UPOS          | Pos            | Exemplo     |
//! |-----|---------------|----------------|-------------|
//! | N   | NOUN / PROPN  | `Noun`         | bancă, masă |
//! | V   | VERB / AUX    | `Verb`         | a merge     |
//! | A   | ADJ           | `Adjective`    | mare        |
//! | R   | ADV           | `Adverb`       | bine        |
//! | D,T | DET           | `Determiner`   | un, acest   |
//! | P   | PRON          | `Pronoun`      | el, ce      |
//! | S   | ADP           | `Adposition`   | la, pe      |
//! | C   | CCONJ / SCONJ | `Conjunction`  | și, că      |
//! | M   | NUM           | `Numeral`      | doi         |
//! | Q   | PART          | `Particle`     | să, nu      |
//! | I   | INTJ          | `Interjection` | vai         |
//! | Z   | PUNCT         | `Punctuation`  | . , ?       |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Classe gramatical normalizada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pos {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Determiner,
    Pronoun,
    Adposition,
    Conjunction,
    Numeral,
    Particle,
    Interjection,
    Punctuation,
    Other,
}

impl Pos {
    /// Todas as classes, na ordem canônica.
    pub const ALL: [Pos; 13] = [
        Pos::Noun,
        Pos::Verb,
        Pos::Adjective,
        Pos::Adverb,
        Pos::Determiner,
        Pos::Pronoun,
        Pos::Adposition,
        Pos::Conjunction,
        Pos::Numeral,
        Pos::Particle,
        Pos::Interjection,
        Pos::Punctuation,
        Pos::Other,
    ];

    /// Classes de conteúdo (lexicais), as únicas ambíguas por padrão.
    pub const CONTENT: [Pos; 4] = [Pos::Noun, Pos::Verb, Pos::Adjective, Pos::Adverb];

    /// Nome UPOS da classe (para serialização e UI)
    pub fn name(&self) -> &'static str {
        match self {
            Pos::Noun => "NOUN",
            Pos::Verb => "VERB",
            Pos::Adjective => "ADJ",
            Pos::Adverb => "ADV",
            Pos::Determiner => "DET",
            Pos::Pronoun => "PRON",
            Pos::Adposition => "ADP",
            Pos::Conjunction => "CONJ",
            Pos::Numeral => "NUM",
            Pos::Particle => "PART",
            Pos::Interjection => "INTJ",
            Pos::Punctuation => "PUNCT",
            Pos::Other => "X",
        }
    }

    /// Reconhece apenas nomes de classe (UPOS ou nome por extenso, sem MSD).
    pub fn from_name(name: &str) -> Option<Pos> {
        match name.trim().to_uppercase().as_str() {
            "NOUN" | "PROPN" | "N" => Some(Pos::Noun),
            "VERB" | "AUX" | "V" => Some(Pos::Verb),
            "ADJ" | "ADJECTIVE" | "A" => Some(Pos::Adjective),
            "ADV" | "ADVERB" | "R" => Some(Pos::Adverb),
            "DET" | "DETERMINER" => Some(Pos::Determiner),
            "PRON" | "PRONOUN" => Some(Pos::Pronoun),
            "ADP" | "ADPOSITION" | "PREP" => Some(Pos::Adposition),
            "CONJ" | "CCONJ" | "SCONJ" | "CONJUNCTION" => Some(Pos::Conjunction),
            "NUM" | "NUMERAL" => Some(Pos::Numeral),
            "PART" | "PARTICLE" => Some(Pos::Particle),
            "INTJ" | "INTERJECTION" => Some(Pos::Interjection),
            "PUNCT" | "PUNCTUATION" => Some(Pos::Punctuation),
            "X" | "OTHER" | "SYM" => Some(Pos::Other),
            _ => None,
        }
    }

    /// Normaliza uma etiqueta arbitrária (UPOS, nome em inglês ou MSD MULTEXT-East).
    ///
    /// Nunca falha: etiquetas desconhecidas viram [`Pos::Other`].
    pub fn normalize(tag: &str) -> Pos {
        let tag = tag.trim();
        if tag.is_empty() {
            return Pos::Other;
        }

        if let Some(pos) = Pos::from_name(tag) {
            return pos;
        }

        let upper = tag.to_uppercase();

        // Etiquetas do corpus (_ctg) para pontuação: PERIOD, COMMA, QUEST, ...
        if matches!(
            upper.as_str(),
            "PERIOD" | "COMMA" | "QUEST" | "EXCL" | "COLON" | "SCOLON" | "DASH" | "LPAR" | "RPAR" | "QUOT" | "DBLQ"
        ) {
            return Pos::Punctuation;
        }

        // MSD MULTEXT-East: a primeira letra define a categoria
        match tag.chars().next() {
            Some('N') => Pos::Noun,
            Some('V') => Pos::Verb,
            Some('A') => Pos::Adjective,
            Some('R') => Pos::Adverb,
            Some('D') | Some('T') => Pos::Determiner,
            Some('P') => Pos::Pronoun,
            Some('S') => Pos::Adposition,
            Some('C') => Pos::Conjunction,
            Some('M') => Pos::Numeral,
            Some('Q') => Pos::Particle,
            Some('I') => Pos::Interjection,
            Some('Z') => Pos::Punctuation,
            _ => Pos::Other,
        }
    }

    /// Classe aberta (substantivo, verbo, adjetivo, advérbio)?
    pub fn is_content(&self) -> bool {
        Pos::CONTENT.contains(self)
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Pontuação que encerra uma sentença.
const SENTENCE_FINAL: &[&str] = &[".", "!", "?", "…", "...", "?!", "!?"];

/// Um token anotado pelo serviço de pré-processamento.
///
/// Imutável depois de produzido pelo adaptador de anotação. Os estágios
/// seguintes apenas o leem (por referência).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotatedToken {
    /// Forma de superfície, como aparece no texto (ex: "Banca").
    pub surface: String,
    /// Lema / forma de dicionário (ex: "bancă").
    pub lemma: String,
    /// Classe gramatical normalizada.
    pub pos: Pos,
    /// Etiqueta morfossintática bruta (MSD), ex: "Ncfsry".
    #[serde(default)]
    pub msd: String,
    /// Atributos morfológicos decodificados (gênero, número, caso...).
    #[serde(default)]
    pub features: BTreeMap<String, String>,
    /// Índice da sentença no documento (0, 1, 2...).
    #[serde(default)]
    pub sentence: usize,
    /// Índice sequencial do token no documento.
    pub position: usize,
    /// Rótulo de entidade nomeada, se o anotador marcou uma.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

impl AnnotatedToken {
    /// Cria um token sem atributos morfológicos.
    pub fn new(surface: impl Into<String>, lemma: impl Into<String>, pos: Pos, position: usize) -> Self {
        Self {
            surface: surface.into(),
            lemma: lemma.into(),
            pos,
            msd: String::new(),
            features: BTreeMap::new(),
            sentence: 0,
            position,
            entity: None,
        }
    }

    /// Define a etiqueta MSD e decodifica os atributos morfológicos.
    pub fn with_msd(mut self, msd: impl Into<String>) -> Self {
        self.msd = msd.into();
        self.features = decode_msd(&self.msd);
        self
    }

    /// Define o índice da sentença.
    pub fn in_sentence(mut self, sentence: usize) -> Self {
        self.sentence = sentence;
        self
    }

    /// Marca o token como entidade nomeada.
    pub fn with_entity(mut self, label: impl Into<String>) -> Self {
        self.entity = Some(label.into());
        self
    }

    /// Chave de busca no inventário: o lema em minúsculas (ou a forma, se o lema faltar).
    pub fn lookup_key(&self) -> String {
        let base = if self.lemma.trim().is_empty() { &self.surface } else { &self.lemma };
        base.trim().to_lowercase()
    }

    /// O token é pontuação de fim de sentença?
    pub fn is_sentence_final(&self) -> bool {
        SENTENCE_FINAL.contains(&self.surface.as_str())
    }

    pub fn is_named_entity(&self) -> bool {
        self.entity.as_deref().is_some_and(|e| !e.is_empty() && e != "O")
    }
}

/// Reatribui posições sequenciais (0..n) preservando a ordem recebida.
pub fn reindex(tokens: &mut [AnnotatedToken]) {
    for (i, token) in tokens.iter_mut().enumerate() {
        token.position = i;
    }
}

/// Decodifica os atributos mais úteis de uma etiqueta MSD de substantivo/adjetivo/verbo.
///
/// Só cobre as posições estáveis do MULTEXT-East romeno; o resto fica na `msd` bruta.
fn decode_msd(msd: &str) -> BTreeMap<String, String> {
    let chars: Vec<char> = msd.chars().collect();
    let mut features = BTreeMap::new();

    let mut put = |key: &str, value: Option<&str>| {
        if let Some(v) = value {
            features.insert(key.to_string(), v.to_string());
        }
    };

    let gender = |c: char| match c {
        'm' => Some("masc"),
        'f' => Some("fem"),
        'n' => Some("neut"),
        _ => None,
    };
    let number = |c: char| match c {
        's' => Some("sing"),
        'p' => Some("plur"),
        _ => None,
    };

    match chars.first() {
        // N tipo gênero número caso definido
        Some('N') => {
            put("gender", chars.get(2).copied().and_then(gender));
            put("number", chars.get(3).copied().and_then(number));
            put(
                "definite",
                chars.get(5).copied().and_then(|c| match c {
                    'y' => Some("yes"),
                    'n' => Some("no"),
                    _ => None,
                }),
            );
        }
        // V tipo modo tempo pessoa número
        Some('V') => {
            put(
                "mood",
                chars.get(2).copied().and_then(|c| match c {
                    'i' => Some("ind"),
                    's' => Some("subj"),
                    'm' => Some("imp"),
                    'n' => Some("inf"),
                    'p' => Some("part"),
                    'g' => Some("ger"),
                    _ => None,
                }),
            );
            put(
                "person",
                chars.get(4).copied().and_then(|c| match c {
                    '1' => Some("1"),
                    '2' => Some("2"),
                    '3' => Some("3"),
                    _ => None,
                }),
            );
            put("number", chars.get(5).copied().and_then(number));
        }
        // A tipo grau gênero número
        Some('A') => {
            put("gender", chars.get(3).copied().and_then(gender));
            put("number", chars.get(4).copied().and_then(number));
        }
        _ => {}
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_upos() {
        assert_eq!(Pos::normalize("NOUN"), Pos::Noun);
        assert_eq!(Pos::normalize("propn"), Pos::Noun);
        assert_eq!(Pos::normalize("AUX"), Pos::Verb);
        assert_eq!(Pos::normalize("CCONJ"), Pos::Conjunction);
        assert_eq!(Pos::normalize(""), Pos::Other);
    }

    #[test]
    fn test_normalize_msd() {
        assert_eq!(Pos::normalize("Ncfsry"), Pos::Noun);
        assert_eq!(Pos::normalize("Vmis3s"), Pos::Verb);
        assert_eq!(Pos::normalize("Afpfsrn"), Pos::Adjective);
        assert_eq!(Pos::normalize("Tifsr"), Pos::Determiner);
        assert_eq!(Pos::normalize("Spsa"), Pos::Adposition);
        assert_eq!(Pos::normalize("PERIOD"), Pos::Punctuation);
    }

    #[test]
    fn test_decode_msd_noun() {
        let token = AnnotatedToken::new("Banca", "bancă", Pos::Noun, 0).with_msd("Ncfsry");
        assert_eq!(token.features.get("gender").map(String::as_str), Some("fem"));
        assert_eq!(token.features.get("number").map(String::as_str), Some("sing"));
        assert_eq!(token.features.get("definite").map(String::as_str), Some("yes"));
    }

    #[test]
    fn test_lookup_key_falls_back_to_surface() {
        let token = AnnotatedToken::new("Masa", "", Pos::Noun, 0);
        assert_eq!(token.lookup_key(), "masa");
        let token = AnnotatedToken::new("Masa", "Masă", Pos::Noun, 0);
        assert_eq!(token.lookup_key(), "masă");
    }

    #[test]
    fn test_named_entity_flag() {
        let token = AnnotatedToken::new("Ion", "Ion", Pos::Noun, 0);
        assert!(!token.is_named_entity());
        assert!(token.clone().with_entity("PER").is_named_entity());
        assert!(!token.with_entity("O").is_named_entity());
    }

    #[test]
    fn test_reindex() {
        let mut tokens = vec![
            AnnotatedToken::new("a", "a", Pos::Other, 7),
            AnnotatedToken::new("b", "b", Pos::Other, 3),
        ];
        reindex(&mut tokens);
        assert_eq!(tokens[0].position, 0);
        assert_eq!(tokens[1].position, 1);
        assert_eq!(tokens[1].surface, "b");
    }
}
