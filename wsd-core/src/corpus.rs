//! # Dados Embutidos: Inventário de Demonstração e Textos de Exemplo
//!
//! Inventário de sentidos mínimo para as palavras ambíguas clássicas do romeno
//! (bancă, masă, notă, cal, broască, lac, vin, toc, mare, leu) e os textos de
//! demonstração usados pela interface web.
//!
//! As glosas são curtas e escritas com o vocabulário que costuma aparecer ao
//! redor de cada sentido. O vetorizador local ([`crate::hashing`]) depende
//! dessa sobreposição lexical para funcionar sem um modelo pré-treinado.

use crate::token::Pos;

/// Um sentido embutido: `(id, glosa, sinônimos, exemplos)`.
pub type SenseRow = (&'static str, &'static str, &'static [&'static str], &'static [&'static str]);

/// Uma entrada do inventário embutido.
pub struct LexiconEntry {
    pub lemma: &'static str,
    pub pos: Pos,
    /// Sentidos na ordem canônica (a mais frequente primeiro).
    pub senses: &'static [SenseRow],
}

/// Inventário de demonstração.
pub fn builtin_lexicon() -> Vec<LexiconEntry> {
    vec![
        LexiconEntry {
            lemma: "bancă",
            pos: Pos::Noun,
            senses: &[
                (
                    "bancă.n.01",
                    "instituție financiară care păstrează bani, acordă credite și împrumuturi clienților",
                    &["instituție bancară", "bancă comercială"],
                    &["Am deschis un cont la bancă."],
                ),
                (
                    "bancă.n.02",
                    "scaun lung de lemn pe care pot sta mai multe persoane în parc sau la școală",
                    &["bancă", "laviță", "scaun"],
                    &["Ne-am așezat pe o bancă în parc."],
                ),
                (
                    "bancă.n.03",
                    "mal sau banc de nisip la marginea unui râu",
                    &["mal", "țărm"],
                    &[],
                ),
            ],
        },
        LexiconEntry {
            lemma: "masă",
            pos: Pos::Noun,
            senses: &[
                (
                    "masă.n.01",
                    "mobilă cu picioare și blat pe care se pun farfurii, cărți sau obiecte",
                    &["tabla", "birou"],
                    &["Cartea este pe masă."],
                ),
                (
                    "masă.n.02",
                    "mâncarea servită la prânz sau cină, ospăț",
                    &["prânz", "cină", "ospăț"],
                    &["Am luat masa de prânz acasă."],
                ),
                (
                    "masă.n.03",
                    "cantitate de materie a unui corp, măsurată în kilograme",
                    &["greutate"],
                    &["Masa corpului se măsoară în kilograme."],
                ),
            ],
        },
        LexiconEntry {
            lemma: "notă",
            pos: Pos::Noun,
            senses: &[
                (
                    "notă.n.01",
                    "calificativ sau cifră acordată de profesor la școală pentru un examen",
                    &["calificativ", "punctaj"],
                    &["A luat nota zece la examen."],
                ),
                (
                    "notă.n.02",
                    "sunet muzical scris pe portativ, do re mi fa sol",
                    &["ton", "sunet"],
                    &[],
                ),
                (
                    "notă.n.03",
                    "nota de plată la restaurant, socoteala pentru consumație",
                    &["factură", "socoteală"],
                    &["Chelnerul a adus nota de plată."],
                ),
            ],
        },
        LexiconEntry {
            lemma: "cal",
            pos: Pos::Noun,
            senses: &[
                (
                    "cal.n.01",
                    "animal domestic erbivor folosit la călărie și tracțiune, care aleargă și nechează",
                    &["armăsar", "iapă", "mânz"],
                    &["Calul aleargă pe câmp."],
                ),
                (
                    "cal.n.02",
                    "aparat de gimnastică cu mânere pe care sportivul execută sărituri",
                    &["capră de gimnastică"],
                    &[],
                ),
                (
                    "cal.n.03",
                    "piesă de șah care sare în formă de L pe tablă",
                    &[],
                    &[],
                ),
            ],
        },
        LexiconEntry {
            lemma: "broască",
            pos: Pos::Noun,
            senses: &[
                (
                    "broască.n.01",
                    "animal amfibian mic care sare și orăcăie lângă lac sau baltă",
                    &["brotac", "broscoi"],
                    &["O broască sare în baltă."],
                ),
                (
                    "broască.n.02",
                    "mecanism de închidere al ușii, încuietoare în care intră cheia",
                    &["încuietoare", "yală"],
                    &["Cheia s-a blocat în broasca ușii."],
                ),
            ],
        },
        LexiconEntry {
            lemma: "lac",
            pos: Pos::Noun,
            senses: &[
                (
                    "lac.n.01",
                    "întindere mare de apă stătătoare înconjurată de uscat",
                    &["iaz", "baltă"],
                    &["Ne-am plimbat cu barca pe lac."],
                ),
                (
                    "lac.n.02",
                    "soluție lucioasă cu care se acoperă lemnul, metalul sau unghiile",
                    &["vopsea", "lac de unghii"],
                    &[],
                ),
            ],
        },
        LexiconEntry {
            lemma: "vin",
            pos: Pos::Noun,
            senses: &[
                (
                    "vin.n.01",
                    "băutură alcoolică obținută din struguri fermentați, roșu sau alb",
                    &["licoare"],
                    &["Un pahar de vin roșu."],
                ),
            ],
        },
        LexiconEntry {
            lemma: "veni",
            pos: Pos::Verb,
            senses: &[
                (
                    "veni.v.01",
                    "a se deplasa spre locul unde se află vorbitorul, a sosi",
                    &["sosi", "ajunge"],
                    &["Vin acasă diseară."],
                ),
                (
                    "veni.v.02",
                    "a proveni, a avea originea într-un loc",
                    &["proveni"],
                    &[],
                ),
            ],
        },
        LexiconEntry {
            lemma: "toc",
            pos: Pos::Noun,
            senses: &[
                (
                    "toc.n.01",
                    "partea de jos și înaltă a pantofului, sub călcâi",
                    &["talpă"],
                    &["Pantofi cu toc înalt."],
                ),
                (
                    "toc.n.02",
                    "cutie sau husă în care se păstrează ochelarii sau creioanele",
                    &["etui", "husă"],
                    &["Pune ochelarii în toc."],
                ),
                (
                    "toc.n.03",
                    "instrument de scris cu peniță și cerneală",
                    &["stilou", "peniță"],
                    &[],
                ),
            ],
        },
        LexiconEntry {
            lemma: "mare",
            pos: Pos::Noun,
            senses: &[
                (
                    "mare.n.01",
                    "întindere vastă de apă sărată cu valuri, plajă și țărm",
                    &["ocean"],
                    &["Vara mergem la mare."],
                ),
                (
                    "mare.n.02",
                    "cantitate foarte mare, mulțime nesfârșită",
                    &["mulțime"],
                    &["O mare de oameni."],
                ),
            ],
        },
        LexiconEntry {
            lemma: "mare",
            pos: Pos::Adjective,
            senses: &[
                (
                    "mare.a.01",
                    "care are dimensiuni sau cantitate peste medie",
                    &["înalt", "vast", "întins"],
                    &["O casă mare."],
                ),
                (
                    "mare.a.02",
                    "important, celebru sau de valoare deosebită",
                    &["important", "însemnat"],
                    &["Un mare poet."],
                ),
            ],
        },
        LexiconEntry {
            lemma: "leu",
            pos: Pos::Noun,
            senses: &[
                (
                    "leu.n.01",
                    "animal sălbatic carnivor din Africa, cu coamă, regele animalelor",
                    &["felină"],
                    &["Leul doarme în savană."],
                ),
                (
                    "leu.n.02",
                    "unitatea monetară a României, bani folosiți la plată",
                    &["monedă", "ban"],
                    &["Costă zece lei."],
                ),
            ],
        },
    ]
}

/// Textos de demonstração para a interface web: `(título, texto)`.
pub fn demo_texts() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Bancă",
            "Banca a refuzat împrumutul pentru că nu credeau că aș putea conduce o afacere de succes. \
             Între timp, îmi place să stau pe o bancă în parc pentru a-mi limpezi mintea.",
        ),
        (
            "Cal",
            "Calul aleargă pe câmp și nechează. La sala de sport, gimnastul a sărit peste cal.",
        ),
        (
            "Broască",
            "O broască sare în baltă lângă lac. Cheia s-a blocat în broasca ușii.",
        ),
        (
            "Masă",
            "Am pus farfuriile pe masă pentru cină. Masa corpului se măsoară în kilograme.",
        ),
        (
            "Notă",
            "Profesorul i-a dat o notă mare la examen. Chelnerul a adus nota de plată la restaurant.",
        ),
        (
            "Leu",
            "Leul doarme în savana din Africa. Biletul costă zece lei.",
        ),
    ]
}
