//! The fixed translation glossary and the protected-terms list.
//!
//! Glossary renderings feed the translator and QA system prompts; the
//! protected terms bind the stylist, which may rework everything else but
//! must never generalize these away.

pub struct GlossaryEntry {
    pub persian: &'static str,
    pub transliteration: &'static str,
    pub english: &'static str,
    pub note: &'static str,
}

pub const GLOSSARY: &[GlossaryEntry] = &[
    GlossaryEntry {
        persian: "عشق",
        transliteration: "ishq",
        english: "Love",
        note: "capital L for divine/cosmic love",
    },
    GlossaryEntry {
        persian: "معشوق",
        transliteration: "ma'shuq",
        english: "the Beloved",
        note: "capital B, keep ambiguous",
    },
    GlossaryEntry {
        persian: "یار",
        transliteration: "yar",
        english: "the Friend",
        note: "capital F",
    },
    GlossaryEntry {
        persian: "جان",
        transliteration: "jan",
        english: "soul",
        note: "",
    },
    GlossaryEntry {
        persian: "دل",
        transliteration: "del",
        english: "heart",
        note: "",
    },
    GlossaryEntry {
        persian: "می",
        transliteration: "mey",
        english: "wine",
        note: "mystical",
    },
    GlossaryEntry {
        persian: "فنا",
        transliteration: "fana",
        english: "annihilation",
        note: "",
    },
    GlossaryEntry {
        persian: "کعبه",
        transliteration: "ka'ba",
        english: "Kaaba",
        note: "",
    },
    GlossaryEntry {
        persian: "حج",
        transliteration: "hajj",
        english: "Hajj",
        note: "",
    },
    GlossaryEntry {
        persian: "نی",
        transliteration: "ney",
        english: "reed-flute",
        note: "",
    },
    GlossaryEntry {
        persian: "شمس",
        transliteration: "Shams",
        english: "Shams",
        note: "proper noun",
    },
];

/// Terms the stylist must keep verbatim, never softened or genericized.
pub const PROTECTED_TERMS: &[&str] = &[
    "Hajj",
    "Kaaba",
    "the Beloved",
    "the Friend",
    "Shams",
    "ruku'",
    "sajda",
];

/// Glossary as a prompt-ready bullet block.
#[must_use]
pub fn glossary_block() -> String {
    GLOSSARY
        .iter()
        .map(|e| {
            if e.note.is_empty() {
                format!("- {} ({}) → \"{}\"", e.persian, e.transliteration, e.english)
            } else {
                format!(
                    "- {} ({}) → \"{}\" ({})",
                    e.persian, e.transliteration, e.english, e.note
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Protected terms as a prompt-ready bullet block.
#[must_use]
pub fn protected_terms_block() -> String {
    PROTECTED_TERMS
        .iter()
        .map(|t| format!("- \"{t}\""))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glossary_block_lists_every_entry() {
        let block = glossary_block();
        assert_eq!(block.lines().count(), GLOSSARY.len());
        assert!(block.contains("\"the Beloved\" (capital B, keep ambiguous)"));
        assert!(block.contains("- جان (jan) → \"soul\""));
    }

    #[test]
    fn protected_terms_block_quotes_terms() {
        let block = protected_terms_block();
        assert!(block.contains("- \"Kaaba\""));
        assert_eq!(block.lines().count(), PROTECTED_TERMS.len());
    }
}
