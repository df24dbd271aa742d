//! Prompt builders for the four stages.
//!
//! Each builder is pure: identical inputs render byte-identical instruction
//! text. System instructions are fixed templates; user instructions are
//! rendered per poem from the source verses and upstream stage records.

use crate::ghazal::Ghazal;
use crate::glossary::{glossary_block, protected_terms_block};
use crate::stages::{AnalysisResponse, LiteralVerse, StylistResponse};

pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (k, v) in vars {
        let pat = format!("{{{{{k}}}}}");
        out = out.replace(&pat, v);
    }
    out
}

pub const ANALYZER_SYSTEM: &str = r#"You are a scholarly analyst of classical Persian Sufi poetry, specializing in Rumi's Divan-e Kabir. Your task is to analyze Persian ghazals to prepare them for translation.

## Your Analysis Must Include:

1. **Grammatical Structure**: Note any unusual constructions, archaic forms, or ambiguous syntax.

2. **Quranic Allusions**: Identify any references to Quranic verses. Provide:
   - The Arabic/Persian phrase
   - The surah:ayah reference
   - Brief explanation of how Rumi uses it

3. **Hadith References**: Note any references to sayings of the Prophet Muhammad.

4. **Sufi Terminology**: Identify technical Sufi terms and their meanings in context:
   - fana (annihilation), baqa (subsistence), sama' (spiritual audition)
   - hal (spiritual state), maqam (station), dhikr (remembrance)
   - etc.

5. **Ambiguities**: Flag phrases with multiple valid readings. In Persian mystical poetry, ambiguity is often intentional:
   - "یار" (yar) could mean God, Shams, or human beloved
   - "می" (wine) is mystical intoxication, not literal
   - Note where the translator must preserve (not resolve) ambiguity

6. **Wordplay**: Identify puns, double meanings, and sound patterns:
   - "هوا" means both "air" and "desire"
   - "شمس" is both "sun" and Shams al-Din Tabrizi
   - Note where wordplay cannot be preserved in English

7. **Meter Effects**: How does the meter (rhythm) affect meaning or emphasis?

8. **Arabic Content**: Identify any Arabic text within the Persian:
   - Type: Quranic quotation, hadith, phrase, or full verse
   - Provide standard translation for Quranic verses

9. **Historical/Cultural Context**: Note references to:
   - Specific people (Shams, other Sufis)
   - Places (Konya, Tabriz, etc.)
   - Islamic practices or concepts

## Output Format

Respond with a JSON object (no markdown code blocks, just raw JSON):

{
  "grammatical_notes": "...",
  "quranic_allusions": [
    {"phrase": "...", "reference": "Quran X:Y", "meaning": "...", "rumi_usage": "..."}
  ],
  "hadith_references": [
    {"phrase": "...", "source": "...", "meaning": "..."}
  ],
  "sufi_terminology": [
    {"term": "...", "persian": "...", "meaning_in_context": "..."}
  ],
  "ambiguities": [
    {"phrase": "...", "possible_readings": ["...", "..."], "recommendation": "..."}
  ],
  "wordplay": [
    {"word": "...", "meanings": ["...", "..."], "translatable": true/false, "note": "..."}
  ],
  "meter": "...",
  "meter_effects": "...",
  "arabic_content": {
    "has_arabic": true/false,
    "segments": [
      {"text": "...", "type": "quranic|hadith|phrase", "reference": "...", "standard_translation": "..."}
    ]
  },
  "historical_context": "...",
  "translation_challenges": ["...", "..."],
  "key_images": ["...", "..."]
}"#;

const TRANSLATOR_SYSTEM_TEMPLATE: &str = r#"You are a scholarly translator of classical Persian Sufi poetry. Your task is to produce an ACCURATE, LITERAL translation of Rumi's ghazals.

## Your Priority: ACCURACY

At this stage, prioritize accuracy over poetry. The Stylist agent will refine for beauty later.

## Translation Rules:

1. **Preserve Structure**: Translate hemistich by hemistich, preserving the couplet structure.

2. **Use the Glossary Consistently**:
{{glossary}}

3. **Preserve Islamic Context**:
   - Keep "Hajj" not "pilgrimage"
   - Keep "Kaaba" not "sacred house"
   - Keep "prayer" with Islamic connotations
   - Keep "ruku'" and "sajda" for prayer postures

4. **Mark Uncertainty**: Use [?] for uncertain translations.

5. **Flag Multiple Readings**: Where Persian is ambiguous, note alternatives in brackets.

6. **Arabic Content**: For Quranic verses, use established translations (note the source).

7. **Don't Over-Interpret**: Translate what's there. Don't add explanation or interpretation.

## Output Format

Respond with a JSON object (no markdown code blocks, just raw JSON):

{
  "literal_translation": {
    "verses": [
      {
        "verse_number": 1,
        "hemistich1": "English translation...",
        "hemistich2": "English translation..."
      }
    ]
  },
  "translation_notes": [
    {"verse": 1, "note": "..."}
  ],
  "uncertain_passages": [
    {"verse": 1, "phrase": "...", "issue": "...", "alternatives": ["...", "..."]}
  ],
  "glossary_terms_used": ["ishq", "ma'shuq", "..."]
}"#;

const STYLIST_SYSTEM_TEMPLATE: &str = r#"You are a poet refining translations of Rumi's Divan-e Kabir. Your task is to transform accurate but plain translations into poetry that sounds like Rumi in English.

## Rumi's Voice

Rumi's poetry has distinctive characteristics you must preserve:

1. **Direct Address**: "You" and "I" in intimate conversation with the Beloved, the reader, or God.
   - YES: "Come, come, whoever you are!"
   - NO: "One is invited to approach regardless of background."

2. **Ecstatic Urgency**: Short exclamations, imperatives, repetition.
   - YES: "Listen! Listen to the reed-flute!"
   - NO: "Consider attending to the sound of the reed-flute."

3. **Paradox**: Hold contradictions together without resolving them.
   - YES: "I am silent, yet I speak. I am nothing, yet I am everything."
   - NO: "Although I appear silent, I actually communicate."

4. **Embodied Spirituality**: Heart, blood, fire, water, wine, breath.
   - YES: "My heart is on fire—don't throw water on these flames!"
   - NO: "I am experiencing intense spiritual passion."

5. **Contemporary English**: Clear, modern, not Victorian or archaic.
   - YES: "Where are you going? The Beloved is right here!"
   - NO: "Whither dost thou journey? The Beloved abideth herein."

6. **Intensity**: Don't soften, don't explain, don't hedge.
   - YES: "Die! Die in this Love—if you die in this Love, your soul will be renewed."
   - NO: "Consider the metaphorical death of ego, which may lead to spiritual renewal."

## Anti-Patterns to AVOID

- **Academic distance**: "one might observe...", "it could be argued..."
- **New Age vagueness**: "the universe wants...", "your authentic self..."
- **Over-explanation**: Trust the image; don't explain the metaphor
- **Forced rhyme**: Never sacrifice meaning for rhyme
- **Softening**: Don't make Rumi polite or comfortable

## Protected Terms

You must NEVER strip or generalize these:
{{protected_terms}}

Keep prayer postures when referenced, and keep Quranic allusions intact.

## Output Format

Respond with a JSON object (no markdown code blocks, just raw JSON):

{
  "refined_translation": {
    "verses": [
      {
        "verse_number": 1,
        "line1": "Poetic English...",
        "line2": "Poetic English..."
      }
    ],
    "full_text": "Complete poem as flowing text..."
  },
  "stylistic_choices": [
    {"verse": 1, "choice": "...", "rationale": "..."}
  ],
  "preserved_elements": ["list of Islamic/Sufi elements kept"],
  "tone_notes": "Brief note on the overall tone achieved"
}"#;

const QA_SYSTEM_TEMPLATE: &str = r#"You are a quality assurance reviewer for translations of Rumi's Divan-e Kabir. Your task is to catch errors before publication.

## Your Checks:

1. **Semantic Fidelity**: Does the English accurately convey the Persian meaning?
   - Compare against the analysis and literal translation
   - Flag any meaning drift or distortion

2. **No Hallucinations**: Is everything in the translation actually in the original?
   - Flag any additions not present in Persian
   - Flag any omissions of significant content

3. **Islamic Context Preservation**: Are Islamic references intact?
   - "Hajj" not genericized to "pilgrimage" or "journey"
   - "Kaaba" not changed to "sacred place"
   - Prayer references preserved
   - Quranic allusions maintained

4. **Terminology Consistency**: Does it match the glossary?
{{glossary}}

5. **Tone Check**: Does it sound like Rumi?
   - Direct and urgent, not academic
   - Embodied, not abstract
   - Passionate, not tepid
   - Contemporary, not Victorian

6. **Ambiguity Preservation**: Were deliberate ambiguities maintained?
   - "The Beloved" should remain ambiguous (God/Shams/human)
   - Mystical wine should not be explained away

## Confidence Scoring

- **HIGH**: No significant issues; ready for publication
- **MEDIUM**: Minor issues that don't affect core meaning; publish but flag
- **LOW**: Significant issues; needs human review before trusting

## Output Format

Respond with a JSON object (no markdown code blocks, just raw JSON):

{
  "confidence": "high|medium|low",
  "semantic_fidelity": {
    "score": "good|acceptable|poor",
    "issues": []
  },
  "hallucination_check": {
    "additions": [],
    "omissions": []
  },
  "islamic_context": {
    "preserved": true|false,
    "issues": []
  },
  "terminology": {
    "consistent": true|false,
    "issues": []
  },
  "tone": {
    "sounds_like_rumi": true|false,
    "issues": []
  },
  "ambiguity_preservation": {
    "preserved": true|false,
    "issues": []
  },
  "overall_issues": [],
  "suggestions": [],
  "flags_for_human_review": true|false,
  "human_review_reason": "..."
}"#;

#[must_use]
pub fn analyzer_system() -> String {
    ANALYZER_SYSTEM.to_string()
}

#[must_use]
pub fn translator_system() -> String {
    render_template(
        TRANSLATOR_SYSTEM_TEMPLATE,
        &[("glossary", &glossary_block())],
    )
}

#[must_use]
pub fn stylist_system() -> String {
    render_template(
        STYLIST_SYSTEM_TEMPLATE,
        &[("protected_terms", &protected_terms_block())],
    )
}

#[must_use]
pub fn qa_system() -> String {
    render_template(QA_SYSTEM_TEMPLATE, &[("glossary", &glossary_block())])
}

const ANALYZER_USER_TEMPLATE: &str = r#"Analyze the following ghazal from Rumi's Divan-e Kabir.

**Ghazal Number**: {{number}}
**Meter**: {{meter}}
**Rhyme**: {{rhyme}}

**Persian Text**:
{{persian_text}}

Provide a detailed analysis as JSON. Remember:
- Identify ALL Quranic allusions and hadith references
- Flag ambiguities that should be PRESERVED, not resolved
- Note wordplay even if it cannot be translated
- Be specific about Sufi terminology"#;

#[must_use]
pub fn analyzer_prompt(ghazal: &Ghazal) -> String {
    render_template(
        ANALYZER_USER_TEMPLATE,
        &[
            ("number", &ghazal.number.to_string()),
            ("meter", ghazal.meter_label()),
            ("rhyme", ghazal.rhyme_label()),
            ("persian_text", &ghazal.numbered_block()),
        ],
    )
}

const TRANSLATOR_USER_TEMPLATE: &str = r#"Translate the following ghazal from Rumi's Divan-e Kabir.

**Ghazal Number**: {{number}}
**Meter**: {{meter}}

**Persian Text**:
{{persian_text}}

**Analysis Context**:
{{analysis_context}}

Produce an accurate, literal translation. Use the glossary consistently. Mark uncertainties with [?]. Preserve Islamic context (Hajj, Kaaba, prayer postures). Output as JSON."#;

#[must_use]
pub fn translator_prompt(ghazal: &Ghazal, analysis: &AnalysisResponse) -> String {
    render_template(
        TRANSLATOR_USER_TEMPLATE,
        &[
            ("number", &ghazal.number.to_string()),
            ("meter", ghazal.meter_label()),
            ("persian_text", &ghazal.numbered_block()),
            ("analysis_context", &analysis_context(analysis)),
        ],
    )
}

/// Inline restatement of the analysis items that ground the literal
/// translation. Falls back to "No special notes." when the analysis
/// contributes nothing (including when the analyzer stage degraded).
#[must_use]
pub fn analysis_context(analysis: &AnalysisResponse) -> String {
    let mut sections: Vec<String> = Vec::new();

    if !analysis.quranic_allusions.is_empty() {
        let refs: Vec<String> = analysis
            .quranic_allusions
            .iter()
            .map(|a| format!("- {}: {}", a.phrase, a.reference))
            .collect();
        sections.push(format!("**Quranic Allusions**:\n{}", refs.join("\n")));
    }
    if !analysis.sufi_terminology.is_empty() {
        let terms: Vec<String> = analysis
            .sufi_terminology
            .iter()
            .map(|t| format!("- {}: {}", t.term, t.meaning_in_context))
            .collect();
        sections.push(format!("**Sufi Terms**:\n{}", terms.join("\n")));
    }
    if !analysis.ambiguities.is_empty() {
        let ambs: Vec<String> = analysis
            .ambiguities
            .iter()
            .map(|a| format!("- {}: {}", a.phrase, a.possible_readings.join(", ")))
            .collect();
        sections.push(format!("**Ambiguities to Preserve**:\n{}", ambs.join("\n")));
    }
    if !analysis.wordplay.is_empty() {
        let plays: Vec<String> = analysis
            .wordplay
            .iter()
            .map(|w| format!("- {}: {}", w.word, w.meanings.join(", ")))
            .collect();
        sections.push(format!("**Wordplay**:\n{}", plays.join("\n")));
    }

    if sections.is_empty() {
        "No special notes.".to_string()
    } else {
        sections.join("\n\n")
    }
}

const STYLIST_USER_TEMPLATE: &str = r#"Refine this literal translation into poetry that sounds like Rumi.

**Ghazal Number**: {{number}}

**Original Persian** (for reference):
{{persian_text}}

**Literal Translation**:
{{literal_text}}
{{context}}
Transform this into Rumi's voice:
- Direct address and urgency
- Embodied, passionate language
- Contemporary (not Victorian) English
- Preserve ALL Islamic context (Hajj, Kaaba, prayer, etc.)
- Don't soften or over-explain

Output as JSON with the refined translation."#;

#[must_use]
pub fn stylist_prompt(
    ghazal: &Ghazal,
    analysis: &AnalysisResponse,
    literal: &[LiteralVerse],
) -> String {
    let mut key_points: Vec<String> = Vec::new();
    if !analysis.ambiguities.is_empty() {
        let phrases: Vec<&str> = analysis
            .ambiguities
            .iter()
            .map(|a| a.phrase.as_str())
            .collect();
        key_points.push(format!(
            "**Ambiguities to preserve**: {}",
            phrases.join(", ")
        ));
    }
    if !analysis.key_images.is_empty() {
        key_points.push(format!("**Key images**: {}", analysis.key_images.join(", ")));
    }
    let context = if key_points.is_empty() {
        "\n".to_string()
    } else {
        format!("\n**Context**:\n{}\n", key_points.join("\n"))
    };

    render_template(
        STYLIST_USER_TEMPLATE,
        &[
            ("number", &ghazal.number.to_string()),
            ("persian_text", &ghazal.inline_block()),
            ("literal_text", &literal_verse_block(literal)),
            ("context", &context),
        ],
    )
}

/// "Verse N:" block for the literal rendering, mirroring the Persian form.
#[must_use]
pub fn literal_verse_block(literal: &[LiteralVerse]) -> String {
    let mut lines = Vec::with_capacity(literal.len() * 3);
    for (i, v) in literal.iter().enumerate() {
        let n = if v.verse_number > 0 {
            v.verse_number
        } else {
            (i + 1) as u32
        };
        lines.push(format!("Verse {n}:"));
        lines.push(format!("  {}", v.hemistich1));
        lines.push(format!("  {}", v.hemistich2));
    }
    lines.join("\n")
}

const QA_USER_TEMPLATE: &str = r#"Review this translation for quality assurance.

**Ghazal Number**: {{number}}

**Original Persian**:
{{persian_text}}

**Literal Translation**:
{{literal_text}}

**Refined Translation** (to review):
{{refined_text}}

**Analysis Summary**:
{{analysis_summary}}

Check for:
1. Semantic fidelity (does English match Persian meaning?)
2. No hallucinations (nothing added that wasn't there?)
3. Islamic context preserved (Hajj, Kaaba, prayer intact?)
4. Terminology consistent with glossary?
5. Tone sounds like Rumi (urgent, embodied, not academic)?
6. Ambiguities preserved (not over-explained)?

Output your QA assessment as JSON."#;

#[must_use]
pub fn qa_prompt(
    ghazal: &Ghazal,
    analysis: &AnalysisResponse,
    literal: &[LiteralVerse],
    refined: &StylistResponse,
) -> String {
    let literal_text = literal
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let n = if v.verse_number > 0 {
                v.verse_number
            } else {
                (i + 1) as u32
            };
            format!("{n}. {} / {}", v.hemistich1, v.hemistich2)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut points: Vec<String> = Vec::new();
    if !analysis.quranic_allusions.is_empty() {
        points.push(format!(
            "Quranic allusions: {} identified",
            analysis.quranic_allusions.len()
        ));
    }
    if !analysis.sufi_terminology.is_empty() {
        let terms: Vec<&str> = analysis
            .sufi_terminology
            .iter()
            .map(|t| t.term.as_str())
            .collect();
        points.push(format!("Sufi terms: {}", terms.join(", ")));
    }
    if !analysis.ambiguities.is_empty() {
        points.push(format!(
            "Ambiguities: {} to preserve",
            analysis.ambiguities.len()
        ));
    }
    let analysis_summary = if points.is_empty() {
        "Standard ghazal".to_string()
    } else {
        points.join("\n")
    };

    render_template(
        QA_USER_TEMPLATE,
        &[
            ("number", &ghazal.number.to_string()),
            ("persian_text", &ghazal.listed_block()),
            ("literal_text", &literal_text),
            ("refined_text", &refined.rendered_text()),
            ("analysis_summary", &analysis_summary),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghazal::VersePair;
    use crate::stages::{Ambiguity, QuranicAllusion, SufiTerm};

    fn sample_ghazal() -> Ghazal {
        Ghazal {
            number: 441,
            meter: "Ramal".to_string(),
            rhyme: "-am".to_string(),
            verses: vec![VersePair {
                hemistich1: "بیا بیا".to_string(),
                hemistich2: "که تویی".to_string(),
            }],
        }
    }

    #[test]
    fn builders_are_deterministic() {
        let g = sample_ghazal();
        let analysis = AnalysisResponse::default();
        assert_eq!(analyzer_prompt(&g), analyzer_prompt(&g));
        assert_eq!(
            translator_prompt(&g, &analysis),
            translator_prompt(&g, &analysis)
        );
        assert_eq!(translator_system(), translator_system());
    }

    #[test]
    fn analyzer_prompt_carries_verses_and_labels() {
        let p = analyzer_prompt(&sample_ghazal());
        assert!(p.contains("**Ghazal Number**: 441"));
        assert!(p.contains("**Meter**: Ramal"));
        assert!(p.contains("Verse 1:\n  بیا بیا\n  که تویی"));
        assert!(!p.contains("{{"));
    }

    #[test]
    fn empty_analysis_renders_no_special_notes() {
        let p = translator_prompt(&sample_ghazal(), &AnalysisResponse::default());
        assert!(p.contains("**Analysis Context**:\nNo special notes."));
    }

    #[test]
    fn analysis_context_restates_findings() {
        let analysis = AnalysisResponse {
            quranic_allusions: vec![QuranicAllusion {
                phrase: "کن فیکون".to_string(),
                reference: "Quran 2:117".to_string(),
                ..QuranicAllusion::default()
            }],
            sufi_terminology: vec![SufiTerm {
                term: "fana".to_string(),
                meaning_in_context: "annihilation of self".to_string(),
                ..SufiTerm::default()
            }],
            ambiguities: vec![Ambiguity {
                phrase: "یار".to_string(),
                possible_readings: vec!["God".to_string(), "Shams".to_string()],
                ..Ambiguity::default()
            }],
            ..AnalysisResponse::default()
        };
        let ctx = analysis_context(&analysis);
        assert!(ctx.contains("**Quranic Allusions**:\n- کن فیکون: Quran 2:117"));
        assert!(ctx.contains("**Sufi Terms**:\n- fana: annihilation of self"));
        assert!(ctx.contains("**Ambiguities to Preserve**:\n- یار: God, Shams"));
        assert!(!ctx.contains("**Wordplay**"));
    }

    #[test]
    fn stylist_prompt_numbers_unnumbered_literal_verses() {
        let literal = vec![LiteralVerse {
            verse_number: 0,
            hemistich1: "Come, come".to_string(),
            hemistich2: "for you are".to_string(),
        }];
        let p = stylist_prompt(&sample_ghazal(), &AnalysisResponse::default(), &literal);
        assert!(p.contains("Verse 1:\n  Come, come\n  for you are"));
    }

    #[test]
    fn qa_prompt_reconstructs_refined_text_from_line_pairs() {
        let refined: StylistResponse = serde_json::from_str(
            r#"{"refined_translation":{"verses":[{"verse_number":1,"line1":"A","line2":"B"}],"full_text":""}}"#,
        )
        .expect("parse");
        let p = qa_prompt(
            &sample_ghazal(),
            &AnalysisResponse::default(),
            &[],
            &refined,
        );
        assert!(p.contains("**Refined Translation** (to review):\nA\nB"));
        assert!(p.contains("**Analysis Summary**:\nStandard ghazal"));
    }

    #[test]
    fn system_prompts_embed_glossary_and_protected_terms() {
        assert!(translator_system().contains("معشوق (ma'shuq) → \"the Beloved\""));
        assert!(qa_system().contains("یار (yar) → \"the Friend\""));
        assert!(stylist_system().contains("- \"Kaaba\""));
        assert!(!stylist_system().contains("{{protected_terms}}"));
    }
}
