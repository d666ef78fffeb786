// Craft response parser
//
// Turns the free-text Gemini reply into the three content sections.
// Parsing never fails: unusable sections fall back to fixed text and the
// outcome records how much of the result is genuine.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::content::{ContentSection, GenerationResult, ParseOutcome, ParsedContent};

/// A section label plus the markdown models wrap it in, e.g. `**STORY:**` or
/// `## HERITAGE_CONTEXT:`. Leading markup must sit on the label's own line and
/// the closing emphasis must touch the colon, so emphasis that opens the
/// section body is left alone.
#[allow(clippy::expect_used)]
static SECTION_LABEL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:[#*]+[ \t]*)?\b(STORY:|SOCIAL_CAPTION:|HERITAGE_CONTEXT:)\**")
        .expect("section label pattern is valid")
});

#[allow(clippy::expect_used)]
static BLANK_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line pattern is valid"));

/// Extract labeled sections. Returns None when no label occurs at all.
fn labeled_sections(text: &str) -> Option<[Option<String>; 3]> {
    let labels: Vec<_> = SECTION_LABEL.captures_iter(text).collect();
    if labels.is_empty() {
        return None;
    }

    let mut sections: [Option<String>; 3] = [None, None, None];
    for (i, caps) in labels.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = labels
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|next| next.start())
            .unwrap_or(text.len());
        let Some(section) = ContentSection::from_label(name.as_str()) else {
            continue;
        };
        let body = text[whole.end()..end].trim();
        // A repeated label overrides an earlier one
        sections[section_index(section)] = Some(body.to_string());
    }
    Some(sections)
}

fn section_index(section: ContentSection) -> usize {
    match section {
        ContentSection::Story => 0,
        ContentSection::SocialCaption => 1,
        ContentSection::HeritageContext => 2,
    }
}

fn paragraphs(text: &str) -> Vec<&str> {
    BLANK_LINE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Parse a craft content reply into story, social caption and heritage context.
pub fn parse_craft_response(text: &str) -> ParsedContent {
    if let Some(sections) = labeled_sections(text) {
        let mut filled = Vec::new();
        let mut values = Vec::with_capacity(3);
        for section in ContentSection::ALL {
            match sections[section_index(section)].as_deref() {
                Some(body) if !body.is_empty() => {
                    filled.push(section);
                    values.push(body.to_string());
                }
                _ => values.push(section.fallback_text().to_string()),
            }
        }

        let mut values = values.into_iter();
        let result = GenerationResult {
            story: values.next().unwrap_or_default(),
            social_caption: values.next().unwrap_or_default(),
            heritage_context: values.next().unwrap_or_default(),
        };

        let outcome = if filled.len() == ContentSection::ALL.len() {
            ParseOutcome::Parsed
        } else {
            log::warn!(
                "Gemini reply missing sections, filled with fallback text: {:?}",
                ContentSection::ALL
                    .iter()
                    .filter(|s| !filled.contains(s))
                    .collect::<Vec<_>>()
            );
            ParseOutcome::PartiallyParsed { filled }
        };
        return ParsedContent { result, outcome };
    }

    let paras = paragraphs(text);
    if paras.len() >= 3 {
        log::debug!("Gemini reply had no section labels, using first three paragraphs");
        return ParsedContent {
            result: GenerationResult {
                story: paras[0].to_string(),
                social_caption: paras[1].to_string(),
                heritage_context: paras[2].to_string(),
            },
            outcome: ParseOutcome::Paragraphs,
        };
    }

    log::warn!("Gemini reply had no usable structure, using it as the story");
    let story = text.trim();
    ParsedContent {
        result: GenerationResult {
            story: if story.is_empty() {
                ContentSection::Story.fallback_text().to_string()
            } else {
                story.to_string()
            },
            social_caption: ContentSection::SocialCaption.fallback_text().to_string(),
            heritage_context: ContentSection::HeritageContext.fallback_text().to_string(),
        },
        outcome: ParseOutcome::Unparsed {
            raw: text.to_string(),
        },
    }
}
