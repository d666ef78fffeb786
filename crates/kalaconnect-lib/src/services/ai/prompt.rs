// Prompt builders for craft content generation

use crate::models::content::{ContentSection, Language, MAX_KEYWORDS};

/// Instruction for the description-only analysis call
pub const ANALYSIS_PROMPT: &str = "Analyze this traditional Indian craft image and provide:

1. Craft type identification
2. Materials used (if visible)
3. Traditional techniques observed
4. Regional style indicators
5. Cultural significance
6. Craftsmanship quality assessment

Provide a concise but informative analysis focusing on the craft's traditional aspects and cultural value.";

/// Keyword focus clause over at most MAX_KEYWORDS non-empty entries,
/// empty when none remain
fn keyword_context(keywords: &[String]) -> String {
    let focus: Vec<&str> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .take(MAX_KEYWORDS)
        .collect();
    if focus.is_empty() {
        String::new()
    } else {
        format!("Focus on these aspects: {}. ", focus.join(", "))
    }
}

/// Build the three-section content instruction sent alongside the craft photo.
///
/// `base_prompt` is the caller's own description (usually derived from the
/// keywords) and is included as additional direction.
pub fn craft_content_prompt(base_prompt: &str, language: Language, keywords: &[String]) -> String {
    let language_name = language.display_name();
    let story = ContentSection::Story.label();
    let caption = ContentSection::SocialCaption.label();
    let heritage = ContentSection::HeritageContext.label();

    format!(
        "Analyze this traditional Indian craft image and generate authentic, culturally rich content in {language_name}.

{keyword_context}
{base_prompt}

Based on the craft shown in the image, create:

1. STORY (150-200 words): Write a compelling narrative about this craft that highlights:
   - Traditional techniques and heritage
   - Cultural significance and history
   - The artisan's skill and dedication
   - Connection to Indian cultural roots
   - Authentic details about materials and methods

2. SOCIAL_CAPTION (80-120 words): Create an engaging social media post that:
   - Uses appropriate emojis and hashtags
   - Celebrates the craft's cultural value
   - Appeals to both traditional and modern audiences
   - Includes relevant hashtags for Indian crafts
   - Maintains cultural authenticity

3. HERITAGE_CONTEXT (120-150 words): Provide historical background including:
   - Origins and historical timeline
   - Regional variations and traditions
   - Cultural importance in Indian society
   - How the craft has evolved over time
   - Its place in contemporary India

Ensure the content is:
- Culturally authentic and respectful
- Historically accurate
- Emotionally engaging
- Appropriate for {language_name} speakers
- Celebrates India's rich craft heritage

Format your response exactly like this:
{story} [story content here]

{caption} [social media caption here]

{heritage} [heritage context here]",
        keyword_context = keyword_context(keywords),
        base_prompt = base_prompt.trim(),
    )
}
