/*!
 * Prompt construction for the translator, evaluator and optimizer roles.
 *
 * Every prompt carries the same guard rails: keep placeholder tokens, never
 * transliterate codes, answer in the target language, apply any number
 * formatting rule configured for the target and honor the glossary.
 */

use serde::{Deserialize, Serialize};

use super::glossary::Glossary;
use crate::language_utils::display_language;

/// Language tag meaning "let the model figure it out"
pub const AUTO_LANGUAGE: &str = "auto";

/// Target-language-specific number formatting instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberFormatRule {
    /// Language names or codes the rule applies to, matched case-insensitively
    pub languages: Vec<String>,
    /// Instruction appended to prompts
    pub instruction: String,
}

impl NumberFormatRule {
    /// Comma decimal separator for Russian
    pub fn russian() -> Self {
        Self {
            languages: vec!["russian".to_string(), "ru".to_string(), "俄语".to_string()],
            instruction: "Number Formatting: Use comma ',' for decimals (e.g. 0.008 -> 0,008). \
                CRITICAL: Do NOT change dots '.' in serial numbers, section numbers (e.g. 1.1, 2.1.3), \
                version numbers, or model codes."
                .to_string(),
        }
    }

    /// Whether the rule applies to `target_language`.
    ///
    /// Matches the whole tag or any of its words, so "ru", "ru-RU" and
    /// "Russian (Russia)" all select a rule listing "ru" or "russian".
    pub fn applies_to(&self, target_language: &str) -> bool {
        let target = target_language.trim().to_lowercase();
        let words: Vec<&str> = target
            .split(|c: char| c == '-' || c == '_' || c == '(' || c == ')' || c.is_whitespace())
            .filter(|w| !w.is_empty())
            .collect();
        self.languages.iter().any(|language| {
            let language = language.trim().to_lowercase();
            target == language || words.contains(&language.as_str())
        })
    }
}

/// Builds role prompts for one language pair
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    source_language: String,
    target_language: String,
    glossary: String,
    number_rules: Vec<String>,
}

impl PromptBuilder {
    pub fn new(source_language: &str, target_language: &str, glossary: &Glossary, rules: &[NumberFormatRule]) -> Self {
        let number_rules = rules
            .iter()
            .filter(|rule| rule.applies_to(target_language))
            .map(|rule| rule.instruction.clone())
            .collect();
        Self {
            source_language: source_language.to_string(),
            target_language: display_language(target_language),
            glossary: glossary.to_prompt_block(),
            number_rules,
        }
    }

    fn is_auto_source(&self) -> bool {
        self.source_language.eq_ignore_ascii_case(AUTO_LANGUAGE)
    }

    fn source_display(&self) -> String {
        display_language(&self.source_language)
    }

    /// Number-format and glossary rules, numbered from `next`
    fn extra_rules(&self, mut next: usize, glossary_heading: &str) -> String {
        let mut out = String::new();
        for rule in &self.number_rules {
            out.push_str(&format!("\n{}. {}", next, rule));
            next += 1;
        }
        if !self.glossary.is_empty() {
            out.push_str(&format!("\n{}. {}\n{}", next, glossary_heading, self.glossary));
        }
        out
    }

    fn number_check(&self) -> String {
        if self.number_rules.is_empty() {
            " No special rules for this language.".to_string()
        } else {
            self.number_rules
                .iter()
                .map(|rule| format!("\n   - {}", rule))
                .collect()
        }
    }

    fn context_block(&self) -> String {
        let source = if self.is_auto_source() {
            format!(
                "Identify the source language of the 'Original' text (currently indicated as '{}').",
                self.source_language
            )
        } else {
            format!("The source language is {}.", self.source_display())
        };
        let mut block = format!("Context:\n- {}\n- The target language is {}.\n", source, self.target_language);
        if !self.glossary.is_empty() {
            block.push_str(&format!("\nTerminology constraints (Must follow):\n{}\n", self.glossary));
        }
        block
    }

    fn critical_rules(&self) -> String {
        format!(
            "CRITICAL RULES for 'Untranslated' or 'Same Language' scenarios:
1. If the translation is identical to the original:
   - If the source and target languages are the same (or the content is already in the target language), this is CORRECT. Score 10 for Accuracy.
   - If the content is a universal code, model number, or technical identifier (e.g., 'MTENTU-JKBG-2505'), this is CORRECT. Score 10 for Accuracy.
   - If the content SHOULD have been translated but wasn't, it is a FAILURE (Untranslated). Score 0 for Accuracy and Completeness.
2. Mixed Content: If the translation contains both translated text and original numbers/symbols, evaluate the quality of the translated parts.
3. Wrong Language: If the translation is in a language other than {target}, score 0 for Accuracy.
4. Number Formatting:{numbers}
   - If the translation violates these rules, penalize Accuracy and Fluency.
5. Terminology: If terminology is provided, it must be followed strictly. Deviations result in a low Terminology score.",
            target = self.target_language,
            numbers = self.number_check(),
        )
    }

    /// System prompt for the translator; the user prompt is the segment text
    pub fn translate_system(&self) -> String {
        let source = if self.is_auto_source() {
            String::new()
        } else {
            format!(" from {}", self.source_display())
        };
        let target = &self.target_language;
        format!(
            "You are a professional translator.
Task: Translate the user's text{source} to {target}.
Rules:
1. Maintain all formatting.
2. Keep any {{{{MATH_N}}}} or {{{{OBJ_N}}}} placeholders unchanged. Do NOT add new ones.
3. Return ONLY the translated text. Do NOT include the original text, explanations, or notes.
4. If the text is already in {target}, return it as is.
5. CRITICAL: The target language is {target}. Do NOT translate to English unless {target} is English.
6. Do NOT translate or transliterate alphanumeric codes, model numbers, or technical identifiers (e.g. keep \"STR-1650\", \"RS8-500\" as is).{extra}
",
            extra = self.extra_rules(7, "Terminology: Strictly follow these terms:"),
        )
    }

    /// Single-translation evaluation prompt
    pub fn evaluate(&self, original: &str, translation: &str) -> String {
        format!(
            "Evaluate the translation provided below.

{context}
Content to Evaluate:
Original: {original}
Translation: {translation}

Evaluation Dimensions (0-10): Accuracy, Fluency, Consistency, Terminology Accuracy, Completeness.

{rules}

Identify the source language first, then provide a score (0-10) for each dimension and suggestions for improvement.

Return JSON format:
{{
    \"detected_source_lang\": \"<string>\",
    \"accuracy\": <int>,
    \"fluency\": <int>,
    \"consistency\": <int>,
    \"terminology\": <int>,
    \"completeness\": <int>,
    \"suggestions\": \"<string>\"
}}",
            context = self.context_block(),
            rules = self.critical_rules(),
        )
    }

    /// Side-by-side evaluation of the initial (A) and optimized (C) translations
    pub fn compare(&self, original: &str, translation_a: &str, translation_c: &str) -> String {
        format!(
            "Evaluate the two translations provided below.

{context}
Content to Evaluate:
Original: {original}
Model A Translation: {translation_a}
Model C Translation: {translation_c}

Evaluation Dimensions (0-10): Accuracy, Fluency, Consistency, Terminology Accuracy, Completeness.

{rules}

Identify the source language first, then provide a score (0-10) for each dimension and suggestions for improvement for BOTH models.

Return JSON format:
{{
    \"detected_source_lang\": \"<string>\",
    \"model_a\": {{
        \"accuracy\": <int>,
        \"fluency\": <int>,
        \"consistency\": <int>,
        \"terminology\": <int>,
        \"completeness\": <int>,
        \"suggestions\": \"<string>\"
    }},
    \"model_c\": {{
        \"accuracy\": <int>,
        \"fluency\": <int>,
        \"consistency\": <int>,
        \"terminology\": <int>,
        \"completeness\": <int>,
        \"suggestions\": \"<string>\"
    }}
}}",
            context = self.context_block(),
            rules = self.critical_rules(),
        )
    }

    /// System prompt for the optimizer
    pub fn optimize_system(&self) -> String {
        let target = &self.target_language;
        format!(
            "You are a translation optimizer.
Task: Improve the translation based on the provided suggestions.
Target Language: {target}
Rules:
1. Keep any {{{{MATH_N}}}} or {{{{OBJ_N}}}} placeholders unchanged.
2. Return ONLY the optimized translation text. Do NOT return explanations or the original text.
3. If no changes are needed, return the Current Translation exactly.
4. CRITICAL: Ensure the result is in {target}. Do NOT translate to English unless {target} is English.
5. Do NOT translate or transliterate alphanumeric codes, model numbers, or technical identifiers.{extra}
",
            extra = self.extra_rules(6, "Terminology: Strictly follow these terms:"),
        )
    }

    /// User prompt for the optimizer
    pub fn optimize_user(&self, original: &str, translation: &str, suggestions: &str) -> String {
        format!("Original: {}\nCurrent Translation: {}\nSuggestions: {}", original, translation, suggestions)
    }
}

/// Prompt text recorded in results, system and user parts combined
pub fn audit_prompt(system_prompt: Option<&str>, user_prompt: &str) -> String {
    match system_prompt {
        Some(system) => format!("System: {}\nUser: {}", system, user_prompt),
        None => user_prompt.to_string(),
    }
}
