//! 生成器与校验器使用的提示词

use crate::models::Example;
use crate::services::generator::GenerateRequest;
use crate::services::validator::{ValidateRequest, ValidationMode};

/// 构建 few-shot 示例段落
fn build_examples_block(examples: &[Example]) -> String {
    if examples.is_empty() {
        return "No examples provided.".to_string();
    }
    examples
        .iter()
        .map(|ex| format!("Original: {}\nExpected: {}", ex.original, ex.expected))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// 构建生成请求的消息
///
/// 返回 (system_message, user_message)
pub fn build_generation_messages(request: &GenerateRequest) -> (String, String) {
    let mut system_message = format!(
        r#"You are a bibliography formatting expert.
Target Style: {style}

Rules:
1. Output ONLY the formatted bibliography entry. No comments, no markdown.
2. Preserve all available information (year, volume, pages).
3. If information is missing, do NOT invent it.

Few-Shot Examples:
{examples}
"#,
        style = request.target_style,
        examples = build_examples_block(&request.examples),
    );

    // 只有同时存在上一次结果和校验意见时才追加修正说明
    if let (Some(feedback), Some(previous)) = (&request.feedback, &request.previous_attempt) {
        system_message.push_str(&format!(
            r#"
CRITICAL CORRECTION INSTRUCTION:
Your previous output was: "{previous}"
The validator found the following issues: "{feedback}"

Please fix these issues and output the corrected version. Ensure you strictly follow the {style} style guidelines."#,
            previous = previous,
            feedback = feedback,
            style = request.target_style,
        ));
    }

    let user_message = format!("Format this entry:\n{}", request.text);
    (system_message, user_message)
}

const VERDICT_FORMAT: &str = r#"Respond with a single JSON object and nothing else:
{"isValid": true or false, "score": integer from 0 to 10, "comment": "Short explanation of the score and any issues found."}"#;

/// 构建校验请求的提示词
pub fn build_validation_prompt(request: &ValidateRequest) -> String {
    let task = match request.mode {
        ValidationMode::Style => format!(
            r#"You are a strict editorial proofreader.
Target Style: {style}
Original Text: {original}
Candidate Text: {converted}

Task: Check if the Candidate Text strictly follows the Target Style rules (punctuation, order, italics).
Ignore missing data if it wasn't present in the Original Text. Focus on formatting."#,
            style = request.style,
            original = request.original,
            converted = request.converted,
        ),
        ValidationMode::Integrity => format!(
            r#"You are a data integrity checker.
Original Text: {original}
Candidate Text: {converted}

Task: Check if the Candidate Text preserves all critical information (Year, Volume, Pages, Authors) from the Original Text.
Check for hallucinations (invented data) or data loss."#,
            original = request.original,
            converted = request.converted,
        ),
    };

    format!("{}\n\n{}", task, VERDICT_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderConfig;

    fn generate_request(feedback: Option<&str>, previous: Option<&str>) -> GenerateRequest {
        GenerateRequest {
            text: "Smith, J. (2020). Title. Journal.".to_string(),
            target_style: "Nature".to_string(),
            examples: vec![Example::new("Doe A 2019", "Doe, A. (2019).")],
            provider_config: ProviderConfig {
                provider: "openai".to_string(),
                model: "gpt-4o".to_string(),
                api_key: "k".to_string(),
                base_url: None,
            },
            feedback: feedback.map(str::to_string),
            previous_attempt: previous.map(str::to_string),
        }
    }

    #[test]
    fn test_first_round_prompt() {
        let (system, user) = build_generation_messages(&generate_request(None, None));

        assert!(system.contains("Target Style: Nature"));
        assert!(system.contains("Original: Doe A 2019\nExpected: Doe, A. (2019)."));
        assert!(!system.contains("CRITICAL CORRECTION"));
        assert_eq!(user, "Format this entry:\nSmith, J. (2020). Title. Journal.");
    }

    #[test]
    fn test_correction_prompt() {
        let (system, _) = build_generation_messages(&generate_request(
            Some("Style: journal must be italic"),
            Some("Smith, J. (2020). Title. Journal."),
        ));

        assert!(system.contains("CRITICAL CORRECTION INSTRUCTION"));
        assert!(system.contains("\"Style: journal must be italic\""));
        assert!(system.contains("Your previous output was: \"Smith, J. (2020). Title. Journal.\""));
    }

    #[test]
    fn test_no_examples_placeholder() {
        let mut request = generate_request(None, None);
        request.examples.clear();
        let (system, _) = build_generation_messages(&request);
        assert!(system.contains("No examples provided."));
    }

    #[test]
    fn test_validation_prompts_differ_by_mode() {
        let mut request = ValidateRequest {
            original: "o".to_string(),
            converted: "c".to_string(),
            style: "APA 7th".to_string(),
            mode: ValidationMode::Style,
            provider_config: generate_request(None, None).provider_config,
        };
        let style_prompt = build_validation_prompt(&request);
        assert!(style_prompt.contains("Target Style: APA 7th"));
        assert!(style_prompt.contains("\"isValid\""));

        request.mode = ValidationMode::Integrity;
        let integrity_prompt = build_validation_prompt(&request);
        assert!(integrity_prompt.contains("hallucinations"));
        assert!(!integrity_prompt.contains("APA 7th"));
    }
}
