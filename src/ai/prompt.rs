// src/ai/prompt.rs

use crate::models::question::GENERATED_OPTION_COUNT;

/// Builds the instruction sent to the model for `count` questions on `topic`.
///
/// The model is asked for a bare JSON array whose objects carry
/// `question, options, correct, explanation, subject`.
pub fn build_prompt(topic: &str, count: u32) -> String {
    let topic = topic.trim();
    let last_index = GENERATED_OPTION_COUNT - 1;

    format!(
        r#"You are an expert medical educator writing USMLE-style board exam questions.

Create exactly {count} multiple-choice questions about: "{topic}".

Rules:
1. Each question is a clinical vignette or a focused knowledge question appropriate for medical licensing exams.
2. Each question has exactly {GENERATED_OPTION_COUNT} answer options and exactly one correct answer.
3. "correct" is the zero-based index (0 to {last_index}) of the correct option. Vary its position across questions.
4. Never reveal or hint at the correct answer in the question text.
5. "explanation" briefly explains why the correct option is right and why the others are wrong.
6. "subject" names the discipline (for example Cardiology, Pharmacology, Microbiology).

Respond with ONLY a JSON array, no markdown and no commentary, in this exact format:
[
  {{
    "question": "Question text",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correct": 0,
    "explanation": "Why the answer is correct",
    "subject": "Subject"
  }}
]"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_topic_and_count() {
        let prompt = build_prompt("  heart failure ", 7);
        assert!(prompt.contains("Create exactly 7 multiple-choice questions"));
        assert!(prompt.contains("\"heart failure\""));
        assert!(prompt.contains("exactly 4 answer options"));
    }

    #[test]
    fn test_prompt_names_every_field() {
        let prompt = build_prompt("renal physiology", 1);
        for field in ["question", "options", "correct", "explanation", "subject"] {
            assert!(prompt.contains(&format!("\"{}\"", field)), "missing {}", field);
        }
    }

    #[test]
    fn test_prompt_forbids_answer_leak() {
        assert!(build_prompt("sepsis", 3).contains("Never reveal"));
    }
}
