// src/ai/extract.rs

use serde_json::Value;

use super::GenerationError;
use crate::models::question::{GENERATED_OPTION_COUNT, GeneratedQuestion};

/// Pulls well-formed questions out of raw model output.
///
/// The first balanced `[...]` span that is valid JSON is used; when there
/// is none the whole text is parsed. Unparseable text or a non-array value
/// fails the whole batch. Individual elements that do not look like a
/// four-option question are skipped, and an empty result is an error.
pub fn extract_questions(raw: &str) -> Result<Vec<GeneratedQuestion>, GenerationError> {
    let parsed = match find_json_array(raw) {
        Some(value) => value,
        None => serde_json::from_str::<Value>(raw.trim()).map_err(|e| {
            tracing::warn!("AI response is not JSON: {}", e);
            GenerationError::MalformedResponse(e.to_string())
        })?,
    };

    let Value::Array(items) = parsed else {
        return Err(GenerationError::MalformedResponse(
            "expected a JSON array of questions".to_string(),
        ));
    };

    let total = items.len();
    let questions: Vec<GeneratedQuestion> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match salvage(item) {
            Ok(q) => Some(q),
            Err(reason) => {
                tracing::warn!(index, "Skipping generated question: {}", reason);
                None
            }
        })
        .collect();

    if questions.is_empty() {
        return Err(GenerationError::NoValidQuestions);
    }

    tracing::info!("Accepted {} of {} generated questions", questions.len(), total);
    Ok(questions)
}

/// Returns the first top-level balanced bracket span that parses as JSON.
///
/// A span that does not parse is skipped as a whole, so arrays nested
/// inside it (such as `options`) are never mistaken for the result.
fn find_json_array(text: &str) -> Option<Value> {
    let mut from = 0;
    while let Some(offset) = text[from..].find('[') {
        let start = from + offset;
        // Nothing after this point closes, later brackets won't either.
        let span = balanced_span(&text[start..])?;
        if let Ok(value) = serde_json::from_str::<Value>(span) {
            return Some(value);
        }
        from = start + span.len();
    }
    None
}

/// Given text starting with `[`, returns the prefix up to the matching `]`.
/// Brackets inside JSON string literals are ignored.
fn balanced_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

fn salvage(item: &Value) -> Result<GeneratedQuestion, &'static str> {
    let question = item
        .get("question")
        .and_then(Value::as_str)
        .ok_or("missing or non-string question")?
        .trim();
    if question.is_empty() {
        return Err("blank question text");
    }

    let options = item
        .get("options")
        .and_then(Value::as_array)
        .ok_or("missing or non-array options")?;
    if options.len() != GENERATED_OPTION_COUNT {
        return Err("options must have exactly four entries");
    }

    let correct = item
        .get("correct")
        .and_then(Value::as_f64)
        .ok_or("missing or non-numeric correct")?;
    if !(0.0..GENERATED_OPTION_COUNT as f64).contains(&correct) || correct.fract() != 0.0 {
        return Err("correct index out of range");
    }

    Ok(GeneratedQuestion {
        question: question.to_string(),
        options: options.iter().map(option_text).collect(),
        correct: correct as i32,
        explanation: text_field(item, "explanation"),
        subject: text_field(item, "subject"),
    })
}

fn option_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
