//! Console tables for text and audio results.
//!
//! Rendering works on JSON values so that freshly produced records and files
//! loaded back from disk go through the same path.

use crate::util::table::{ellipsize, Table};
use serde_json::Value;
use std::path::Path;

pub const TRUNCATE_CHARS: usize = 30;

const TEXT_HEADERS: [&str; 8] = [
    "Original",
    "Corrected",
    "Polarity",
    "Subjectivity",
    "Emotion",
    "Valence",
    "Arousal",
    "Statement Type",
];

const AUDIO_HEADERS: [&str; 9] = [
    "Set ID",
    "File",
    "Transcription",
    "Voice Emo",
    "V. Valence",
    "V. Arousal",
    "Text Emo",
    "Text Subj",
    "Statement",
];

fn text_at(value: &Value, pointer: &str) -> String {
    match value.pointer(pointer) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn tags_at(value: &Value, pointer: &str) -> String {
    match value.pointer(pointer) {
        Some(Value::Array(tags)) => tags
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(", "),
        _ => String::new(),
    }
}

/// Audio records are recognised by an `audio_path` key on the first item.
pub fn is_audio_results(results: &[Value]) -> bool {
    results
        .first()
        .is_some_and(|r| r.get("audio_path").is_some())
}

pub fn render_text_results(results: &[Value]) -> String {
    let mut table = Table::new(TEXT_HEADERS);
    for r in results {
        table.push_row(vec![
            ellipsize(&text_at(r, "/original_text"), TRUNCATE_CHARS),
            ellipsize(&text_at(r, "/corrected_text"), TRUNCATE_CHARS),
            text_at(r, "/analysis/polarity_label"),
            text_at(r, "/analysis/subjectivity_label"),
            text_at(r, "/analysis/emotion/label"),
            text_at(r, "/analysis/emotion/valence"),
            text_at(r, "/analysis/emotion/arousal"),
            tags_at(r, "/analysis/statement_type"),
        ]);
    }
    if table.is_empty() {
        return "No texts to analyze.".to_owned();
    }
    table.render()
}

pub fn render_audio_results(results: &[Value]) -> String {
    let mut table = Table::new(AUDIO_HEADERS);
    for r in results {
        let audio_path = text_at(r, "/audio_path");
        let file = Path::new(&audio_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        table.push_row(vec![
            text_at(r, "/id"),
            file,
            ellipsize(&text_at(r, "/transcription"), TRUNCATE_CHARS),
            text_at(r, "/voice_emotion/label"),
            text_at(r, "/voice_emotion/valence"),
            text_at(r, "/voice_emotion/arousal"),
            text_at(r, "/text_analysis/analysis/emotion/label"),
            text_at(r, "/text_analysis/analysis/subjectivity_label"),
            tags_at(r, "/text_analysis/analysis/statement_type"),
        ]);
    }
    if table.is_empty() {
        return "No audio to analyze.".to_owned();
    }
    table.render()
}

pub fn render_results(results: &[Value]) -> String {
    if is_audio_results(results) {
        render_audio_results(results)
    } else {
        render_text_results(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_record() -> Value {
        json!({
            "original_text": "I cant beleive this happened, im so happy!!",
            "corrected_text": "I can't believe this happened, I'm so happy!!",
            "analysis": {
                "polarity": 1.0,
                "subjectivity": 1.0,
                "polarity_label": "positive",
                "subjectivity_label": "personal",
                "emotion": {"label": "joy", "valence": "positive", "arousal": "high"},
                "statement_type": ["negation", "personal"]
            }
        })
    }

    #[test]
    fn text_table_truncates_and_joins_tags() {
        let out = render_results(&[text_record()]);
        for header in TEXT_HEADERS {
            assert!(out.contains(header), "missing {header}");
        }
        assert!(out.contains("I cant beleive this happened, ..."));
        assert!(out.contains("negation, personal"));
        assert!(!out.contains("so happy!!"));
    }

    #[test]
    fn audio_records_are_detected() {
        let record = json!({
            "id": "s1",
            "audio_path": "/data/s1/clip_01.wav",
            "transcription": "hello there",
            "voice_emotion": {"label": "joy", "valence": "positive", "arousal": "high", "score": 0.9},
            "text_analysis": text_record(),
        });
        assert!(is_audio_results(std::slice::from_ref(&record)));
        let out = render_results(&[record]);
        assert!(out.contains("Set ID"));
        assert!(out.contains("clip_01.wav"));
        assert!(!out.contains("/data/s1"));
        assert!(out.contains("hello there"));
    }

    #[test]
    fn empty_results_print_a_notice() {
        assert_eq!(render_results(&[]), "No texts to analyze.");
        assert_eq!(render_audio_results(&[]), "No audio to analyze.");
    }
}
