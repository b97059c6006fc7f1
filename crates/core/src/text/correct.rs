use crate::util::retry::{is_http_retryable, retry_with_backoff, RetryConfig};
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum CorrectionError {
    #[error("invalid LanguageTool url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Grammar and spelling normalization.
pub trait TextCorrector: Send + Sync {
    fn correct(&self, text: String) -> BoxFuture<'_, Result<String, CorrectionError>>;
}

// Keys are lowercase; replacement case follows the original's first letter.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("i", "I"),
    ("im", "I'm"),
    ("ive", "I've"),
    ("cant", "can't"),
    ("dont", "don't"),
    ("isnt", "isn't"),
    ("arent", "aren't"),
    ("wasnt", "wasn't"),
    ("werent", "weren't"),
    ("doesnt", "doesn't"),
    ("didnt", "didn't"),
    ("hasnt", "hasn't"),
    ("havent", "haven't"),
    ("couldnt", "couldn't"),
    ("shouldnt", "shouldn't"),
    ("wouldnt", "wouldn't"),
    ("thats", "that's"),
    ("whats", "what's"),
    ("theyre", "they're"),
    ("youre", "you're"),
    ("beleive", "believe"),
    ("belive", "believe"),
    ("recieve", "receive"),
    ("definately", "definitely"),
    ("seperate", "separate"),
    ("occured", "occurred"),
    ("untill", "until"),
    ("wierd", "weird"),
    ("teh", "the"),
    ("alot", "a lot"),
    ("becuase", "because"),
    ("freind", "friend"),
    ("goverment", "government"),
    ("tommorow", "tomorrow"),
    ("realy", "really"),
    ("acheive", "achieve"),
    ("truely", "truly"),
];

/// Offline corrector: common contraction and misspelling fixes, standalone
/// `i` capitalized, sentence starts capitalized.
#[derive(Clone, Debug, Default)]
pub struct RuleBasedCorrector;

impl RuleBasedCorrector {
    pub fn new() -> Self {
        Self
    }

    fn replace_word(word: &str) -> String {
        let lower = word.to_lowercase();
        let Some((_, replacement)) = REPLACEMENTS.iter().find(|(from, _)| *from == lower) else {
            return word.to_owned();
        };
        if word.chars().next().is_some_and(char::is_uppercase) {
            capitalize(replacement)
        } else {
            (*replacement).to_owned()
        }
    }

    pub fn correct_str(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut word = String::new();
        for c in text.chars() {
            if c.is_alphanumeric() || c == '\'' {
                word.push(c);
            } else {
                if !word.is_empty() {
                    out.push_str(&Self::replace_word(&word));
                    word.clear();
                }
                out.push(c);
            }
        }
        if !word.is_empty() {
            out.push_str(&Self::replace_word(&word));
        }
        capitalize_sentences(&out)
    }
}

impl TextCorrector for RuleBasedCorrector {
    fn correct(&self, text: String) -> BoxFuture<'_, Result<String, CorrectionError>> {
        async move { Ok(Self::correct_str(&text)) }.boxed()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn capitalize_sentences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_start = true;
    for c in text.chars() {
        if at_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            at_start = false;
            continue;
        }
        if matches!(c, '.' | '!' | '?') {
            at_start = true;
        } else if !c.is_whitespace() && !matches!(c, '"' | '\'' | '(') {
            at_start = false;
        }
        out.push(c);
    }
    out
}

#[derive(Deserialize)]
struct CheckResponse {
    matches: Vec<CheckMatch>,
}

#[derive(Deserialize)]
struct CheckMatch {
    offset: usize,
    length: usize,
    replacements: Vec<Replacement>,
}

#[derive(Deserialize)]
struct Replacement {
    value: String,
}

/// Corrector backed by a LanguageTool server (`/v2/check`).
#[derive(Clone)]
pub struct LanguageToolCorrector {
    client: Client,
    check_url: Url,
    language: String,
    retry: RetryConfig,
}

impl LanguageToolCorrector {
    pub fn new(base_url: &str, language: &str) -> Result<Self, CorrectionError> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: Client::new(),
            check_url: base.join("v2/check")?,
            language: language.to_owned(),
            retry: RetryConfig::default(),
        })
    }

    async fn check(&self, text: &str) -> Result<CheckResponse, CorrectionError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("text", text)
            .append_pair("language", &self.language)
            .finish();
        let response = self
            .client
            .post(self.check_url.clone())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CorrectionError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body)
            .map_err(|e| CorrectionError::InvalidResponse(format!("failed to parse JSON: {e}")))
    }
}

fn splits_surrogate_pair(units: &[u16], at: usize) -> bool {
    units
        .get(at)
        .is_some_and(|u| (0xDC00..=0xDFFF).contains(u))
}

/// Applies the first suggested replacement of every match. LanguageTool
/// offsets count UTF-16 code units; overlapping matches after the first and
/// matches cutting through a surrogate pair are dropped.
fn apply_matches(text: &str, matches: &[CheckMatch]) -> String {
    let units: Vec<u16> = text.encode_utf16().collect();
    let mut out: Vec<u16> = Vec::with_capacity(units.len());
    let mut cursor = 0usize;
    let mut ordered: Vec<&CheckMatch> = matches.iter().collect();
    ordered.sort_by_key(|m| m.offset);
    for m in ordered {
        let Some(replacement) = m.replacements.first() else {
            continue;
        };
        let end = m.offset.saturating_add(m.length);
        if m.offset < cursor
            || end > units.len()
            || splits_surrogate_pair(&units, m.offset)
            || splits_surrogate_pair(&units, end)
        {
            continue;
        }
        out.extend_from_slice(&units[cursor..m.offset]);
        out.extend(replacement.value.encode_utf16());
        cursor = end;
    }
    out.extend_from_slice(&units[cursor..]);
    String::from_utf16_lossy(&out)
}

impl TextCorrector for LanguageToolCorrector {
    fn correct(&self, text: String) -> BoxFuture<'_, Result<String, CorrectionError>> {
        async move {
            let response = retry_with_backoff(
                &self.retry,
                || self.check(&text),
                |e: &CorrectionError| match e {
                    CorrectionError::Status { status, .. } => is_http_retryable(*status),
                    CorrectionError::Network(e) => e.is_timeout() || e.is_connect(),
                    _ => false,
                },
            )
            .await?;
            tracing::debug!(matches = response.matches.len(), "languagetool check done");
            Ok(apply_matches(&text, &response.matches))
        }
        .boxed()
    }
}
