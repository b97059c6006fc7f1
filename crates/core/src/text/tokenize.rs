//! English word tokenizer that splits clitics the way dependency parsers do:
//! `can't` becomes `ca` + `n't`, `I'm` becomes `I` + `'m`, `cant` becomes
//! `ca` + `nt`.

const CLITIC_SUFFIXES: &[&str] = &["'m", "'re", "'s", "'ve", "'ll", "'d"];

// Apostrophe-less negative contractions.
const BARE_NEGATIONS: &[&str] = &[
    "cant", "dont", "wont", "isnt", "arent", "wasnt", "werent", "doesnt", "didnt", "hasnt",
    "havent", "hadnt", "couldnt", "shouldnt", "wouldnt", "aint",
];

// Apostrophe-less first-person contractions.
const BARE_FIRST_PERSON: &[(&str, &str)] = &[("im", "m"), ("ive", "ve")];

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '\'' || c == '-'
}

fn split_word(word: &str, out: &mut Vec<String>) {
    let lower = word.to_lowercase();

    if lower.len() > 3 && lower.ends_with("n't") {
        let cut = word.len() - 3;
        out.push(word[..cut].to_owned());
        out.push(word[cut..].to_owned());
        return;
    }
    if BARE_NEGATIONS.contains(&lower.as_str()) {
        let cut = word.len() - 2;
        out.push(word[..cut].to_owned());
        out.push(word[cut..].to_owned());
        return;
    }
    if let Some((_, tail)) = BARE_FIRST_PERSON.iter().find(|(w, _)| *w == lower) {
        let cut = word.len() - tail.len();
        out.push(word[..cut].to_owned());
        out.push(word[cut..].to_owned());
        return;
    }
    for suffix in CLITIC_SUFFIXES {
        if lower.len() > suffix.len() && lower.ends_with(suffix) {
            let cut = word.len() - suffix.len();
            out.push(word[..cut].to_owned());
            out.push(word[cut..].to_owned());
            return;
        }
    }
    out.push(word.to_owned());
}

/// Splits `text` into word, clitic and punctuation tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized = text.replace(['\u{2019}', '\u{2018}'], "'");
    let mut tokens = Vec::new();
    let mut word = String::new();

    let flush = |word: &mut String, tokens: &mut Vec<String>| {
        let trimmed = word.trim_matches(|c: char| c == '\'' || c == '-');
        if !trimmed.is_empty() {
            split_word(trimmed, tokens);
        }
        word.clear();
    };

    for c in normalized.chars() {
        if is_word_char(c) {
            word.push(c);
        } else {
            flush(&mut word, &mut tokens);
            if !c.is_whitespace() {
                tokens.push(c.to_string());
            }
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}
