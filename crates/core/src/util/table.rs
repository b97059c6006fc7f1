//! Plain-text grid tables for result summaries.

use comfy_table::presets::ASCII_FULL;
use comfy_table::ContentArrangement;

/// Cuts `value` to `max` characters, appending `...` when something was dropped.
pub fn ellipsize(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_owned();
    }
    let mut out: String = value.chars().take(max).collect();
    out.push_str("...");
    out
}

/// ASCII grid with a `=` rule under the header row.
#[derive(Debug)]
pub struct Table {
    inner: comfy_table::Table,
    rows: usize,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = comfy_table::Table::new();
        inner
            .load_preset(ASCII_FULL)
            .set_content_arrangement(ContentArrangement::Disabled)
            .set_header(headers.into_iter().map(Into::into).collect::<Vec<String>>());
        Self { inner, rows: 0 }
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.inner.add_row(row);
        self.rows += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn render(&self) -> String {
        self.inner.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ellipsize_only_when_longer() {
        assert_eq!(ellipsize("short", 30), "short");
        assert_eq!(ellipsize("abcdef", 3), "abc...");
        assert_eq!(ellipsize("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn renders_header_and_rows_in_a_grid() {
        let mut t = Table::new(["Emotion", "Valence"]);
        assert!(t.is_empty());
        t.push_row(vec!["joy".to_owned(), "positive".to_owned()]);
        assert!(!t.is_empty());

        let out = t.render();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with('+'));
        assert!(lines[1].contains("Emotion") && lines[1].contains("Valence"));
        assert!(lines[2].contains('='));
        let joy = lines.iter().position(|l| l.contains("joy")).expect("row");
        assert!(joy > 2);
        assert!(lines[joy].contains("positive"));
    }
}
