// ============================================================
// Layer 4 — Title Preprocessor
// ============================================================
// Normalises a post title before it is stored in a Record.
//
// Titles scraped from JSON dumps often contain:
//   - Non-breaking spaces (U+00A0) and zero-width spaces (U+200B)
//   - Byte order marks (U+FEFF)
//   - Embedded newlines, tabs and other control characters
//   - Runs of spaces from copy-pasting
//
// A title is a single line, so every one of these becomes a
// plain space, runs collapse to one space and the ends are
// trimmed. Case is left alone; lowercasing is the
// vectorizer's job.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean one title into a single normalised line.
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true; // drops leading spaces

        for c in text.chars() {
            let c = match c {
                '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() || c.is_whitespace() => ' ',
                c => c,
            };

            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // At most one trailing space can remain.
        if out.ends_with(' ') {
            out.pop();
        }
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
