//! SQL `LIKE` patterns compiled to regular expressions.

use regex::{Regex, RegexBuilder};

/// A compiled `LIKE` pattern.
///
/// `%` matches any run of characters, `_` exactly one. The escape character,
/// when set, makes the character after it literal.
///
/// ```
/// use qualex::like::LikePattern;
///
/// let p = LikePattern::compile("50!%%", Some('!'), false).unwrap();
/// assert!(p.is_match("50% off"));
/// assert!(!p.is_match("500 off"));
/// ```
#[derive(Debug, Clone)]
pub struct LikePattern {
    regex: Regex,
}

impl LikePattern {
    pub fn compile(
        pattern: &str,
        escape: Option<char>,
        ignore_case: bool,
    ) -> Result<Self, regex::Error> {
        let mut source = String::with_capacity(pattern.len() + 8);
        source.push('^');

        let mut chars = pattern.chars();
        while let Some(ch) = chars.next() {
            match ch {
                c if Some(c) == escape => match chars.next() {
                    Some(literal) => push_literal(&mut source, literal),
                    // A trailing escape stands for itself
                    None => push_literal(&mut source, c),
                },
                '%' => source.push_str(".*"),
                '_' => source.push('.'),
                c => push_literal(&mut source, c),
            }
        }
        source.push('$');

        let regex = RegexBuilder::new(&source)
            .dot_matches_new_line(true)
            .case_insensitive(ignore_case)
            .build()?;
        Ok(LikePattern { regex })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

fn push_literal(source: &mut String, ch: char) {
    let mut buf = [0u8; 4];
    source.push_str(&regex::escape(ch.encode_utf8(&mut buf)));
}
