//! Splits a line into word-diff tokens.

const DELIMITERS: &[char] = &[
    ' ', '\t', '\r', '\n', '.', ',', ';', ':', '(', ')', '{', '}', '[', ']', '<', '>', '=', '+',
    '-', '*', '/', '%', '&', '|', '^', '!', '~', '?', '\'', '"', '`', '@', '#', '$', '\\',
];

pub fn is_delimiter(c: char) -> bool {
    DELIMITERS.contains(&c)
}

/// Every delimiter becomes its own one-character token; maximal runs of
/// other characters become single tokens. The tokens concatenate back to
/// `text`.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;

    for (idx, c) in text.char_indices() {
        if is_delimiter(c) {
            if let Some(start) = word_start.take() {
                tokens.push(&text[start..idx]);
            }
            tokens.push(&text[idx..idx + c.len_utf8()]);
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }

    if let Some(start) = word_start {
        tokens.push(&text[start..]);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_call_expression() {
        assert_eq!(tokenize("a.b(c)"), vec!["a", ".", "b", "(", "c", ")"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_whitespace_runs_are_split_per_char() {
        assert_eq!(tokenize("let  x"), vec!["let", " ", " ", "x"]);
    }

    #[test]
    fn test_multibyte_words_stay_whole() {
        let text = "größe+=ü";
        let tokens = tokenize(text);
        assert_eq!(tokens, vec!["größe", "+", "=", "ü"]);
        assert_eq!(tokens.concat(), text);
    }
}
