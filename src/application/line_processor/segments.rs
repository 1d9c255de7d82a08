//! Word-level diff spans and their mapping onto highlight tokens.

use crate::domain::{DiffError, Emphasis, LineSegment};
use crate::infra::diff::tokenize;
use crate::infra::syntax::HighlightToken;
use similar::{Algorithm, DiffTag, capture_diff_slices};
use std::ops::Range;

/// A byte range of a line with its word-diff emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub range: Range<usize>,
    pub emphasis: Option<Emphasis>,
}

/// One unemphasized span covering the whole line.
pub fn whole_line(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    push_span(&mut spans, 0..text.len(), None);
    spans
}

/// Computes emphasis spans for a removed/added line pair.
///
/// Tokens only on the old side become `Removed`, tokens only on the new
/// side become `Added`. Adjacent spans with equal emphasis are merged.
pub fn word_diff_spans(old: &str, new: &str) -> (Vec<Span>, Vec<Span>) {
    let old_tokens = tokenize(old);
    let new_tokens = tokenize(new);
    let old_offsets = token_offsets(&old_tokens);
    let new_offsets = token_offsets(&new_tokens);

    let mut old_spans = Vec::new();
    let mut new_spans = Vec::new();

    for op in capture_diff_slices(Algorithm::Lcs, &old_tokens, &new_tokens) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        let old_bytes = old_offsets[old_range.start]..old_offsets[old_range.end];
        let new_bytes = new_offsets[new_range.start]..new_offsets[new_range.end];
        match tag {
            DiffTag::Equal => {
                push_span(&mut old_spans, old_bytes, None);
                push_span(&mut new_spans, new_bytes, None);
            }
            DiffTag::Delete => push_span(&mut old_spans, old_bytes, Some(Emphasis::Removed)),
            DiffTag::Insert => push_span(&mut new_spans, new_bytes, Some(Emphasis::Added)),
            DiffTag::Replace => {
                push_span(&mut old_spans, old_bytes, Some(Emphasis::Removed));
                push_span(&mut new_spans, new_bytes, Some(Emphasis::Added));
            }
        }
    }

    (old_spans, new_spans)
}

/// Byte offset of each token start, plus the end of the line.
fn token_offsets(tokens: &[&str]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(tokens.len() + 1);
    let mut offset = 0;
    offsets.push(offset);
    for token in tokens {
        offset += token.len();
        offsets.push(offset);
    }
    offsets
}

fn push_span(spans: &mut Vec<Span>, range: Range<usize>, emphasis: Option<Emphasis>) {
    if range.is_empty() {
        return;
    }
    if let Some(last) = spans.last_mut()
        && last.emphasis == emphasis
        && last.range.end == range.start
    {
        last.range.end = range.end;
        return;
    }
    spans.push(Span { range, emphasis });
}

/// Builds the display segments of a line.
///
/// Without tokens every span becomes one uncolored segment. With tokens,
/// spans are subdivided at token boundaries so each piece carries a single
/// color; bytes no token covers stay uncolored. A span reaching past the
/// last token is a [`DiffError::HighlightMismatch`].
pub fn build_segments(
    text: &str,
    spans: &[Span],
    tokens: Option<&[HighlightToken]>,
) -> Result<Vec<LineSegment>, DiffError> {
    let Some(tokens) = tokens else {
        return Ok(spans
            .iter()
            .map(|span| LineSegment::styled(&text[span.range.clone()], span.emphasis, None))
            .collect());
    };

    let available = tokens.last().map(HighlightToken::end).unwrap_or(0);
    let mut segments = Vec::new();
    let mut token_index = 0;

    for span in spans {
        if span.range.end > available {
            return Err(DiffError::HighlightMismatch {
                offset: span.range.end,
                available,
            });
        }

        let mut cursor = span.range.start;
        while cursor < span.range.end {
            while token_index < tokens.len() && tokens[token_index].end() <= cursor {
                token_index += 1;
            }
            let Some(token) = tokens.get(token_index) else {
                return Err(DiffError::HighlightMismatch {
                    offset: cursor,
                    available,
                });
            };

            if token.offset > cursor {
                let end = token.offset.min(span.range.end);
                segments.push(LineSegment::styled(&text[cursor..end], span.emphasis, None));
                cursor = end;
                continue;
            }

            let end = token.end().min(span.range.end);
            segments.push(LineSegment::styled(
                &text[cursor..end],
                span.emphasis,
                Some(token.color),
            ));
            cursor = end;
        }
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Rgb;

    fn token(text: &str, offset: usize, color: Rgb) -> HighlightToken {
        HighlightToken {
            text: text.to_string(),
            color,
            offset,
        }
    }

    fn emphasized<'a>(text: &'a str, spans: &[Span]) -> Vec<&'a str> {
        spans
            .iter()
            .filter(|span| span.emphasis.is_some())
            .map(|span| &text[span.range.clone()])
            .collect()
    }

    #[test]
    fn test_single_word_change_is_isolated() {
        let (old, new) = word_diff_spans("let value = 1;", "let value = 2;");
        assert_eq!(emphasized("let value = 1;", &old), vec!["1"]);
        assert_eq!(emphasized("let value = 2;", &new), vec!["2"]);
        assert_eq!(old.len(), 3);
    }

    #[test]
    fn test_identical_lines_have_no_emphasis() {
        let (old, new) = word_diff_spans("same", "same");
        assert_eq!(old, whole_line("same"));
        assert_eq!(new, whole_line("same"));
    }

    #[test]
    fn test_insertion_only_touches_new_side() {
        let (old, new) = word_diff_spans("call(a)", "call(a, b)");
        assert!(old.iter().all(|span| span.emphasis.is_none()));
        assert_eq!(emphasized("call(a, b)", &new), vec![", b"]);
    }

    #[test]
    fn test_spans_cover_both_lines() {
        let old_text = "foo.bar(baz)";
        let new_text = "foo.qux(baz, 1)";
        let (old, new) = word_diff_spans(old_text, new_text);
        assert_eq!(old.first().unwrap().range.start, 0);
        assert_eq!(old.last().unwrap().range.end, old_text.len());
        assert_eq!(new.last().unwrap().range.end, new_text.len());
        for pair in new.windows(2) {
            assert_eq!(pair[0].range.end, pair[1].range.start);
            assert_ne!(pair[0].emphasis, pair[1].emphasis);
        }
    }

    #[test]
    fn test_empty_lines_produce_no_spans() {
        let (old, new) = word_diff_spans("", "");
        assert!(old.is_empty());
        assert!(new.is_empty());
    }

    #[test]
    fn test_segments_without_tokens_follow_spans() {
        let text = "a = 1";
        let spans = vec![
            Span {
                range: 0..4,
                emphasis: None,
            },
            Span {
                range: 4..5,
                emphasis: Some(Emphasis::Added),
            },
        ];
        let segments = build_segments(text, &spans, None).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].text_str(), "1");
        assert_eq!(segments[1].emphasis, Some(Emphasis::Added));
        assert!(segments.iter().all(|s| s.foreground.is_none()));
    }

    #[test]
    fn test_spans_split_at_token_boundaries() {
        let red = Rgb::new(255, 0, 0);
        let blue = Rgb::new(0, 0, 255);
        let text = "let x";
        let tokens = vec![token("let", 0, red), token(" x", 3, blue)];
        let spans = vec![
            Span {
                range: 0..2,
                emphasis: None,
            },
            Span {
                range: 2..5,
                emphasis: Some(Emphasis::Removed),
            },
        ];
        let segments = build_segments(text, &spans, Some(&tokens)).unwrap();
        let pieces: Vec<_> = segments
            .iter()
            .map(|s| (s.text_str(), s.emphasis, s.foreground))
            .collect();
        assert_eq!(
            pieces,
            vec![
                ("le", None, Some(red)),
                ("t", Some(Emphasis::Removed), Some(red)),
                (" x", Some(Emphasis::Removed), Some(blue)),
            ]
        );
    }

    #[test]
    fn test_gap_between_tokens_is_uncolored() {
        let red = Rgb::new(255, 0, 0);
        let tokens = vec![token("a", 0, red), token("c", 2, red)];
        let segments = build_segments("abc", &whole_line("abc"), Some(&tokens)).unwrap();
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[1].text_str(), "b");
        assert_eq!(segments[1].foreground, None);
    }

    #[test]
    fn test_span_past_tokens_is_mismatch() {
        let tokens = vec![token("ab", 0, Rgb::new(1, 2, 3))];
        let err = build_segments("abcd", &whole_line("abcd"), Some(&tokens)).unwrap_err();
        assert_eq!(
            err,
            DiffError::HighlightMismatch {
                offset: 4,
                available: 2
            }
        );
    }
}
