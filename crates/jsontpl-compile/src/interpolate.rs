//! Splits strings on `left ... right` interpolation delimiters.

use crate::options::StringOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// One delimited span. `start..end` is the byte range of the whole
/// `left capture right` text in the input; `capture` is untrimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub capture: String,
    pub start: usize,
    pub end: usize,
}

impl Placeholder {
    pub fn expression(&self) -> &str {
        self.capture.trim()
    }

    pub fn spans_whole(&self, input: &str) -> bool {
        self.start == 0 && self.end == input.len()
    }
}

/// Scans `input` left to right.
///
/// A run of `escape` tokens directly before `left` is halved: each pair
/// becomes one literal `escape`, and an odd one left over turns `left` into
/// text. Escapes not followed by `left` are kept verbatim. A capture runs to the first following `right`; a `left` with no matching
/// `right` is text. Empty delimiters disable interpolation.
pub fn segments(input: &str, options: &StringOptions) -> Vec<Segment> {
    let left = options.left.as_str();
    let right = options.right.as_str();
    let escape = options.escape.as_str();

    if left.is_empty() || right.is_empty() {
        return literal_only(input);
    }

    let mut out = Vec::new();
    let mut literal = String::new();
    let mut pos = 0;

    while pos < input.len() {
        let rest = &input[pos..];

        if !escape.is_empty() && rest.starts_with(escape) {
            let mut run = 0;
            while rest[run * escape.len()..].starts_with(escape) {
                run += 1;
            }
            let after = pos + run * escape.len();

            if !input[after..].starts_with(left) {
                literal.push_str(&input[pos..after]);
                pos = after;
                continue;
            }

            for _ in 0..run / 2 {
                literal.push_str(escape);
            }
            pos = after;
            if run % 2 == 1 {
                literal.push_str(left);
                pos += left.len();
            }
            continue;
        }

        if rest.starts_with(left) {
            let open = pos + left.len();
            match input[open..].find(right) {
                Some(offset) => {
                    if !literal.is_empty() {
                        out.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let end = open + offset + right.len();
                    out.push(Segment::Placeholder(Placeholder {
                        capture: input[open..open + offset].to_string(),
                        start: pos,
                        end,
                    }));
                    pos = end;
                }
                None => {
                    literal.push_str(rest);
                    pos = input.len();
                }
            }
            continue;
        }

        // Always advance by a whole char so slicing stays on boundaries.
        let ch = rest.chars().next().unwrap_or_default();
        literal.push(ch);
        pos += ch.len_utf8();
    }

    if !literal.is_empty() {
        out.push(Segment::Literal(literal));
    }
    out
}

fn literal_only(input: &str) -> Vec<Segment> {
    if input.is_empty() {
        Vec::new()
    } else {
        vec![Segment::Literal(input.to_string())]
    }
}

/// Replaces every placeholder in `input` with `on_match`'s result and
/// returns the reassembled string.
pub fn interpolate<F>(input: &str, options: &StringOptions, mut on_match: F) -> String
where
    F: FnMut(&Placeholder) -> String,
{
    let mut out = String::with_capacity(input.len());
    for segment in segments(input, options) {
        match segment {
            Segment::Literal(text) => out.push_str(&text),
            Segment::Placeholder(placeholder) => out.push_str(&on_match(&placeholder)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholder(capture: &str, start: usize, end: usize) -> Segment {
        Segment::Placeholder(Placeholder {
            capture: capture.to_string(),
            start,
            end,
        })
    }

    fn lit(text: &str) -> Segment {
        Segment::Literal(text.to_string())
    }

    #[test]
    fn plain_text() {
        let opts = StringOptions::default();
        assert_eq!(segments("hello", &opts), vec![lit("hello")]);
        assert!(segments("", &opts).is_empty());
    }

    #[test]
    fn single_whole_span() {
        let opts = StringOptions::default();
        let input = "{{ a + b }}";
        let segs = segments(input, &opts);
        assert_eq!(segs, vec![placeholder(" a + b ", 0, 11)]);

        let Segment::Placeholder(p) = &segs[0] else { panic!("expected placeholder") };
        assert!(p.spans_whole(input));
        assert_eq!(p.expression(), "a + b");
    }

    #[test]
    fn mixed_text_and_spans() {
        let opts = StringOptions::default();
        assert_eq!(
            segments("x={{n}}, y={{ m }}!", &opts),
            vec![
                lit("x="),
                placeholder("n", 2, 7),
                lit(", y="),
                placeholder(" m ", 11, 18),
                lit("!"),
            ]
        );
    }

    #[test]
    fn adjacent_spans() {
        let opts = StringOptions::default();
        assert_eq!(
            segments("{{a}}{{b}}", &opts),
            vec![placeholder("a", 0, 5), placeholder("b", 5, 10)]
        );
    }

    #[test]
    fn escaped_left_is_literal() {
        let opts = StringOptions::default();
        assert_eq!(segments("\\{{ a }}", &opts), vec![lit("{{ a }}")]);
        assert_eq!(
            segments("\\{{a}} {{b}}", &opts),
            vec![lit("{{a}} "), placeholder("b", 7, 12)]
        );
    }

    #[test]
    fn escaped_escape_keeps_span_live() {
        let opts = StringOptions::default();
        assert_eq!(
            segments("C:\\\\{{ dir }}", &opts),
            vec![lit("C:\\"), placeholder(" dir ", 4, 13)]
        );
        assert_eq!(segments("\\\\\\{{a}}", &opts), vec![lit("\\{{a}}")]);
        assert_eq!(
            segments("\\\\\\\\{{a}}", &opts),
            vec![lit("\\\\"), placeholder("a", 4, 9)]
        );
    }

    #[test]
    fn escape_runs_without_left_are_verbatim() {
        let opts = StringOptions::default();
        assert_eq!(segments("a\\\\b {{c}}", &opts), vec![lit("a\\\\b "), placeholder("c", 5, 10)]);
    }

    #[test]
    fn lone_escape_is_kept() {
        let opts = StringOptions::default();
        assert_eq!(segments("a\\b", &opts), vec![lit("a\\b")]);
    }

    #[test]
    fn unmatched_left_is_literal() {
        let opts = StringOptions::default();
        assert_eq!(segments("a {{ b", &opts), vec![lit("a {{ b")]);
    }

    #[test]
    fn custom_delimiters() {
        let opts = StringOptions {
            left: "<%".to_string(),
            right: "%>".to_string(),
            escape: "!".to_string(),
        };
        assert_eq!(
            segments("{{x}} <%y%> !<%z%>", &opts),
            vec![lit("{{x}} "), placeholder("y", 6, 11), lit(" <%z%>")]
        );
    }

    #[test]
    fn empty_delimiters_disable_interpolation() {
        let opts = StringOptions {
            left: String::new(),
            ..StringOptions::default()
        };
        assert_eq!(segments("{{a}}", &opts), vec![lit("{{a}}")]);
    }

    #[test]
    fn multibyte_text() {
        let opts = StringOptions::default();
        assert_eq!(
            segments("é{{a}}ü", &opts),
            vec![lit("é"), placeholder("a", 2, 7), lit("ü")]
        );
    }

    #[test]
    fn interpolate_replaces_spans() {
        let opts = StringOptions::default();
        let out = interpolate("x={{ n }}, y={{m}}", &opts, |p| format!("<{}>", p.expression()));
        assert_eq!(out, "x=<n>, y=<m>");
    }
}
