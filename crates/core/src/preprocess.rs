//! Lexical preprocessing: comment removal and `final` keyword erasure.
//!
//! Also hosts the literal scanner shared with brace balancing, so both
//! stages agree on what counts as a string or character literal.

/// Remove line and block comments and erase whole-word occurrences of `keyword`.
///
/// Comment openers inside string or character literals are kept. A block
/// comment collapses to a single space; a line comment stops before its line
/// break. Every later stage computes offsets against the returned buffer.
pub fn strip_source(src: &str, keyword: &str) -> String {
    erase_keyword(&strip_comments(src), keyword)
}

fn strip_comments(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let bytes = src.as_bytes();
    let mut i = 0;
    let mut last = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' if opens_literal(bytes, i) => i = skip_literal(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                out.push_str(&src[last..i]);
                while i < bytes.len() && bytes[i] != b'\n' && bytes[i] != b'\r' {
                    i += 1;
                }
                last = i;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                out.push_str(&src[last..i]);
                i = match src[i + 2..].find("*/") {
                    Some(rel) => i + 2 + rel + 2,
                    None => bytes.len(),
                };
                out.push(' ');
                last = i;
            }
            _ => i += 1,
        }
    }
    out.push_str(&src[last..]);
    out
}

/// Whether the quote at `pos` starts a literal.
///
/// A `'` inside a numeric literal is a digit separator (`1'000`, `0xFF'FF`):
/// walk back over the token and check whether it starts with a digit.
/// Prefixed character literals such as `u8'a'` start with a letter and still open.
pub(crate) fn opens_literal(bytes: &[u8], pos: usize) -> bool {
    if bytes[pos] != b'\'' {
        return true;
    }
    let mut start = pos;
    while start > 0 {
        let b = bytes[start - 1];
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'\'' || b == b'.' {
            start -= 1;
        } else {
            break;
        }
    }
    !(start < pos && bytes[start].is_ascii_digit())
}

/// Return the offset just past the literal opened at `start`.
/// Unterminated literals end at the line break so one stray quote can't eat the file.
pub(crate) fn skip_literal(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn erase_keyword(src: &str, keyword: &str) -> String {
    if keyword.is_empty() {
        return src.to_string();
    }
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let bytes = src.as_bytes();
    let mut out = String::with_capacity(src.len());
    let mut last = 0;
    for (pos, _) in src.match_indices(keyword) {
        let end = pos + keyword.len();
        let before_ok = pos == 0 || !is_ident(bytes[pos - 1]);
        let after_ok = end >= bytes.len() || !is_ident(bytes[end]);
        if before_ok && after_ok && pos >= last {
            out.push_str(&src[last..pos]);
            last = end;
        }
    }
    out.push_str(&src[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comment_removed_line_break_kept() {
        let out = strip_source("int a; // trailing\nint b;", "final");
        assert_eq!(out, "int a; \nint b;");
    }

    #[test]
    fn test_block_comment_spanning_lines() {
        let out = strip_source("class /* multi\nline */Foo {};", "final");
        assert_eq!(out, "class  Foo {};");
    }

    #[test]
    fn test_unterminated_block_comment_eats_rest() {
        let out = strip_source("int a; /* never closed\nint b;", "final");
        assert_eq!(out, "int a;  ");
    }

    #[test]
    fn test_comment_markers_inside_strings_kept() {
        let src = r#"const char *url = "http://x/*y*/"; char c = '/';"#;
        let out = strip_source(src, "final");
        assert_eq!(out, src, "string contents should survive, got:\n{out}");
    }

    #[test]
    fn test_digit_separator_is_not_a_char_literal() {
        let src = "int n = 1'000; // gone\nlong m = 0xFF'FF'FF; /* gone */ int k;";
        let out = strip_source(src, "final");
        assert_eq!(out, "int n = 1'000; \nlong m = 0xFF'FF'FF;   int k;");
    }

    #[test]
    fn test_opens_literal() {
        assert!(opens_literal(b"c = 'x'", 4));
        assert!(opens_literal(b"u8'x'", 2));
        assert!(opens_literal(b"s = \"x\"", 4));
        assert!(!opens_literal(b"1'000", 1));
        assert!(!opens_literal(b"1.5'0", 3));
    }

    #[test]
    fn test_final_keyword_erased_whole_word_only() {
        let out = strip_source("class Foo final : public Bar { void finalize(); };", "final");
        assert_eq!(out, "class Foo  : public Bar { void finalize(); };");
    }

    #[test]
    fn test_commented_out_marker_disappears() {
        let out = strip_source("// [[refl]] int x;\n/* [[refl]] */ int y;", "final");
        assert!(!out.contains("refl"), "markers in comments should be gone, got:\n{out}");
    }
}
