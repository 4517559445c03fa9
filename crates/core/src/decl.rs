//! Declaration recognition behind a narrow offset-in, offset-out contract.
//!
//! The locator and extractor never look at C++ grammar themselves. Given a
//! cursor sitting on an annotation marker they ask a [`DeclParser`] where the
//! following declaration ends and where its name begins, and slice the name
//! out of the buffer themselves.

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Finds the boundaries of the declaration that follows an annotation marker.
///
/// All offsets are byte offsets into `buf`; `pos` is the start of the marker.
pub trait DeclParser {
    /// Offset just past the terminator of a field declaration (`;`, `=` or a
    /// brace initializer's `{`), or `None` if no field declaration follows.
    fn field_end(&self, buf: &str, pos: usize) -> Option<usize>;

    /// Offset just past the `(` opening a method's parameter list, or `None`
    /// if no method declaration follows.
    fn method_end(&self, buf: &str, pos: usize) -> Option<usize>;

    /// Offset of the declared name, past the marker and any type tokens.
    fn name_start(&self, buf: &str, pos: usize) -> usize;
}

// ---------------------------------------------------------------------------
// Token-level implementation
// ---------------------------------------------------------------------------

/// Shape of a recognized declaration head: `[[attr]]... type-tokens name <term>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DeclHead {
    name_start: usize,
    /// Offset of the terminator byte.
    term: usize,
    term_byte: u8,
}

/// Recognizes declarations by walking identifier, template-argument, pointer
/// and reference tokens until a terminator shows up.
///
/// At least one type token must precede the name. Operator overloads,
/// bit-fields and array declarators are not recognized.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenDeclParser;

impl TokenDeclParser {
    pub fn new() -> Self {
        TokenDeclParser
    }

    fn scan(&self, buf: &str, pos: usize) -> Option<DeclHead> {
        let bytes = buf.as_bytes();
        let mut i = skip_attributes(bytes, pos)?;
        let mut tokens = 0usize;
        let mut last_ident: Option<usize> = None;

        loop {
            i = skip_ws(bytes, i);
            let b = *bytes.get(i)?;
            match b {
                b';' | b'=' | b'{' | b'(' => {
                    let name_start = last_ident?;
                    if tokens < 2 {
                        return None;
                    }
                    return Some(DeclHead { name_start, term: i, term_byte: b });
                }
                b'[' if bytes.get(i + 1) == Some(&b'[') => {
                    i = skip_attributes(bytes, i)?;
                }
                b'<' => {
                    i = skip_angles(bytes, i)?;
                    last_ident = None;
                    tokens += 1;
                }
                b'*' | b'&' => {
                    i += 1;
                    last_ident = None;
                    tokens += 1;
                }
                c if is_ident_start(c) || bytes[i..].starts_with(b"::") => {
                    let start = i;
                    i = read_qualified_ident(bytes, i)?;
                    let word = &buf[start..i];
                    if word == "operator" || word.ends_with("::operator") {
                        return None;
                    }
                    last_ident = Some(start);
                    tokens += 1;
                }
                _ => return None,
            }
        }
    }
}

impl DeclParser for TokenDeclParser {
    fn field_end(&self, buf: &str, pos: usize) -> Option<usize> {
        let head = self.scan(buf, pos)?;
        matches!(head.term_byte, b';' | b'=' | b'{').then_some(head.term + 1)
    }

    fn method_end(&self, buf: &str, pos: usize) -> Option<usize> {
        let head = self.scan(buf, pos)?;
        (head.term_byte == b'(').then_some(head.term + 1)
    }

    fn name_start(&self, buf: &str, pos: usize) -> usize {
        self.scan(buf, pos).map(|h| h.name_start).unwrap_or(pos)
    }
}

// ---------------------------------------------------------------------------
// Byte-level helpers
// ---------------------------------------------------------------------------

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn skip_ws(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Skip any number of `[[...]]` blocks (and the whitespace around them).
fn skip_attributes(bytes: &[u8], mut i: usize) -> Option<usize> {
    loop {
        i = skip_ws(bytes, i);
        if !bytes[i..].starts_with(b"[[") {
            return Some(i);
        }
        let close = bytes[i + 2..].windows(2).position(|w| w == b"]]")?;
        i = i + 2 + close + 2;
    }
}

/// Read `ident(::ident)*`, optionally starting with `::`. Whitespace around
/// `::` is tolerated.
fn read_qualified_ident(bytes: &[u8], mut i: usize) -> Option<usize> {
    if bytes[i..].starts_with(b"::") {
        i = skip_ws(bytes, i + 2);
    }
    loop {
        if !bytes.get(i).copied().is_some_and(is_ident_start) {
            return None;
        }
        while i < bytes.len() && is_ident_char(bytes[i]) {
            i += 1;
        }
        let after = skip_ws(bytes, i);
        if bytes[after..].starts_with(b"::") {
            i = skip_ws(bytes, after + 2);
        } else {
            return Some(i);
        }
    }
}

/// Skip a balanced `<...>` template argument list starting at `i`.
fn skip_angles(bytes: &[u8], mut i: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut parens = 0i32;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => parens += 1,
            b')' => parens -= 1,
            b'<' if parens == 0 => depth += 1,
            b'>' if parens == 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            b';' | b'{' | b'}' => return None,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Strip terminators, assignment tokens and whitespace from a sliced declaration name.
pub fn trim_decl_name<'a>(raw: &'a str, delims: &[char]) -> &'a str {
    raw.trim_matches(|c: char| c.is_whitespace() || delims.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_name(src: &str) -> Option<String> {
        let p = TokenDeclParser::new();
        let end = p.field_end(src, 0)?;
        let start = p.name_start(src, 0);
        Some(trim_decl_name(&src[start..end], &[';', '=', '{']).to_string())
    }

    fn method_name(src: &str) -> Option<String> {
        let p = TokenDeclParser::new();
        let end = p.method_end(src, 0)?;
        let start = p.name_start(src, 0);
        Some(trim_decl_name(&src[start..end], &['(', '=']).to_string())
    }

    #[test]
    fn test_simple_field() {
        assert_eq!(field_name("[[refl]] int x;").as_deref(), Some("x"));
    }

    #[test]
    fn test_field_with_initializer() {
        assert_eq!(field_name("[[refl]] size_t n_bootstrap = 100000u;").as_deref(), Some("n_bootstrap"));
        assert_eq!(field_name("[[refl]] Float clamp = 1e5;").as_deref(), Some("clamp"));
        assert_eq!(field_name("[[refl]] int spp{16};").as_deref(), Some("spp"));
    }

    #[test]
    fn test_field_with_template_and_qualified_type() {
        assert_eq!(
            field_name("[[refl]] std::shared_ptr<Texture> color;").as_deref(),
            Some("color")
        );
        assert_eq!(
            field_name("[[ akari::refl ]] std::map<std::string, std::vector<int>> table;")
                .as_deref(),
            Some("table")
        );
        assert_eq!(field_name("[[refl]] fs::path file;").as_deref(), Some("file"));
    }

    #[test]
    fn test_field_pointer_and_reference() {
        assert_eq!(field_name("[[refl]] const Mesh *mesh = nullptr;").as_deref(), Some("mesh"));
        assert_eq!(field_name("[[refl]] Scene &scene;").as_deref(), Some("scene"));
    }

    #[test]
    fn test_field_spanning_lines_and_extra_attributes() {
        assert_eq!(
            field_name("[[refl]]\n    [[maybe_unused]] std::vector<float>\n    weights;").as_deref(),
            Some("weights")
        );
    }

    #[test]
    fn test_method_not_a_field() {
        let p = TokenDeclParser::new();
        assert_eq!(p.field_end("[[refl]] void commit() override;", 0), None);
        assert_eq!(p.field_end("[[refl]] bool support_bidirectional() const { return true; }", 0), None);
    }

    #[test]
    fn test_field_not_a_method() {
        let p = TokenDeclParser::new();
        assert_eq!(p.method_end("[[refl]] int x;", 0), None);
    }

    #[test]
    fn test_method_names() {
        assert_eq!(method_name("[[refl]] void commit() override;").as_deref(), Some("commit"));
        assert_eq!(
            method_name("[[refl]] virtual std::shared_ptr<Light> make_light (int i);").as_deref(),
            Some("make_light")
        );
        assert_eq!(
            method_name("[[refl]] void compute_scattering_functions(SurfaceInteraction *si,\n    Float scale) const override {")
                .as_deref(),
            Some("compute_scattering_functions")
        );
    }

    #[test]
    fn test_method_end_is_past_open_paren() {
        let src = "[[refl]] void commit();";
        let end = TokenDeclParser::new().method_end(src, 0).unwrap();
        assert_eq!(&src[..end], "[[refl]] void commit(");
    }

    #[test]
    fn test_unrecognized_declarations() {
        let p = TokenDeclParser::new();
        // name only, no type
        assert_eq!(p.field_end("[[refl]] x;", 0), None);
        // constructor
        assert_eq!(p.method_end("[[refl]] Foo(int a);", 0), None);
        // bit-field
        assert_eq!(p.field_end("[[refl]] int flags : 3;", 0), None);
        // array declarator
        assert_eq!(p.field_end("[[refl]] float m[16];", 0), None);
        // operator overload
        assert_eq!(p.method_end("[[refl]] bool operator==(const Foo &o) const;", 0), None);
        // marker at end of class body
        assert_eq!(p.field_end("[[refl]] }", 0), None);
        // unterminated marker
        assert_eq!(p.field_end("[[refl", 0), None);
    }

    #[test]
    fn test_name_start_falls_back_to_pos() {
        let p = TokenDeclParser::new();
        assert_eq!(p.name_start("xx [[refl]] }", 3), 3);
    }
}
