use crate::error::TokenizerError;
use crate::token::{LexContext, Location, Token, TokenKind};

/// Tokenize schema source into a flat token list terminated by `Eof`.
///
/// Comments are kept as tokens; the parser skips them.
pub fn tokenize(src: &str, filename: &str) -> Result<Vec<Token>, TokenizerError> {
    let mut lexer = Lexer::new(src, filename);
    lexer.run()?;
    tracing::trace!(file = filename, tokens = lexer.tokens.len(), "tokenized source");
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    filename: &'a str,
    tokens: Vec<Token>,
    contexts: Vec<LexContext>,
    /// Context opened by the next `do`, set by `schema` / `input`.
    pending: Option<LexContext>,
}

impl<'a> Lexer<'a> {
    fn new(src: &str, filename: &'a str) -> Self {
        Lexer {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            filename,
            tokens: Vec::new(),
            contexts: Vec::new(),
            pending: None,
        }
    }

    fn at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.at(0)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn err(&self, location: Location, msg: impl Into<String>) -> TokenizerError {
        TokenizerError::new(self.filename, location, msg)
    }

    fn push(&mut self, kind: TokenKind, raw: impl Into<String>, location: Location) {
        self.tokens.push(Token::new(kind, raw, location));
    }

    /// Consume `len` characters and emit them as one token.
    fn emit(&mut self, kind: TokenKind, len: usize) {
        let start = self.location();
        let raw: String = self.chars[self.pos..self.pos + len].iter().collect();
        for _ in 0..len {
            self.bump();
        }
        self.push(kind, raw, start);
    }

    fn run(&mut self) -> Result<(), TokenizerError> {
        while let Some(c) = self.at(0) {
            if c.is_whitespace() {
                self.bump();
                continue;
            }

            if c == '#' {
                self.lex_comment();
                continue;
            }

            if c == '"' || c == '\'' {
                self.lex_string(c)?;
                continue;
            }

            if c.is_ascii_digit() || (c == '-' && self.at(1).is_some_and(|n| n.is_ascii_digit())) {
                self.lex_number();
                continue;
            }

            if c.is_alphabetic() || c == '_' {
                self.lex_word();
                continue;
            }

            self.lex_punct(c)?;
        }

        let eof = self.location();
        self.push(TokenKind::Eof, "", eof);
        Ok(())
    }

    fn lex_comment(&mut self) {
        let start = self.location();
        self.bump(); // '#'
        let mut text = String::new();
        while let Some(c) = self.at(0) {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.bump();
        }
        self.push(TokenKind::Comment, text.trim(), start);
    }

    fn lex_string(&mut self, quote: char) -> Result<(), TokenizerError> {
        let start = self.location();
        self.bump();
        let mut s = String::new();
        loop {
            let Some(c) = self.bump() else {
                return Err(self.err(start, "Unterminated string literal"));
            };
            if c == quote {
                break;
            }
            if c == '\\' {
                let Some(escaped) = self.bump() else {
                    return Err(self.err(start, "Unterminated string literal"));
                };
                match escaped {
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    'r' => s.push('\r'),
                    '\\' => s.push('\\'),
                    '"' => s.push('"'),
                    '\'' => s.push('\''),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
                continue;
            }
            s.push(c);
        }
        self.push(TokenKind::String, s, start);
        Ok(())
    }

    fn lex_number(&mut self) {
        let start = self.location();
        let mut raw = String::new();
        if self.at(0) == Some('-') {
            raw.push('-');
            self.bump();
        }
        self.take_digits(&mut raw);
        // A '.' only belongs to the number when a digit follows it.
        let kind = if self.at(0) == Some('.') && self.at(1).is_some_and(|c| c.is_ascii_digit()) {
            raw.push('.');
            self.bump();
            self.take_digits(&mut raw);
            TokenKind::Float
        } else {
            TokenKind::Integer
        };
        self.push(kind, raw, start);
    }

    fn take_digits(&mut self, raw: &mut String) {
        while let Some(c) = self.at(0) {
            let separator = c == '_' && self.at(1).is_some_and(|n| n.is_ascii_digit());
            if !(c.is_ascii_digit() || separator) {
                break;
            }
            raw.push(c);
            self.bump();
        }
    }

    fn take_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.at(0) {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            word.push(c);
            self.bump();
        }
        word
    }

    fn is_word_start(c: Option<char>) -> bool {
        c.is_some_and(|c| c.is_alphabetic() || c == '_')
    }

    fn lex_word(&mut self) {
        let start = self.location();
        let mut word = self.take_word();

        // A::B::C
        if self.at(0) == Some(':') && self.at(1) == Some(':') && Self::is_word_start(self.at(2)) {
            while self.at(0) == Some(':') && self.at(1) == Some(':') && Self::is_word_start(self.at(2))
            {
                self.bump();
                self.bump();
                word.push_str("::");
                word.push_str(&self.take_word());
            }
            self.push(TokenKind::Constant, word, start);
            return;
        }

        // `domain:` is a label; `a:b` is an identifier followed by a symbol.
        if self.at(0) == Some(':') && self.at(1) != Some(':') && !Self::is_word_start(self.at(1)) {
            self.bump();
            self.push(TokenKind::Label, word, start);
            return;
        }

        if word.starts_with(|c: char| c.is_uppercase()) {
            self.push(TokenKind::Constant, word, start);
            return;
        }

        let kind = TokenKind::keyword(&word).unwrap_or(TokenKind::Identifier);
        self.track_context(kind);
        let mut token = Token::new(kind, word, start);
        if kind == TokenKind::Identifier {
            token.context = self.contexts.last().copied();
        }
        self.tokens.push(token);
    }

    fn track_context(&mut self, kind: TokenKind) {
        match kind {
            TokenKind::Schema => self.pending = Some(LexContext::Schema),
            // `input.x` is a reference, not the input block.
            TokenKind::Input if self.at(0) != Some('.') => self.pending = Some(LexContext::Input),
            TokenKind::Do => {
                let ctx = self.pending.take().unwrap_or(LexContext::Block);
                self.contexts.push(ctx);
            }
            TokenKind::End => {
                self.contexts.pop();
            }
            _ => {}
        }
    }

    fn lex_punct(&mut self, c: char) -> Result<(), TokenizerError> {
        let next = self.at(1);
        match c {
            '+' => self.emit(TokenKind::Add, 1),
            '-' => self.emit(TokenKind::Subtract, 1),
            '*' if next == Some('*') => self.emit(TokenKind::Exponent, 2),
            '*' => self.emit(TokenKind::Multiply, 1),
            '/' => self.emit(TokenKind::Divide, 1),
            '%' => self.emit(TokenKind::Modulo, 1),
            '=' if next == Some('=') => self.emit(TokenKind::Eq, 2),
            '=' if next == Some('>') => self.emit(TokenKind::Arrow, 2),
            '=' => {
                return Err(self.err(self.location(), "Unexpected '=' (did you mean '=='?)"));
            }
            '!' if next == Some('=') => self.emit(TokenKind::Ne, 2),
            '!' => {
                return Err(self.err(self.location(), "Unexpected '!' (did you mean '!='?)"));
            }
            '>' if next == Some('=') => self.emit(TokenKind::Ge, 2),
            '>' => self.emit(TokenKind::Gt, 1),
            '<' if next == Some('=') => self.emit(TokenKind::Le, 2),
            '<' => self.emit(TokenKind::Lt, 1),
            '&' if next == Some('&') => self.emit(TokenKind::And, 2),
            '&' => self.emit(TokenKind::And, 1),
            '|' if next == Some('|') => self.emit(TokenKind::Or, 2),
            '|' => self.emit(TokenKind::Or, 1),
            '(' => self.emit(TokenKind::LParen, 1),
            ')' => self.emit(TokenKind::RParen, 1),
            '[' => self.emit(TokenKind::LBracket, 1),
            ']' => self.emit(TokenKind::RBracket, 1),
            '{' => self.emit(TokenKind::LBrace, 1),
            '}' => self.emit(TokenKind::RBrace, 1),
            ',' => self.emit(TokenKind::Comma, 1),
            '.' if next == Some('.') && self.at(2) == Some('.') => {
                self.emit(TokenKind::DotDotDot, 3)
            }
            '.' if next == Some('.') => self.emit(TokenKind::DotDot, 2),
            '.' => self.emit(TokenKind::Dot, 1),
            ':' if Self::is_word_start(next) => {
                let start = self.location();
                self.bump();
                let name = self.take_word();
                self.push(TokenKind::Symbol, name, start);
            }
            ':' => self.emit(TokenKind::Colon, 1),
            other => {
                return Err(self.err(
                    self.location(),
                    format!("Unexpected character '{}'", other),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src, "test")
            .expect("lex")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn raws(src: &str) -> Vec<String> {
        tokenize(src, "test")
            .expect("lex")
            .into_iter()
            .map(|t| t.raw)
            .collect()
    }

    #[test]
    fn spaced_minus_is_subtraction() {
        let tokens = tokenize("x - 5", "test").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::Identifier,
                TokenKind::Subtract,
                TokenKind::Integer,
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[2].raw, "5");
    }

    #[test]
    fn minus_before_digit_folds_into_literal() {
        let tokens = tokenize("fn(:f, -5, -3.14)", "test").unwrap();
        assert_eq!(tokens[4].kind, TokenKind::Integer);
        assert_eq!(tokens[4].raw, "-5");
        assert_eq!(tokens[6].kind, TokenKind::Float);
        assert_eq!(tokens[6].raw, "-3.14");
    }

    #[test]
    fn minus_before_space_then_digit_is_operator() {
        assert_eq!(
            kinds("- 5"),
            vec![TokenKind::Subtract, TokenKind::Integer, TokenKind::Eof]
        );
    }

    #[test]
    fn double_star_is_exponent_only_when_adjacent() {
        assert_eq!(
            kinds("2 ** 3"),
            vec![
                TokenKind::Integer,
                TokenKind::Exponent,
                TokenKind::Integer,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("2 * * 3"),
            vec![
                TokenKind::Integer,
                TokenKind::Multiply,
                TokenKind::Multiply,
                TokenKind::Integer,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn bare_equals_is_rejected() {
        let err = tokenize("value :a, 1 = 2", "test").unwrap_err();
        assert!(err.message.contains("did you mean '=='?"), "{}", err.message);
        assert_eq!(err.location, Location::new(1, 13));
    }

    #[test]
    fn bare_bang_is_rejected() {
        let err = tokenize("!x", "test").unwrap_err();
        assert!(err.message.contains("'!='"));
        assert_eq!(kinds("a != b")[1], TokenKind::Ne);
    }

    #[test]
    fn colon_forms() {
        assert_eq!(
            kinds(":name domain: x : Float::INFINITY"),
            vec![
                TokenKind::Symbol,
                TokenKind::Label,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Constant,
                TokenKind::Eof
            ]
        );
        assert_eq!(raws(":name domain: A::B::C")[..3], ["name", "domain", "A::B::C"]);
    }

    #[test]
    fn strings_use_matching_quote_and_escapes() {
        let tokens = tokenize(r#"'it\'s' "a\tb\n" "say 'hi'""#, "test").unwrap();
        assert_eq!(tokens[0].raw, "it's");
        assert_eq!(tokens[1].raw, "a\tb\n");
        assert_eq!(tokens[2].raw, "say 'hi'");
    }

    #[test]
    fn unterminated_string_points_at_opening_quote() {
        let err = tokenize("value :a, \"oops", "test").unwrap_err();
        assert_eq!(err.location, Location::new(1, 11));
        assert!(err.message.contains("Unterminated"));
    }

    #[test]
    fn numbers_with_separators_and_member_dots() {
        assert_eq!(raws("1_000_000 2.5"), vec!["1_000_000", "2.5", ""]);
        assert_eq!(
            kinds("5.field"),
            vec![
                TokenKind::Integer,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn ranges_and_comparisons() {
        assert_eq!(
            kinds("1..5 0.0...1.0 a >= b <= c > d < e"),
            vec![
                TokenKind::Integer,
                TokenKind::DotDot,
                TokenKind::Integer,
                TokenKind::Float,
                TokenKind::DotDotDot,
                TokenKind::Float,
                TokenKind::Identifier,
                TokenKind::Ge,
                TokenKind::Identifier,
                TokenKind::Le,
                TokenKind::Identifier,
                TokenKind::Gt,
                TokenKind::Identifier,
                TokenKind::Lt,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn comments_are_kept() {
        let tokens = tokenize("# header\nvalue # trailing", "test").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].raw, "header");
        assert_eq!(tokens[1].kind, TokenKind::Value);
        assert_eq!(tokens[1].location, Location::new(2, 1));
        assert_eq!(tokens[2].raw, "trailing");
    }

    #[test]
    fn logical_operator_spellings() {
        assert_eq!(
            kinds("a and b & c && d or e | f || g")
                .into_iter()
                .filter(|k| matches!(k, TokenKind::And | TokenKind::Or))
                .count(),
            6
        );
    }

    #[test]
    fn identifiers_carry_block_context() {
        let src = "schema do\n input do\n integer :x\n end\n value :y, z\nend";
        let tokens = tokenize(src, "test").unwrap();
        let z = tokens.iter().find(|t| t.raw == "z").unwrap();
        assert_eq!(z.context, Some(LexContext::Schema));
    }

    #[test]
    fn unbalanced_end_does_not_panic() {
        assert!(tokenize("end end end", "test").is_ok());
    }

    #[test]
    fn unknown_character_is_an_error() {
        let err = tokenize("value :a, 1 @ 2", "test").unwrap_err();
        assert!(err.message.contains("'@'"));
        assert_eq!(err.location.column, 13);
    }

    #[test]
    fn always_ends_with_eof() {
        let tokens = tokenize("", "test").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Eof);
    }
}
