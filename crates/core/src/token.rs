//! Token kinds, source locations and the static token metadata table.
//!
//! Every [`TokenKind`] maps to exactly one [`TokenMetadata`] record. The
//! table is a set of `static` items, so it is built at compile time and
//! shared read-only by every lexer and parser instance.

use serde::Serialize;

// ──────────────────────────────────────────────
// Locations
// ──────────────────────────────────────────────

/// A 1-based line/column position in a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Location { line, column }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ──────────────────────────────────────────────
// Token kinds
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    // Literals
    Integer,
    Float,
    String,
    Boolean,
    Symbol,
    // Names
    Identifier,
    Constant,
    Label,
    // Declaration keywords
    Schema,
    Input,
    Value,
    Trait,
    Let,
    Do,
    End,
    On,
    Base,
    Import,
    Fn,
    // Input type keywords
    IntegerType,
    FloatType,
    DecimalType,
    StringType,
    BooleanType,
    SymbolType,
    AnyType,
    ArrayType,
    HashType,
    ElementType,
    IndexType,
    // Operators
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Exponent,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    And,
    Or,
    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Colon,
    Arrow,
    DotDot,
    DotDotDot,
    Comment,
    Eof,
}

impl TokenKind {
    /// Metadata record for this kind, looked up in the static table.
    pub fn metadata(self) -> &'static TokenMetadata {
        metadata(self)
    }

    /// Maps a bare word to its keyword kind, if it is one.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "schema" => TokenKind::Schema,
            "input" => TokenKind::Input,
            "value" => TokenKind::Value,
            "trait" => TokenKind::Trait,
            "let" => TokenKind::Let,
            "do" => TokenKind::Do,
            "end" => TokenKind::End,
            "on" => TokenKind::On,
            "base" => TokenKind::Base,
            "import" => TokenKind::Import,
            "fn" => TokenKind::Fn,
            "integer" => TokenKind::IntegerType,
            "float" => TokenKind::FloatType,
            "decimal" => TokenKind::DecimalType,
            "string" => TokenKind::StringType,
            "boolean" => TokenKind::BooleanType,
            "symbol" => TokenKind::SymbolType,
            "any" => TokenKind::AnyType,
            "array" => TokenKind::ArrayType,
            "hash" => TokenKind::HashType,
            "element" => TokenKind::ElementType,
            "index" => TokenKind::IndexType,
            "true" | "false" => TokenKind::Boolean,
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            _ => return None,
        };
        Some(kind)
    }
}

// ──────────────────────────────────────────────
// Metadata
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Keyword,
    TypeKeyword,
    Operator,
    Literal,
    Identifier,
    Punctuation,
    Comment,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Associativity {
    Left,
    Right,
}

/// Static facts about a token kind shared by the lexer and the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TokenMetadata {
    pub category: Category,
    /// Binding strength for binary operators; 0 for everything else.
    pub precedence: u8,
    pub associativity: Option<Associativity>,
    /// Name of the call expression a binary operator builds.
    pub function: Option<&'static str>,
    /// Fixed spelling used when describing the token in messages.
    pub display: Option<&'static str>,
    /// True when the token may begin an expression.
    pub starts_expression: bool,
}

impl TokenMetadata {
    pub fn is_binary_operator(&self) -> bool {
        self.category == Category::Operator && self.precedence > 0
    }
}

const fn plain(category: Category, display: Option<&'static str>, starts: bool) -> TokenMetadata {
    TokenMetadata {
        category,
        precedence: 0,
        associativity: None,
        function: None,
        display,
        starts_expression: starts,
    }
}

const fn operator(
    display: &'static str,
    function: &'static str,
    precedence: u8,
    associativity: Associativity,
    starts: bool,
) -> TokenMetadata {
    TokenMetadata {
        category: Category::Operator,
        precedence,
        associativity: Some(associativity),
        function: Some(function),
        display: Some(display),
        starts_expression: starts,
    }
}

const fn keyword(display: &'static str) -> TokenMetadata {
    plain(Category::Keyword, Some(display), false)
}

const fn type_keyword(display: &'static str) -> TokenMetadata {
    plain(Category::TypeKeyword, Some(display), false)
}

const fn punct(display: &'static str, starts: bool) -> TokenMetadata {
    plain(Category::Punctuation, Some(display), starts)
}

use Associativity::{Left, Right};

static INTEGER: TokenMetadata = plain(Category::Literal, None, true);
static FLOAT: TokenMetadata = plain(Category::Literal, None, true);
static STRING: TokenMetadata = plain(Category::Literal, None, true);
static BOOLEAN: TokenMetadata = plain(Category::Literal, None, true);
static SYMBOL: TokenMetadata = plain(Category::Literal, None, true);
static IDENTIFIER: TokenMetadata = plain(Category::Identifier, None, true);
static CONSTANT: TokenMetadata = plain(Category::Identifier, None, true);
static LABEL: TokenMetadata = plain(Category::Identifier, None, false);

static SCHEMA: TokenMetadata = keyword("schema");
static INPUT: TokenMetadata = plain(Category::Keyword, Some("input"), true);
static VALUE: TokenMetadata = keyword("value");
static TRAIT: TokenMetadata = keyword("trait");
static LET: TokenMetadata = keyword("let");
static DO: TokenMetadata = keyword("do");
static END: TokenMetadata = keyword("end");
static ON: TokenMetadata = keyword("on");
static BASE: TokenMetadata = keyword("base");
static IMPORT: TokenMetadata = keyword("import");
static FN: TokenMetadata = plain(Category::Keyword, Some("fn"), true);

static INTEGER_TYPE: TokenMetadata = type_keyword("integer");
static FLOAT_TYPE: TokenMetadata = type_keyword("float");
static DECIMAL_TYPE: TokenMetadata = type_keyword("decimal");
static STRING_TYPE: TokenMetadata = type_keyword("string");
static BOOLEAN_TYPE: TokenMetadata = type_keyword("boolean");
static SYMBOL_TYPE: TokenMetadata = type_keyword("symbol");
static ANY_TYPE: TokenMetadata = type_keyword("any");
static ARRAY_TYPE: TokenMetadata = type_keyword("array");
static HASH_TYPE: TokenMetadata = type_keyword("hash");
static ELEMENT_TYPE: TokenMetadata = type_keyword("element");
static INDEX_TYPE: TokenMetadata = plain(Category::TypeKeyword, Some("index"), true);

static OR: TokenMetadata = operator("or", "or", 2, Left, false);
static AND: TokenMetadata = operator("and", "and", 3, Left, false);
static EQ: TokenMetadata = operator("==", "==", 4, Left, false);
static NE: TokenMetadata = operator("!=", "!=", 4, Left, false);
static GT: TokenMetadata = operator(">", ">", 4, Left, false);
static LT: TokenMetadata = operator("<", "<", 4, Left, false);
static GE: TokenMetadata = operator(">=", ">=", 4, Left, false);
static LE: TokenMetadata = operator("<=", "<=", 4, Left, false);
static ADD: TokenMetadata = operator("+", "add", 5, Left, false);
// Unary minus is handled at the primary level, so '-' may start an expression.
static SUBTRACT: TokenMetadata = operator("-", "subtract", 5, Left, true);
static MULTIPLY: TokenMetadata = operator("*", "multiply", 6, Left, false);
static DIVIDE: TokenMetadata = operator("/", "divide", 6, Left, false);
static MODULO: TokenMetadata = operator("%", "modulo", 6, Left, false);
static EXPONENT: TokenMetadata = operator("**", "power", 7, Right, false);

static LPAREN: TokenMetadata = punct("(", true);
static RPAREN: TokenMetadata = punct(")", false);
static LBRACKET: TokenMetadata = punct("[", true);
static RBRACKET: TokenMetadata = punct("]", false);
static LBRACE: TokenMetadata = punct("{", true);
static RBRACE: TokenMetadata = punct("}", false);
static COMMA: TokenMetadata = punct(",", false);
static DOT: TokenMetadata = punct(".", false);
static COLON: TokenMetadata = punct(":", false);
static ARROW: TokenMetadata = punct("=>", false);
static DOT_DOT: TokenMetadata = punct("..", false);
static DOT_DOT_DOT: TokenMetadata = punct("...", false);
static COMMENT: TokenMetadata = plain(Category::Comment, None, false);
static EOF: TokenMetadata = plain(Category::Eof, Some("end of input"), false);

/// Look up the metadata record for a token kind.
pub fn metadata(kind: TokenKind) -> &'static TokenMetadata {
    match kind {
        TokenKind::Integer => &INTEGER,
        TokenKind::Float => &FLOAT,
        TokenKind::String => &STRING,
        TokenKind::Boolean => &BOOLEAN,
        TokenKind::Symbol => &SYMBOL,
        TokenKind::Identifier => &IDENTIFIER,
        TokenKind::Constant => &CONSTANT,
        TokenKind::Label => &LABEL,
        TokenKind::Schema => &SCHEMA,
        TokenKind::Input => &INPUT,
        TokenKind::Value => &VALUE,
        TokenKind::Trait => &TRAIT,
        TokenKind::Let => &LET,
        TokenKind::Do => &DO,
        TokenKind::End => &END,
        TokenKind::On => &ON,
        TokenKind::Base => &BASE,
        TokenKind::Import => &IMPORT,
        TokenKind::Fn => &FN,
        TokenKind::IntegerType => &INTEGER_TYPE,
        TokenKind::FloatType => &FLOAT_TYPE,
        TokenKind::DecimalType => &DECIMAL_TYPE,
        TokenKind::StringType => &STRING_TYPE,
        TokenKind::BooleanType => &BOOLEAN_TYPE,
        TokenKind::SymbolType => &SYMBOL_TYPE,
        TokenKind::AnyType => &ANY_TYPE,
        TokenKind::ArrayType => &ARRAY_TYPE,
        TokenKind::HashType => &HASH_TYPE,
        TokenKind::ElementType => &ELEMENT_TYPE,
        TokenKind::IndexType => &INDEX_TYPE,
        TokenKind::Add => &ADD,
        TokenKind::Subtract => &SUBTRACT,
        TokenKind::Multiply => &MULTIPLY,
        TokenKind::Divide => &DIVIDE,
        TokenKind::Modulo => &MODULO,
        TokenKind::Exponent => &EXPONENT,
        TokenKind::Eq => &EQ,
        TokenKind::Ne => &NE,
        TokenKind::Gt => &GT,
        TokenKind::Lt => &LT,
        TokenKind::Ge => &GE,
        TokenKind::Le => &LE,
        TokenKind::And => &AND,
        TokenKind::Or => &OR,
        TokenKind::LParen => &LPAREN,
        TokenKind::RParen => &RPAREN,
        TokenKind::LBracket => &LBRACKET,
        TokenKind::RBracket => &RBRACKET,
        TokenKind::LBrace => &LBRACE,
        TokenKind::RBrace => &RBRACE,
        TokenKind::Comma => &COMMA,
        TokenKind::Dot => &DOT,
        TokenKind::Colon => &COLON,
        TokenKind::Arrow => &ARROW,
        TokenKind::DotDot => &DOT_DOT,
        TokenKind::DotDotDot => &DOT_DOT_DOT,
        TokenKind::Comment => &COMMENT,
        TokenKind::Eof => &EOF,
    }
}

// ──────────────────────────────────────────────
// Tokens
// ──────────────────────────────────────────────

/// Block context a token was lexed in. Only annotates identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LexContext {
    Schema,
    Input,
    Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Source spelling, with quotes, sigils and label colons removed and
    /// string escapes resolved.
    pub raw: String,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<LexContext>,
}

impl Token {
    pub fn new(kind: TokenKind, raw: impl Into<String>, location: Location) -> Self {
        Token {
            kind,
            raw: raw.into(),
            location,
            context: None,
        }
    }

    pub fn metadata(&self) -> &'static TokenMetadata {
        self.kind.metadata()
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// True for tokens spelled as a bare word: identifiers, keywords and
    /// capitalized names without a `::` path.
    pub fn is_word(&self) -> bool {
        let wordlike = matches!(
            self.metadata().category,
            Category::Keyword | Category::TypeKeyword
        ) || matches!(
            self.kind,
            TokenKind::Identifier | TokenKind::Boolean | TokenKind::And | TokenKind::Or
        ) || (self.kind == TokenKind::Constant && !self.raw.contains("::"));
        wordlike && self.raw.starts_with(|c: char| c.is_alphabetic() || c == '_')
    }

    /// How the token reads inside an error message: `"in"`, `end of input`.
    /// Control characters are escaped so the description stays on one line.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_owned(),
            TokenKind::Symbol => format!("\":{}\"", self.raw.escape_debug()),
            TokenKind::Label => format!("\"{}:\"", self.raw.escape_debug()),
            TokenKind::String => format!("string {:?}", self.raw),
            _ => format!("{:?}", self.raw),
        }
    }
}
