//! Syntax tree produced by the parser.
//!
//! This is the contract handed to the analyzer: declarations carry the
//! location of their opening keyword, expressions carry none. Trees are
//! built append-only, so every node owns its children.

use serde::Serialize;

use crate::token::Location;

// ──────────────────────────────────────────────
// Root
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Root {
    pub inputs: Vec<InputDeclaration>,
    pub values: Vec<ValueDeclaration>,
    pub traits: Vec<TraitDeclaration>,
    pub imports: Vec<ImportDeclaration>,
}

impl Root {
    pub fn value(&self, name: &str) -> Option<&ValueDeclaration> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn trait_decl(&self, name: &str) -> Option<&TraitDeclaration> {
        self.traits.iter().find(|t| t.name == name)
    }

    pub fn input(&self, name: &str) -> Option<&InputDeclaration> {
        self.inputs.iter().find(|i| i.name == name)
    }
}

// ──────────────────────────────────────────────
// Inputs
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Integer,
    Float,
    Decimal,
    String,
    Boolean,
    Symbol,
    Any,
}

impl PrimitiveType {
    pub fn from_name(name: &str) -> Option<Self> {
        let t = match name {
            "integer" => PrimitiveType::Integer,
            "float" => PrimitiveType::Float,
            "decimal" => PrimitiveType::Decimal,
            "string" => PrimitiveType::String,
            "boolean" => PrimitiveType::Boolean,
            "symbol" => PrimitiveType::Symbol,
            "any" => PrimitiveType::Any,
            _ => return None,
        };
        Some(t)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "of")]
pub enum InputType {
    Primitive(PrimitiveType),
    Array,
    Hash,
    /// Declared with `element :type, :name` inside an array.
    Element(Box<InputType>),
    /// Declared with `index :name` inside an array.
    Index,
}

impl InputType {
    /// True when declarations of this type may open a `do` block.
    pub fn is_container(&self) -> bool {
        match self {
            InputType::Array | InputType::Hash => true,
            InputType::Element(inner) => inner.is_container(),
            InputType::Primitive(_) | InputType::Index => false,
        }
    }

    pub fn is_array(&self) -> bool {
        match self {
            InputType::Array => true,
            InputType::Element(inner) => inner.is_array(),
            _ => false,
        }
    }
}

/// How an array's items are addressed downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Field,
    Element,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Domain {
    /// `min..max` (inclusive) or `min...max` (exclusive upper bound).
    Range {
        min: Number,
        max: Number,
        exclusive: bool,
    },
    /// `[a, b, c]`
    Values { values: Vec<Literal> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputDeclaration {
    pub name: String,
    #[serde(rename = "type")]
    pub type_: InputType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<InputDeclaration>,
    /// Set only for array types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_mode: Option<AccessMode>,
    /// Name given by an `index: :name` header option.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    pub loc: Location,
}

impl InputDeclaration {
    pub fn child(&self, name: &str) -> Option<&InputDeclaration> {
        self.children.iter().find(|c| c.name == name)
    }
}

// ──────────────────────────────────────────────
// Expressions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseExpression {
    pub condition: Expression,
    pub result: Expression,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "node")]
pub enum Expression {
    Literal {
        value: Literal,
    },
    /// `input.name`
    InputReference {
        name: String,
    },
    /// `input.a.b.c`, always two or more segments.
    InputElementReference {
        path: Vec<String>,
    },
    /// Bare name of an earlier value or trait.
    DeclarationReference {
        name: String,
    },
    Call {
        function: String,
        args: Vec<Expression>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        opts: Vec<(String, Expression)>,
    },
    Array {
        elements: Vec<Expression>,
    },
    Hash {
        pairs: Vec<(Expression, Expression)>,
    },
    Cascade {
        cases: Vec<CaseExpression>,
    },
    /// `index(:name)`
    IndexReference {
        name: String,
    },
    /// Call of an imported function; arguments are keyword-only.
    ImportCall {
        name: String,
        args: Vec<(String, Expression)>,
    },
}

impl Expression {
    pub fn literal(value: Literal) -> Self {
        Expression::Literal { value }
    }

    pub fn int(n: i64) -> Self {
        Expression::literal(Literal::Integer(n))
    }

    pub fn float(f: f64) -> Self {
        Expression::literal(Literal::Float(f))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expression::literal(Literal::String(s.into()))
    }

    pub fn boolean(b: bool) -> Self {
        Expression::literal(Literal::Boolean(b))
    }

    pub fn symbol(s: impl Into<String>) -> Self {
        Expression::literal(Literal::Symbol(s.into()))
    }

    pub fn input(name: impl Into<String>) -> Self {
        Expression::InputReference { name: name.into() }
    }

    pub fn decl(name: impl Into<String>) -> Self {
        Expression::DeclarationReference { name: name.into() }
    }

    pub fn call(function: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::Call {
            function: function.into(),
            args,
            opts: Vec::new(),
        }
    }
}

// ──────────────────────────────────────────────
// Declarations
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueDeclaration {
    pub name: String,
    pub expression: Expression,
    /// Declared with `let`: the analyzer may inline it.
    pub inline: bool,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraitDeclaration {
    pub name: String,
    pub expression: Expression,
    pub loc: Location,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportDeclaration {
    pub names: Vec<String>,
    /// Dotted constant path, e.g. `Shared::Tax`.
    pub module: String,
    pub loc: Location,
}
