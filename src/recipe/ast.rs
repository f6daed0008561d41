//! The recipe abstract syntax tree (spec.md §6's EBNF, §3's `RecipeContext`/
//! `RecipeElementStep`/`RecipeOpticalPath` data model).
//!
//! Every node derives `Serialize`/`Deserialize` so a parsed [`Recipe`] can be
//! round-tripped through `serde_json`, the same way the teacher snapshots its
//! own lens prescriptions for regression tests.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Number(f64),
    Ident(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

/// A single `(name = expr)` or positional argument in an `arglist`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub name: Option<String>,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DofDecl {
    pub name: String,
    pub min: Option<Expr>,
    pub max: Option<Expr>,
    pub default: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDecl {
    pub name: String,
    pub min: Option<Expr>,
    pub max: Option<Expr>,
    pub default: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: String,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDecl {
    pub factory: String,
    pub name: String,
    pub args: Vec<Arg>,
}

/// `path name first (to next)+;` — an ordered sequence of element names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDecl {
    pub name: String,
    pub elements: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnPort {
    pub port: String,
    pub of: String,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub args: Vec<Arg>,
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomElement {
    pub name: String,
    pub body: Vec<Statement>,
    pub ports: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Dof(DofDecl),
    Param(ParamDecl),
    Var(VarDecl),
    Rotate(Transform),
    Translate(Transform),
    OnPort(OnPort),
    Element(ElementDecl),
    Path(PathDecl),
    Import(String),
    Script(String),
    CustomElement(CustomElement),
}

/// The parsed recipe: every statement in file order, at the root context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub statements: Vec<Statement>,
}
