//! The textual recipe language (spec.md §6): lexer, parser, AST and
//! expression evaluator. [`model`](crate::model) consumes the parsed
//! [`Recipe`] to build a frame tree and element set.

pub mod ast;
pub mod error;
pub mod eval;
mod lexer;
mod parser;

pub use ast::{Arg, CustomElement, DofDecl, ElementDecl, Expr, OnPort, ParamDecl, PathDecl, Recipe, Statement, Transform, VarDecl};
pub use error::ParseError;
pub use parser::parse;

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_recipe_round_trips_through_json() {
        let source = "dof x(-1, 1) = 0;\ntranslate(dx = x, dy = 0, dz = 0) { BlockElement child; }\npath main first child;\n";
        let recipe = parse("<snapshot>", source).unwrap();

        let json = serde_json::to_string(&recipe).unwrap();
        let restored: Recipe = serde_json::from_str(&json).unwrap();

        assert_eq!(recipe, restored);
    }
}
