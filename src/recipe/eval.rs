//! Expression evaluation: a symbol dictionary binding DOFs, parameters and
//! scoped variables to `Real` slots, plus a fixed set of custom functions
//! (spec.md §4.6, §9).

use std::collections::HashMap;

use anyhow::{anyhow, Result};

use super::ast::{BinOp, Expr};

pub type CustomFn = fn(&[f64]) -> f64;

/// Binds names to `Real` values for one evaluation pass. Scoped variables
/// shadow outer ones of the same name (`var` declarations inside a
/// `rotate`/`translate`/`on` block are visible only within it).
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    scopes: Vec<HashMap<String, f64>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { scopes: vec![HashMap::new()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.scopes.last_mut().expect("symbol table always has a root scope").insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }
}

fn builtin(name: &str) -> Option<CustomFn> {
    fn min2(args: &[f64]) -> f64 {
        args[0].min(args[1])
    }
    fn max2(args: &[f64]) -> f64 {
        args[0].max(args[1])
    }
    fn lerp(args: &[f64]) -> f64 {
        args[0] + (args[1] - args[0]) * args[2]
    }
    match name {
        "sin" => Some(|a| a[0].sin()),
        "cos" => Some(|a| a[0].cos()),
        "tan" => Some(|a| a[0].tan()),
        "asin" => Some(|a| a[0].asin()),
        "acos" => Some(|a| a[0].acos()),
        "atan" => Some(|a| a[0].atan()),
        "atan2" => Some(|a| a[0].atan2(a[1])),
        "sqrt" => Some(|a| a[0].sqrt()),
        "abs" => Some(|a| a[0].abs()),
        "min" => Some(min2),
        "max" => Some(max2),
        "lerp" => Some(lerp),
        _ => None,
    }
}

/// Evaluates `expr` against `symbols`, resolving named calls first against
/// `custom_functions` and falling back to the built-in trigonometry/
/// interpolation set.
pub fn eval(expr: &Expr, symbols: &SymbolTable, custom_functions: &HashMap<String, CustomFn>) -> Result<f64> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Ident(name) => symbols.get(name).ok_or_else(|| anyhow!("undefined symbol '{name}'")),
        Expr::Neg(inner) => Ok(-eval(inner, symbols, custom_functions)?),
        Expr::Binary(op, lhs, rhs) => {
            let a = eval(lhs, symbols, custom_functions)?;
            let b = eval(rhs, symbols, custom_functions)?;
            Ok(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                BinOp::Pow => a.powf(b),
            })
        }
        Expr::Call(name, arg_exprs) => {
            let args: Result<Vec<f64>> = arg_exprs.iter().map(|e| eval(e, symbols, custom_functions)).collect();
            let args = args?;
            if let Some(f) = custom_functions.get(name) {
                Ok(f(&args))
            } else if let Some(f) = builtin(name) {
                Ok(f(&args))
            } else {
                Err(anyhow!("undefined function '{name}'"))
            }
        }
    }
}

/// Names `expr` references as free identifiers, used to topologically sort
/// `var`/`parameter` declarations before evaluating them.
pub fn free_idents(expr: &Expr, out: &mut Vec<String>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Ident(name) => out.push(name.clone()),
        Expr::Neg(inner) => free_idents(inner, out),
        Expr::Binary(_, lhs, rhs) => {
            free_idents(lhs, out);
            free_idents(rhs, out);
        }
        Expr::Call(_, args) => {
            for a in args {
                free_idents(a, out);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_evaluates_arithmetic_with_precedence() {
        let symbols = SymbolTable::new();
        let expr = Expr::Binary(
            BinOp::Add,
            Box::new(Expr::Number(1.0)),
            Box::new(Expr::Binary(BinOp::Mul, Box::new(Expr::Number(2.0)), Box::new(Expr::Number(3.0)))),
        );
        assert_eq!(eval(&expr, &symbols, &HashMap::new()).unwrap(), 7.0);
    }

    #[test]
    fn test_resolves_ident_from_symbol_table() {
        let mut symbols = SymbolTable::new();
        symbols.set("x", 0.37);
        let result = eval(&Expr::Ident("x".into()), &symbols, &HashMap::new()).unwrap();
        assert_eq!(result, 0.37);
    }

    #[test]
    fn test_builtin_trig_function() {
        let symbols = SymbolTable::new();
        let expr = Expr::Call("cos".into(), vec![Expr::Number(0.0)]);
        assert_eq!(eval(&expr, &symbols, &HashMap::new()).unwrap(), 1.0);
    }

    #[test]
    fn test_undefined_symbol_errors() {
        let symbols = SymbolTable::new();
        assert!(eval(&Expr::Ident("nope".into()), &symbols, &HashMap::new()).is_err());
    }
}
