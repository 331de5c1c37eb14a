//! Const-generic expression evaluation (spec §4.5 "Const generics").

use std::collections::HashMap;

use lumina_syntax::ast::{ConstBinOp, ConstExpr};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstEvalError {
    DivisionByZero,
    UnboundParam(String),
}

impl ConstEvalError {
    pub fn code(&self) -> &'static str {
        match self {
            ConstEvalError::DivisionByZero => "CONST-DIV-ZERO",
            ConstEvalError::UnboundParam(_) => "CONST-SIZE-MISMATCH",
        }
    }
}

/// Folds a const-generic expression tree over integer literals and bound
/// const parameters. Division by zero yields `CONST-DIV-ZERO` (the caller
/// reports the diagnostic and treats the size as unresolved).
pub fn eval_const(expr: &ConstExpr, bindings: &HashMap<String, i64>) -> Result<i64, ConstEvalError> {
    match expr {
        ConstExpr::Literal(n) => Ok(*n),
        ConstExpr::Param(name) => bindings.get(name).copied().ok_or_else(|| ConstEvalError::UnboundParam(name.clone())),
        ConstExpr::Binary { op, left, right } => {
            let l = eval_const(left, bindings)?;
            let r = eval_const(right, bindings)?;
            match op {
                ConstBinOp::Add => Ok(l + r),
                ConstBinOp::Sub => Ok(l - r),
                ConstBinOp::Mul => Ok(l * r),
                ConstBinOp::Div => {
                    if r == 0 {
                        Err(ConstEvalError::DivisionByZero)
                    } else {
                        Ok(l / r)
                    }
                }
            }
        }
    }
}

/// Checks an array literal's element count against its declared `[T; N]`
/// size; mismatches yield `CONST-SIZE-MISMATCH`.
pub fn check_array_size(declared: &ConstExpr, actual_len: usize, bindings: &HashMap<String, i64>) -> Result<(), String> {
    match eval_const(declared, bindings) {
        Ok(n) if n as usize == actual_len => Ok(()),
        Ok(n) => Err(format!("array literal has {} elements, declared size is {}", actual_len, n)),
        Err(ConstEvalError::DivisionByZero) => Err("const expression divides by zero".to_string()),
        Err(ConstEvalError::UnboundParam(name)) => Err(format!("unbound const parameter `{}`", name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_binary_const_expr() {
        let expr = ConstExpr::Binary {
            op: ConstBinOp::Mul,
            left: Box::new(ConstExpr::Literal(2)),
            right: Box::new(ConstExpr::Param("N".to_string())),
        };
        let mut bindings = HashMap::new();
        bindings.insert("N".to_string(), 4);
        assert_eq!(eval_const(&expr, &bindings), Ok(8));
    }

    #[test]
    fn division_by_zero_is_reported() {
        let expr = ConstExpr::Binary {
            op: ConstBinOp::Div,
            left: Box::new(ConstExpr::Literal(4)),
            right: Box::new(ConstExpr::Literal(0)),
        };
        assert_eq!(eval_const(&expr, &HashMap::new()), Err(ConstEvalError::DivisionByZero));
    }

    #[test]
    fn array_size_mismatch_is_reported() {
        let declared = ConstExpr::Literal(3);
        let err = check_array_size(&declared, 4, &HashMap::new()).unwrap_err();
        assert!(err.contains("4"));
        assert!(err.contains('3'));
    }
}
