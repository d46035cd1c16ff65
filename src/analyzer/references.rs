use crate::ast::Expression;
use crate::dependency::Dependency;

use super::expression::{parse_expression_source, SyntaxError};

/// Every `<component>.<property>` an expression reads, in order of first appearance.
pub fn collect_references(expression: &Expression) -> Vec<Dependency> {
    let mut out = Vec::new();
    visit(expression, &mut |expr| {
        if let Expression::Reference(dependency) = expr {
            if !out.contains(dependency) {
                out.push(dependency.clone());
            }
        }
    });
    out
}

/// Every function call in an expression as `(name, argument count)`.
pub fn collect_calls(expression: &Expression) -> Vec<(String, usize)> {
    let mut out = Vec::new();
    visit(expression, &mut |expr| {
        if let Expression::FunctionCall {
            function,
            arguments,
        } = expr
        {
            out.push((function.clone(), arguments.len()));
        }
    });
    out
}

/// Parse `source` and return the dependencies it reads.
pub fn extract_dependencies(source: &str) -> Result<Vec<Dependency>, SyntaxError> {
    parse_expression_source(source).map(|expr| collect_references(&expr))
}

fn visit<F: FnMut(&Expression)>(expression: &Expression, f: &mut F) {
    f(expression);
    match expression {
        Expression::Literal(_) | Expression::Reference(_) => {}
        Expression::List(items) => items.iter().for_each(|item| visit(item, f)),
        Expression::Map(entries) => entries.iter().for_each(|(_, value)| visit(value, f)),
        Expression::UnaryOp { operand, .. } => visit(operand, f),
        Expression::BinaryOp { left, right, .. } => {
            visit(left, f);
            visit(right, f);
        }
        Expression::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            visit(condition, f);
            visit(then_branch, f);
            visit(else_branch, f);
        }
        Expression::FunctionCall { arguments, .. } => {
            arguments.iter().for_each(|arg| visit(arg, f))
        }
    }
}
