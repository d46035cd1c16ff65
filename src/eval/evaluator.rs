use std::collections::BTreeMap;

use super::{context::EvalContext, functions, EvalError, EvalResult};
use crate::ast::{BinaryOperator, Expression, Literal, UnaryOperator};
use crate::value::Value;

/// Tree-walking interpreter. Stateless; all inputs come from the [`EvalContext`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Evaluator;

impl Evaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn eval_expression(&self, expression: &Expression, context: &EvalContext) -> EvalResult<Value> {
        self.eval(expression, context, 0)
    }

    fn eval(&self, expression: &Expression, context: &EvalContext, depth: usize) -> EvalResult<Value> {
        if depth > context.max_depth() {
            return Err(EvalError::DepthExceeded(context.max_depth()));
        }
        let depth = depth + 1;

        match expression {
            Expression::Literal(literal) => Ok(Self::eval_literal(literal)),
            Expression::Reference(dependency) => Ok(context.get(dependency)),
            Expression::List(items) => items
                .iter()
                .map(|item| self.eval(item, context, depth))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::List),
            Expression::Map(entries) => {
                let mut map = BTreeMap::new();
                for (key, value) in entries {
                    map.insert(key.clone(), self.eval(value, context, depth)?);
                }
                Ok(Value::Map(map))
            }
            Expression::UnaryOp { op, operand } => {
                let value = self.eval(operand, context, depth)?;
                Self::eval_unary(*op, &value)
            }
            Expression::BinaryOp { op, left, right } => {
                self.eval_binary_op(*op, left, right, context, depth)
            }
            Expression::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition, context, depth)?.is_truthy() {
                    self.eval(then_branch, context, depth)
                } else {
                    self.eval(else_branch, context, depth)
                }
            }
            Expression::FunctionCall {
                function,
                arguments,
            } => {
                let builtin = functions::resolve(function, arguments.len())?;
                let args = arguments
                    .iter()
                    .map(|arg| self.eval(arg, context, depth))
                    .collect::<EvalResult<Vec<_>>>()?;
                (builtin.func)(&args)
            }
        }
    }

    fn eval_literal(literal: &Literal) -> Value {
        match literal {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Integer(i) => Value::Integer(*i),
            Literal::Float(f) => Value::Float(*f),
            Literal::String(s) => Value::String(s.clone()),
        }
    }

    fn eval_unary(op: UnaryOperator, value: &Value) -> EvalResult<Value> {
        match (op, value) {
            (UnaryOperator::Not, v) => Ok(Value::Boolean(!v.is_truthy())),
            (UnaryOperator::Negate, Value::Null) => Ok(Value::Null),
            (UnaryOperator::Negate, Value::Integer(i)) => {
                i.checked_neg().map(Value::Integer).ok_or(EvalError::Overflow)
            }
            (UnaryOperator::Negate, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnaryOperator::Negate, other) => Err(EvalError::InvalidOperand {
                operator: op.to_string(),
                found: other.type_name(),
            }),
        }
    }

    fn eval_binary_op(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
        context: &EvalContext,
        depth: usize,
    ) -> EvalResult<Value> {
        // logical operators short-circuit
        match op {
            BinaryOperator::And => {
                let left_val = self.eval(left, context, depth)?;
                if !left_val.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                let right_val = self.eval(right, context, depth)?;
                return Ok(Value::Boolean(right_val.is_truthy()));
            }
            BinaryOperator::Or => {
                let left_val = self.eval(left, context, depth)?;
                if left_val.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                let right_val = self.eval(right, context, depth)?;
                return Ok(Value::Boolean(right_val.is_truthy()));
            }
            _ => {}
        }

        let left_val = self.eval(left, context, depth)?;
        let right_val = self.eval(right, context, depth)?;

        match op {
            BinaryOperator::Equal => Ok(Value::Boolean(functions::loose_eq(&left_val, &right_val))),
            BinaryOperator::NotEqual => {
                Ok(Value::Boolean(!functions::loose_eq(&left_val, &right_val)))
            }
            BinaryOperator::LessThan
            | BinaryOperator::LessThanEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanEqual => Self::eval_comparison(op, &left_val, &right_val),
            _ => Self::eval_arithmetic(op, &left_val, &right_val),
        }
    }

    /// Ordering against `null` (an unanswered question) is false rather than an error.
    fn eval_comparison(op: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
        let ordering = match (left, right) {
            (Value::Null, _) | (_, Value::Null) => return Ok(Value::Boolean(false)),
            (Value::String(l), Value::String(r)) => l.partial_cmp(r),
            (Value::Integer(l), Value::Integer(r)) => l.partial_cmp(r),
            (l, r) => match (l.as_f64(), r.as_f64()) {
                (Ok(l), Ok(r)) => l.partial_cmp(&r),
                _ => return Err(Self::invalid_operands(op, left, right)),
            },
        };
        let Some(ordering) = ordering else {
            return Ok(Value::Boolean(false));
        };
        let result = match op {
            BinaryOperator::LessThan => ordering.is_lt(),
            BinaryOperator::LessThanEqual => ordering.is_le(),
            BinaryOperator::GreaterThan => ordering.is_gt(),
            _ => ordering.is_ge(),
        };
        Ok(Value::Boolean(result))
    }

    /// Arithmetic over `null` yields `null`; `+` concatenates when either side is a string.
    fn eval_arithmetic(op: BinaryOperator, left: &Value, right: &Value) -> EvalResult<Value> {
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }

        if op == BinaryOperator::Add {
            match (left, right) {
                (Value::String(l), r) => return Ok(Value::String(format!("{}{}", l, r))),
                (l, Value::String(r)) => return Ok(Value::String(format!("{}{}", l, r))),
                (Value::List(l), Value::List(r)) => {
                    return Ok(Value::List(l.iter().chain(r.iter()).cloned().collect()))
                }
                _ => {}
            }
        }

        match (left, right) {
            (Value::Integer(l), Value::Integer(r)) => Self::integer_arithmetic(op, *l, *r),
            (l, r) => match (l.as_f64(), r.as_f64()) {
                (Ok(l), Ok(r)) => Self::float_arithmetic(op, l, r),
                _ => Err(Self::invalid_operands(op, left, right)),
            },
        }
    }

    fn integer_arithmetic(op: BinaryOperator, l: i64, r: i64) -> EvalResult<Value> {
        let result = match op {
            BinaryOperator::Add => l.checked_add(r),
            BinaryOperator::Subtract => l.checked_sub(r),
            BinaryOperator::Multiply => l.checked_mul(r),
            BinaryOperator::Divide => {
                if r == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                return Ok(Value::Float(l as f64 / r as f64));
            }
            BinaryOperator::Modulo => {
                if r == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                l.checked_rem(r)
            }
            _ => None,
        };
        result.map(Value::Integer).ok_or(EvalError::Overflow)
    }

    fn float_arithmetic(op: BinaryOperator, l: f64, r: f64) -> EvalResult<Value> {
        let result = match op {
            BinaryOperator::Add => l + r,
            BinaryOperator::Subtract => l - r,
            BinaryOperator::Multiply => l * r,
            BinaryOperator::Divide | BinaryOperator::Modulo if r == 0.0 => {
                return Err(EvalError::DivisionByZero)
            }
            BinaryOperator::Divide => l / r,
            BinaryOperator::Modulo => l % r,
            _ => return Err(EvalError::InvalidOperands {
                operator: op.to_string(),
                left: "float",
                right: "float",
            }),
        };
        Ok(Value::Float(result))
    }

    fn invalid_operands(op: BinaryOperator, left: &Value, right: &Value) -> EvalError {
        EvalError::InvalidOperands {
            operator: op.to_string(),
            left: left.type_name(),
            right: right.type_name(),
        }
    }
}
