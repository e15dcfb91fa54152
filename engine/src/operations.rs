//! Stack operations.
//!
//! Every operation reads the stack (bottom first) and returns a fresh one.
//! Binary operations take the second-from-top entry as the left operand `a`
//! and the top as the right operand `b`; deeper entries are carried over in
//! their original order.

use crate::error::{OperationError, OperationResult};

pub fn add(stack: &[f64]) -> OperationResult {
    binary(stack, "addition", |a, b| Ok(a + b))
}

pub fn subtract(stack: &[f64]) -> OperationResult {
    binary(stack, "subtraction", |a, b| Ok(a - b))
}

pub fn multiply(stack: &[f64]) -> OperationResult {
    binary(stack, "multiplication", |a, b| Ok(a * b))
}

pub fn divide(stack: &[f64]) -> OperationResult {
    binary(stack, "division", |a, b| {
        if b == 0.0 {
            return Err(OperationError::DivisionByZero);
        }
        Ok(a / b)
    })
}

/// Float remainder; the sign follows the dividend.
pub fn modulo(stack: &[f64]) -> OperationResult {
    binary(stack, "modulo", |a, b| {
        if b == 0.0 {
            return Err(OperationError::ModuloByZero);
        }
        Ok(a % b)
    })
}

pub fn swap(stack: &[f64]) -> OperationResult {
    let len = stack.len();
    if len < 2 {
        return Err(OperationError::insufficient("swap"));
    }
    let mut next = stack.to_vec();
    next.swap(len - 1, len - 2);
    Ok(next)
}

pub fn reciprocal(stack: &[f64]) -> OperationResult {
    unary(stack, "reciprocal", |a| {
        if a == 0.0 {
            return Err(OperationError::ReciprocalOfZero);
        }
        Ok(1.0 / a)
    })
}

pub fn sqrt(stack: &[f64]) -> OperationResult {
    unary(stack, "square root", |a| {
        if a < 0.0 {
            return Err(OperationError::NegativeSquareRoot);
        }
        Ok(a.sqrt())
    })
}

// Radians.
pub fn sin(stack: &[f64]) -> OperationResult {
    unary(stack, "sine", |a| Ok(a.sin()))
}

pub fn cos(stack: &[f64]) -> OperationResult {
    unary(stack, "cosine", |a| Ok(a.cos()))
}

pub fn tan(stack: &[f64]) -> OperationResult {
    unary(stack, "tangent", |a| Ok(a.tan()))
}

// ---------------------------------------------------------------------------
// Arity helpers
// ---------------------------------------------------------------------------

/// Pop `b` then `a`, push `f(a, b)`.
pub fn binary(
    stack: &[f64],
    name: &str,
    f: impl FnOnce(f64, f64) -> Result<f64, OperationError>,
) -> OperationResult {
    let [rest @ .., a, b] = stack else {
        return Err(OperationError::insufficient(name));
    };
    let value = f(*a, *b)?;
    let mut next = rest.to_vec();
    next.push(value);
    Ok(next)
}

/// Pop `a`, push `f(a)`.
pub fn unary(
    stack: &[f64],
    name: &str,
    f: impl FnOnce(f64) -> Result<f64, OperationError>,
) -> OperationResult {
    let [rest @ .., a] = stack else {
        return Err(OperationError::insufficient(name));
    };
    let value = f(*a)?;
    let mut next = rest.to_vec();
    next.push(value);
    Ok(next)
}
