//! Text encoding of vectors for the `vector` column type.
//!
//! Queries always bind the encoded literal as a parameter (`$n::vector`);
//! vectors are never spliced into SQL text.

use std::fmt::Write;

use crate::errors::RagchatError;
use crate::errors::Result;

/// Fractional digits written per component
pub const LITERAL_PRECISION: usize = 8;

/// Encode as `[v1,v2,...]` with fixed precision. Non-finite values are rejected.
pub fn encode_vector_literal(vector: &[f32]) -> Result<String> {
    let mut literal = String::with_capacity(vector.len() * (LITERAL_PRECISION + 4) + 2);
    literal.push('[');
    for (i, value) in vector.iter().enumerate() {
        if !value.is_finite() {
            return Err(RagchatError::Validation(format!(
                "vector component {i} is not finite"
            )));
        }
        if i > 0 {
            literal.push(',');
        }
        // Writing to a String cannot fail
        let _ = write!(literal, "{value:.prec$}", prec = LITERAL_PRECISION);
    }
    literal.push(']');
    Ok(literal)
}

/// Parse a bracketed, comma-separated list of finite decimals
pub fn parse_vector_literal(literal: &str) -> Result<Vec<f32>> {
    let inner = literal
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| {
            RagchatError::Validation("vector literal must be enclosed in brackets".to_string())
        })?
        .trim();

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .enumerate()
        .map(|(i, part)| {
            let part = part.trim();
            part.parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    RagchatError::Validation(format!(
                        "invalid vector component {i}: '{part}'"
                    ))
                })
        })
        .collect()
}
