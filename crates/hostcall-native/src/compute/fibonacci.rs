//! Arbitrary-precision Fibonacci numbers.

use hostcall_common::{HostcallError, Result, StructuredValue};
use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Computes F(n) with F(0) = 0 and F(1) = 1, returned in base 10.
///
/// Runs in O(n) big-integer additions.
///
/// # Errors
///
/// Returns [`HostcallError::NegativeArgument`] when `n < 0`.
pub fn fibonacci(n: i64) -> Result<String> {
    if n < 0 {
        return Err(HostcallError::NegativeArgument);
    }

    let mut current = BigUint::zero();
    let mut next = BigUint::one();
    for _ in 0..n {
        let sum = &current + &next;
        current = std::mem::replace(&mut next, sum);
    }

    Ok(current.to_str_radix(10))
}

/// Boundary handler: accepts an integer, or a number holding a whole value.
pub fn handle(args: StructuredValue) -> Result<StructuredValue> {
    let n = args.as_integer().ok_or_else(|| {
        HostcallError::InvalidShape(format!("argument must be an integer, got {}", args.type_name()))
    })?;
    tracing::debug!(n, "computing fibonacci");
    fibonacci(n).map(StructuredValue::String)
}
