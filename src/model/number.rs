//! Number formatting with the rounding rules of the web front end.
//!
//! Rust's `{:.N}` breaks exact ties towards the even digit, while the page
//! rounds them away from zero (`toFixed`) or towards positive infinity
//! (`Math.round`). Both front ends go through these helpers so the text is
//! identical everywhere.

/// Round to the nearest integer, ties towards positive infinity.
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

/// Fixed-point text with `digits` decimals, exact ties rounded away from zero.
pub fn to_fixed(value: f64, digits: usize) -> String {
    // -0.0 prints without a sign
    let value = if value == 0.0 { 0.0 } else { value };
    match tie_numerator(value, digits) {
        Some(doubled) => {
            let scaled = doubled.div_ceil(2);
            let scale = 10u128.pow(digits as u32);
            let sign = if value < 0.0 { "-" } else { "" };
            if digits == 0 {
                format!("{}{}", sign, scaled)
            } else {
                format!(
                    "{}{}.{:0width$}",
                    sign,
                    scaled / scale,
                    scaled % scale,
                    width = digits
                )
            }
        }
        None => format!("{:.*}", digits, value),
    }
}

/// If `|value| * 10^digits` lies exactly halfway between two integers,
/// returns twice that product (an odd integer).
fn tie_numerator(value: f64, digits: usize) -> Option<u128> {
    if !value.is_finite() || value == 0.0 || digits > 20 {
        return None;
    }

    // |value| = mantissa * 2^exponent
    let bits = value.abs().to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };

    // 2 * |value| * 10^digits = mantissa * 5^digits * 2^shift
    let product = u128::from(mantissa) * 5u128.pow(digits as u32);
    let shift = exponent + 1 + digits as i32;
    if shift > 0 {
        return None;
    }
    let drop = shift.unsigned_abs();
    (product.trailing_zeros() == drop).then(|| product >> drop)
}
