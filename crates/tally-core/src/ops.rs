//! Element-wise kernels shared by the array and image payload kinds

use crate::error::{Error, Result};
use num_traits::{Float, Zero};

/// Number of elements spanned by `dims`, failing on `usize` overflow
pub fn element_count(dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| Error::InvalidInput(format!("element count of {dims:?} overflows")))
}

/// `lhs[i] += rhs[i]`
pub fn add_assign<T: Float>(lhs: &mut [T], rhs: &[T]) {
    for (a, &b) in lhs.iter_mut().zip(rhs) {
        *a = *a + b;
    }
}

/// `lhs[i] /= rhs[i]` with IEEE semantics
pub fn div_assign<T: Float>(lhs: &mut [T], rhs: &[T]) {
    for (a, &b) in lhs.iter_mut().zip(rhs) {
        *a = *a / b;
    }
}

/// `lhs[i] /= rhs[i]`, writing `replacement` wherever `rhs[i]` is zero
pub fn div_assign_filtered<T: Float>(lhs: &mut [T], rhs: &[T], replacement: T) {
    for (a, &b) in lhs.iter_mut().zip(rhs) {
        *a = if b.is_zero() { replacement } else { *a / b };
    }
}

/// Format a value the way `numpy.savetxt` does with its default `%.18e`
pub fn format_scientific(value: f64) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "nan".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    let formatted = format!("{value:.18e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_add_and_divide() {
        let mut a = vec![1.0, 2.0, 3.0];
        add_assign(&mut a, &[1.0, 1.0, 1.0]);
        assert_eq!(a, vec![2.0, 3.0, 4.0]);

        div_assign(&mut a, &[2.0, 3.0, 8.0]);
        assert_relative_eq!(a[0], 1.0);
        assert_relative_eq!(a[1], 1.0);
        assert_relative_eq!(a[2], 0.5);
    }

    #[test]
    fn test_filtered_division() {
        let mut a = vec![4.0f64, 5.0, 6.0];
        div_assign_filtered(&mut a, &[2.0, 0.0, 3.0], 0.0);
        assert_eq!(a, vec![2.0, 0.0, 2.0]);

        let mut b = vec![1.0f64];
        div_assign(&mut b, &[0.0]);
        assert!(b[0].is_infinite());
    }

    #[test]
    fn test_element_count() {
        assert_eq!(element_count(&[2, 3, 4]).unwrap(), 24);
        assert_eq!(element_count(&[]).unwrap(), 1);
        assert_eq!(element_count(&[usize::MAX, 0]).unwrap(), 0);
        assert!(matches!(
            element_count(&[usize::MAX, 2]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_format_scientific() {
        assert_eq!(format_scientific(1.0), "1.000000000000000000e+00");
        assert_eq!(format_scientific(0.0), "0.000000000000000000e+00");
        assert_eq!(format_scientific(-2.5e-7), "-2.499999999999999887e-07");
        assert_eq!(format_scientific(1.5e123), "1.500000000000000040e+123");
        assert_eq!(format_scientific(f64::NAN), "nan");
        assert_eq!(format_scientific(f64::NEG_INFINITY), "-inf");
    }
}
