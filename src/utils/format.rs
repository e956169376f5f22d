// src/utils/format.rs

/// Rounds half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Renders a mark or percentage with at most two decimals and no trailing zeros.
///
/// `8.0` → `"8"`, `8.5` → `"8.5"`, `83.333` → `"83.33"`.
pub fn format_marks(value: f64) -> String {
    let fixed = format!("{:.2}", round2(value));
    if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        fixed
    }
}

/// `part / whole` as a percentage rounded to 2 decimals; 0 when `whole` is not positive.
pub fn percentage(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round2(part / whole * 100.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(83.3333), 83.33);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(2.0), 2.0);
    }

    #[test]
    fn test_format_marks_trims_zeros() {
        assert_eq!(format_marks(8.0), "8");
        assert_eq!(format_marks(8.5), "8.5");
        assert_eq!(format_marks(83.3333), "83.33");
        assert_eq!(format_marks(100.0), "100");
        assert_eq!(format_marks(0.0), "0");
    }

    #[test]
    fn test_percentage_of_zero_total() {
        assert_eq!(percentage(5.0, 0.0), 0.0);
        assert_eq!(percentage(2.0, 3.0), 66.67);
    }
}
