pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

/// Rounds up to the next cent so a rounded price never undercuts `value`.
pub fn ceil_cents(value: f64) -> f64 {
    let cents = value * 100.0;
    // Guard against 1234.5 * 100 landing on 123450.00000000001.
    let nearest = cents.round();
    if (cents - nearest).abs() < 1e-6 {
        nearest / 100.0
    } else {
        cents.ceil() / 100.0
    }
}

pub fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        return None;
    }
    Some(xs.iter().sum::<f64>() / xs.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding() {
        assert_eq!(round2(21.6049), 21.6);
        assert_eq!(round_to(76.36, 1), 76.4);
        assert_eq!(ceil_cents(19_383.1201), 19_383.13);
        assert_eq!(ceil_cents(100.5), 100.5);
    }

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[8.0, 12.0, 10.0]), Some(10.0));
    }
}
