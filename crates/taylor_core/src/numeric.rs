//! Small combinatorial helpers for the Taylor and Leibniz expansions.
//!
//! Orders never exceed five here, so direct products are exact in `u64`.

pub fn factorial(n: u32) -> u64 {
    (1..=u64::from(n)).product()
}

/// Binomial coefficient `C(n, k)`; zero when `k > n`.
pub fn binomial(n: u32, k: u32) -> u64 {
    if k > n {
        return 0;
    }
    // Multiplicative form keeps every partial quotient integral.
    let k = k.min(n - k);
    let mut acc = 1u64;
    for i in 0..u64::from(k) {
        acc = acc * (u64::from(n) - i) / (i + 1);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factorial_of_small_orders() {
        let expected = [1, 1, 2, 6, 24, 120, 720];
        for (n, value) in expected.iter().enumerate() {
            assert_eq!(factorial(n as u32), *value);
        }
    }

    #[test]
    fn binomial_matches_pascal_triangle() {
        let rows: [&[u64]; 5] = [
            &[1],
            &[1, 1],
            &[1, 2, 1],
            &[1, 3, 3, 1],
            &[1, 4, 6, 4, 1],
        ];
        for (n, row) in rows.iter().enumerate() {
            for (k, value) in row.iter().enumerate() {
                assert_eq!(binomial(n as u32, k as u32), *value, "C({n}, {k})");
            }
        }
        assert_eq!(binomial(4, 2), 6);
    }

    #[test]
    fn binomial_is_zero_above_n() {
        assert_eq!(binomial(2, 3), 0);
        assert_eq!(binomial(0, 1), 0);
    }
}
