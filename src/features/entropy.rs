//! Shannon entropy over the character distribution of a string.

use std::collections::BTreeMap;

/// Entropy in bits per character. Empty input is 0.
pub fn shannon_entropy(s: &str) -> f32 {
    // Ordered map keeps the float summation order stable across calls
    let mut freq: BTreeMap<char, u32> = BTreeMap::new();
    let mut total = 0u32;
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let len = total as f64;
    let h: f64 = freq
        .values()
        .map(|&n| {
            let p = n as f64 / len;
            -p * p.log2()
        })
        .sum();
    // A single repeated symbol can come out as -0.0
    h.max(0.0) as f32
}
