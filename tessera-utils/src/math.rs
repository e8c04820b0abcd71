//! Power-of-two helpers shared by the square layout code and the Merkle trees.

/// Largest power of two strictly smaller than `length`. `length` must be at least 2.
#[must_use]
pub const fn split_point(length: usize) -> usize {
    assert!(length >= 2, "split point is undefined for less than two leaves");
    let k = 1 << (usize::BITS - 1 - length.leading_zeros());
    if k == length {
        k >> 1
    } else {
        k
    }
}

#[must_use]
pub const fn is_power_of_two(n: usize) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Smallest power of two greater or equal than `n` (`1` for `0`).
#[must_use]
pub const fn round_up_power_of_two(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        n.next_power_of_two()
    }
}

/// Largest power of two lower or equal than `n`. `n` must not be zero.
#[must_use]
pub const fn round_down_power_of_two(n: usize) -> usize {
    assert!(n > 0, "no power of two below zero");
    1 << (usize::BITS - 1 - n.leading_zeros())
}

/// Integer square root rounded up.
#[must_use]
pub fn ceil_sqrt(n: usize) -> usize {
    let mut root = (n as f64).sqrt() as usize;
    while root * root < n {
        root += 1;
    }
    while root > 0 && (root - 1) * (root - 1) >= n {
        root -= 1;
    }
    root
}
