/// Default CPU-bound load generator: trial-division prime counting up to
/// `limit`. Any deterministic CPU burner would do; the runner only sees an
/// opaque callable.
pub fn prime_count(limit: u32) -> u32 {
    let mut count = 0;
    for n in 2..=limit {
        if is_prime(n) {
            count += 1;
        }
    }
    // Keep the optimizer from deleting the loop
    std::hint::black_box(count)
}

fn is_prime(n: u32) -> bool {
    if n < 2 {
        return false;
    }
    let n = n as u64;
    let mut i: u64 = 2;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}
