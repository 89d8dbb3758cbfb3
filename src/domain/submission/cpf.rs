//! CPF (Brazilian taxpayer number) checksum and formatting

/// Keep only ASCII digits.
pub fn digits(cpf: &str) -> String {
    cpf.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn check_digit(digits: &[u32]) -> u32 {
    let weight_start = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (weight_start - i as u32))
        .sum();
    let rest = 11 - (sum % 11);
    if rest >= 10 {
        0
    } else {
        rest
    }
}

/// Validate a CPF, ignoring punctuation.
///
/// Requires 11 digits, rejects sequences of one repeated digit, and checks
/// both mod-11 verification digits.
pub fn is_valid(cpf: &str) -> bool {
    let nums: Vec<u32> = digits(cpf).chars().filter_map(|c| c.to_digit(10)).collect();
    if nums.len() != 11 {
        return false;
    }
    if nums.iter().all(|d| *d == nums[0]) {
        return false;
    }

    check_digit(&nums[..9]) == nums[9] && check_digit(&nums[..10]) == nums[10]
}

/// Render as `000.000.000-00`. Inputs that are not 11 digits come back as
/// their bare digits.
pub fn format(cpf: &str) -> String {
    let d = digits(cpf);
    if d.len() != 11 {
        return d;
    }
    format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11])
}
