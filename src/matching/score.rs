// Reading a score out of the oracle's reply.
//
// The parse is intentionally lenient: every decimal digit in the reply is kept
// in order and the result is read as one integer. "Score: 85%" gives 85, but
// "8.5" also gives 85 and "100%off" gives 100. There is no upper clamp, so a
// reply of "999" scores 999. Decimal digits from any script count, so a
// full-width "８５" is 85 as well.

use crate::error::ScoreParseError;

/// Scores strictly below this are flagged as weak matches.
pub const FLAG_THRESHOLD: u64 = 80;

/// Code point of the zero in every Unicode decimal digit (Nd) run. Each run
/// holds ten consecutive digits; the table is sorted.
const DECIMAL_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66, 0x0BE6, 0x0C66,
    0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040, 0x1090, 0x17E0, 0x1810, 0x1946,
    0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0, 0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0,
    0xA9F0, 0xAA50, 0xABF0, 0xFF10, 0x104A0, 0x10D30, 0x11066, 0x110F0, 0x11136, 0x111D0,
    0x112F0, 0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950, 0x11C50, 0x11D50,
    0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8, 0x1D7E2, 0x1D7EC, 0x1D7F6,
    0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950, 0x1FBF0,
];

/// Value of `c` if it is a decimal digit in any script.
fn decimal_value(c: char) -> Option<u32> {
    if let Some(d) = c.to_digit(10) {
        return Some(d);
    }
    let code = c as u32;
    let run = DECIMAL_ZEROS.partition_point(|&zero| zero <= code).checked_sub(1)?;
    let value = code - DECIMAL_ZEROS[run];
    (value < 10).then_some(value)
}

/// Parse an oracle reply by concatenating its digits.
pub fn parse_score(reply: &str) -> Result<u64, ScoreParseError> {
    let trimmed = reply.trim();
    let digits: Vec<u32> = trimmed.chars().filter_map(decimal_value).collect();

    if digits.is_empty() {
        return Err(ScoreParseError::NoDigits(trimmed.to_string()));
    }

    digits
        .iter()
        .try_fold(0u64, |acc, &d| acc.checked_mul(10)?.checked_add(u64::from(d)))
        .ok_or_else(|| ScoreParseError::Overflow(trimmed.to_string()))
}

/// Whether a score counts as a weak match.
pub fn is_flagged(score: u64) -> bool {
    score < FLAG_THRESHOLD
}
