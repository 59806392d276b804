//! Input normalization and display masks for Brazilian document formats.
//!
//! Forms store the normalized value (digits only, upper-case plate) and
//! render it through a mask. Masks are progressive so they can be applied
//! while the user is still typing.

const CPF_MASK: &str = "000.000.000-00";
const POSTAL_CODE_MASK: &str = "00000-000";
const LANDLINE_MASK: &str = "(00) 0000-0000";
const MOBILE_MASK: &str = "(00) 00000-0000";

/// Keep ASCII digits only.
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Upper-case alphanumerics only (`abc-1d23` → `ABC1D23`).
pub fn normalize_plate(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Fill `pattern` slots (`0`) with `digits`, stopping when digits run out.
fn apply_mask(digits: &str, pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = digits.chars().peekable();

    for slot in pattern.chars() {
        if chars.peek().is_none() {
            break;
        }
        if slot == '0' {
            if let Some(c) = chars.next() {
                out.push(c);
            }
        } else {
            out.push(slot);
        }
    }

    out
}

pub fn mask_cpf(raw: &str) -> String {
    apply_mask(&digits_only(raw), CPF_MASK)
}

pub fn mask_postal_code(raw: &str) -> String {
    apply_mask(&digits_only(raw), POSTAL_CODE_MASK)
}

/// Landline `(11) 2345-6789` up to ten digits, mobile `(11) 98765-4321` above.
pub fn mask_phone(raw: &str) -> String {
    let digits = digits_only(raw);
    if digits.len() > 10 {
        apply_mask(&digits, MOBILE_MASK)
    } else {
        apply_mask(&digits, LANDLINE_MASK)
    }
}

/// Legacy plates render as `ABC-1234`; Mercosul plates (`ABC1D23`) as-is.
pub fn mask_plate(raw: &str) -> String {
    let plate = normalize_plate(raw);
    if is_legacy_plate(&plate) {
        format!("{}-{}", &plate[..3], &plate[3..])
    } else {
        plate
    }
}

fn is_legacy_plate(plate: &str) -> bool {
    let bytes = plate.as_bytes();
    bytes.len() == 7
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && bytes[3..].iter().all(u8::is_ascii_digit)
}

fn is_mercosul_plate(plate: &str) -> bool {
    let bytes = plate.as_bytes();
    bytes.len() == 7
        && bytes[..3].iter().all(u8::is_ascii_uppercase)
        && bytes[3].is_ascii_digit()
        && bytes[4].is_ascii_uppercase()
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

/// Whether an already-normalized plate matches the legacy or Mercosul layout.
pub fn is_valid_plate(plate: &str) -> bool {
    is_legacy_plate(plate) || is_mercosul_plate(plate)
}

/// CPF check-digit validation on an 11-digit string.
///
/// Sequences of a single repeated digit pass the arithmetic but are not
/// issued, so they are rejected.
pub fn is_valid_cpf(raw: &str) -> bool {
    let digits: Vec<u32> = digits_only(raw)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let weight_start = len as u32 + 1;
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (weight_start - i as u32))
            .sum();
        match (sum * 10) % 11 {
            10 => 0,
            r => r,
        }
    };

    check(9) == digits[9] && check(10) == digits[10]
}
