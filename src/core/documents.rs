//! Brazilian tax identifier check digits (CPF for individuals, CNPJ for
//! legal entities).

use serde::{Deserialize, Serialize};

/// Which identifier scheme a document follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentKind {
    /// Pessoa física (CPF), 11 digits
    Pf,
    /// Pessoa jurídica (CNPJ), 14 digits
    Pj,
}

impl DocumentKind {
    pub fn expected_len(self) -> usize {
        match self {
            DocumentKind::Pf => 11,
            DocumentKind::Pj => 14,
        }
    }
}

/// Strip punctuation, keeping only ASCII digits
pub fn normalize_document(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validate a CPF or CNPJ, formatted or bare
pub fn is_valid_document(id: &str, kind: DocumentKind) -> bool {
    let digits: Vec<u32> = normalize_document(id)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != kind.expected_len() || all_same(&digits) {
        return false;
    }

    match kind {
        DocumentKind::Pf => cpf_check_digits_match(&digits),
        DocumentKind::Pj => cnpj_check_digits_match(&digits),
    }
}

#[inline]
fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn cpf_check_digit(body: &[u32]) -> u32 {
    // Weights descend from len+1 down to 2
    let top = body.len() as u32 + 1;
    let sum: u32 = body
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();

    match (sum * 10) % 11 {
        10 | 11 => 0,
        r => r,
    }
}

fn cpf_check_digits_match(digits: &[u32]) -> bool {
    cpf_check_digit(&digits[..9]) == digits[9] && cpf_check_digit(&digits[..10]) == digits[10]
}

fn cnpj_check_digit(body: &[u32]) -> u32 {
    // Weights 2..=9 applied right-to-left, restarting every 8 positions
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, d)| d * (2 + (i as u32 % 8)))
        .sum();

    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

fn cnpj_check_digits_match(digits: &[u32]) -> bool {
    cnpj_check_digit(&digits[..12]) == digits[12] && cnpj_check_digit(&digits[..13]) == digits[13]
}
