//! Amount-in-words rendering for printed vouchers
//!
//! Rupees are spelled with the Indian numbering system (Thousand, Lakh,
//! Crore). Counts of crore above ninety-nine are themselves spelled the same
//! way, so one thousand crore reads "One Thousand Crore".

use bigdecimal::{BigDecimal, ToPrimitive};

use crate::types::Money;

const ONES: [&str; 20] = [
    "Zero",
    "One",
    "Two",
    "Three",
    "Four",
    "Five",
    "Six",
    "Seven",
    "Eight",
    "Nine",
    "Ten",
    "Eleven",
    "Twelve",
    "Thirteen",
    "Fourteen",
    "Fifteen",
    "Sixteen",
    "Seventeen",
    "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const CRORE: u64 = 10_000_000;
const LAKH: u64 = 100_000;
const THOUSAND: u64 = 1_000;

/// Spell out a voucher total
///
/// `"{rupees} Rupees only"` for whole amounts, otherwise
/// `"{rupees} Rupees and {paise} Paisas"`. Paise are the first two fractional
/// digits, truncated.
pub fn to_words(amount: &Money) -> String {
    let sign = if amount.is_negative() { "Minus " } else { "" };
    let paise = (amount.amount().abs() * BigDecimal::from(100)).with_scale(0);

    let Some(paise) = paise.to_u64() else {
        // Beyond u64 paise; nothing in the book comes close.
        return format!("{}{} Rupees", sign, amount.amount().abs());
    };

    let rupees = paise / 100;
    let paise = paise % 100;

    if paise > 0 {
        format!(
            "{}{} Rupees and {} Paisas",
            sign,
            number_to_words(rupees),
            number_to_words(paise)
        )
    } else {
        format!("{}{} Rupees only", sign, number_to_words(rupees))
    }
}

/// English cardinal for `n`, grouped as Crore / Lakh / Thousand / Hundred
pub fn number_to_words(n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }

    let mut parts = Vec::new();

    let crores = n / CRORE;
    if crores > 0 {
        parts.push(format!("{} Crore", number_to_words(crores)));
    }

    let rest = n % CRORE;
    let lakhs = rest / LAKH;
    if lakhs > 0 {
        parts.push(format!("{} Lakh", below_hundred(lakhs)));
    }

    let rest = rest % LAKH;
    let thousands = rest / THOUSAND;
    if thousands > 0 {
        parts.push(format!("{} Thousand", below_hundred(thousands)));
    }

    let rest = rest % THOUSAND;
    let hundreds = rest / 100;
    if hundreds > 0 {
        parts.push(format!("{} Hundred", ONES[hundreds as usize]));
    }

    let rest = rest % 100;
    if rest > 0 {
        parts.push(below_hundred(rest));
    }

    parts.join(" ")
}

fn below_hundred(n: u64) -> String {
    debug_assert!(n > 0 && n < 100);
    if n < 20 {
        return ONES[n as usize].to_string();
    }
    let tens = TENS[(n / 10) as usize];
    match n % 10 {
        0 => tens.to_string(),
        ones => format!("{} {}", tens, ONES[ones as usize]),
    }
}
