//! # Formatting Module
//!
//! The single place where numbers become display strings, shared by cards,
//! charts and ranking tables
//!
//! ## Key Components
//! - [`FormatRules`] - Currency suffix, precision and separators
//! - [`group_thousands`] - Digit grouping for the integer part

#[derive(Debug, Clone, PartialEq)]
pub struct FormatRules {
    pub currency_suffix: String,
    pub currency_decimals: usize,
    pub count_decimals: usize,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl Default for FormatRules {
    fn default() -> Self {
        Self {
            currency_suffix: " €".to_string(),
            currency_decimals: 2,
            count_decimals: 0,
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }
}

impl FormatRules {
    pub fn currency(&self, value: f64) -> String {
        format!("{}{}", self.number(value, self.currency_decimals), self.currency_suffix)
    }

    pub fn count(&self, value: f64) -> String {
        self.number(value, self.count_decimals)
    }

    /// Percentages are already rounded to one decimal by the ranker.
    pub fn percentage(&self, value: f64) -> String {
        format!("{}%", self.number(value, 1))
    }

    pub fn number(&self, value: f64, decimals: usize) -> String {
        let value = if value.is_finite() { value } else { 0.0 };
        let formatted = format!("{:.*}", decimals, value.abs());
        let (int_part, frac_part) = match formatted.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (formatted.as_str(), None),
        };

        let mut result = String::new();
        // no "-0.00"
        if value < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
            result.push('-');
        }
        result.push_str(&group_thousands(int_part, self.thousands_separator));
        if let Some(frac) = frac_part {
            result.push(self.decimal_separator);
            result.push_str(frac);
        }
        result
    }
}

/// Insert `separator` every three digits from the right.
pub fn group_thousands(digits: &str, separator: char) -> String {
    let mut result = String::new();
    let chars: Vec<char> = digits.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(separator);
        }
        result.push(*c);
    }

    result
}
