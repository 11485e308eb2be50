//! Excel number format codes applied to cell values.
//!
//! Covers the parts of the format language that change the displayed text:
//! sections, quoted and escaped literals, digit placeholders, thousands
//! separators and scaling, percent, scientific notation, fractions and
//! date/time codes including elapsed time. Colors and conditions are ignored.

use crate::display::format_general;
use chrono::{Datelike, Days, NaiveDate};
use std::fmt::Write;

/// Options for [`format_number`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Serial dates count from 1904-01-01
    pub date1904: bool,
}

/// Days between the 1900 and 1904 date systems
const DATE1904_OFFSET: f64 = 1462.0;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    /// `0`, `#` or `?`
    Digit(char),
    Point,
    Comma,
    Percent,
    Exponent { plus: bool },
    Slash,
    /// `@`
    Text,
    General,
    /// Lowercased `y`, `m`, `d`, `h` or `s` run
    Date { part: char, len: usize },
    /// `[h]`, `[mm]`, `[ss]`
    Elapsed { part: char, len: usize },
    AmPm { am: String, pm: String },
}

/// Format code of a built-in number format id
pub fn builtin_format(id: u32) -> Option<&'static str> {
    let code = match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => r##""$"#,##0_);("$"#,##0)"##,
        6 => r##""$"#,##0_);[Red]("$"#,##0)"##,
        7 => r##""$"#,##0.00_);("$"#,##0.00)"##,
        8 => r##""$"#,##0.00_);[Red]("$"#,##0.00)"##,
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "m/d/yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0_);(#,##0)",
        38 => "#,##0_);[Red](#,##0)",
        39 => "#,##0.00_);(#,##0.00)",
        40 => "#,##0.00_);[Red](#,##0.00)",
        41 => r#"_(* #,##0_);_(* \(#,##0\);_(* "-"_);_(@_)"#,
        42 => r#"_("$"* #,##0_);_("$"* \(#,##0\);_("$"* "-"_);_(@_)"#,
        43 => r#"_(* #,##0.00_);_(* \(#,##0.00\);_(* "-"??_);_(@_)"#,
        44 => r#"_("$"* #,##0.00_);_("$"* \(#,##0.00\);_("$"* "-"??_);_(@_)"#,
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mm:ss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    };
    Some(code)
}

/// Whether a code is the General format
pub fn is_general(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case("general")
}

/// Render a number with a format code.
pub fn format_number(code: &str, value: f64, options: FormatOptions) -> String {
    if !value.is_finite() {
        return "#NUM!".to_string();
    }

    let sections = split_sections(code);
    let (section, signed) = numeric_section(&sections, value);
    let tokens = tokenize(section);

    if is_date(&tokens) {
        let serial = if options.date1904 {
            value + DATE1904_OFFSET
        } else {
            value
        };
        return format_date(&tokens, serial).unwrap_or_else(|| format_general(value));
    }

    let value = if signed { value } else { value.abs() };
    format_numeric(&tokens, value)
}

/// Render text with a format code; only an `@` section changes it.
pub fn format_text(code: &str, text: &str) -> String {
    let sections = split_sections(code);
    let section = match sections.get(3) {
        Some(section) => *section,
        None if sections.len() == 1 => sections[0],
        None => return text.to_string(),
    };

    let tokens = tokenize(section);
    if sections.len() < 4 && !tokens.contains(&Token::Text) {
        return text.to_string();
    }

    let mut out = String::new();
    for token in &tokens {
        match token {
            Token::Text => out.push_str(text),
            Token::Literal(s) => out.push_str(s),
            _ => {}
        }
    }
    out
}

/// Split a code on `;` outside of quotes and escapes
fn split_sections(code: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (idx, ch) in code.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                sections.push(&code[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    sections.push(&code[start..]);
    sections
}

/// Pick the section for a number; `false` when the section renders the
/// absolute value.
fn numeric_section<'a>(sections: &[&'a str], value: f64) -> (&'a str, bool) {
    if value < 0.0 && sections.len() >= 2 {
        (sections[1], false)
    } else if value == 0.0 && sections.len() >= 3 {
        (sections[2], false)
    } else {
        (sections[0], true)
    }
}

fn tokenize(section: &str) -> Vec<Token> {
    let chars: Vec<char> = section.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let rest = &chars[i..];
        i += 1;
        match ch {
            '"' => {
                let start = i;
                while i < chars.len() && chars[i] != '"' {
                    i += 1;
                }
                tokens.push(Token::Literal(chars[start..i].iter().collect()));
                i += 1;
            }
            '\\' => {
                if let Some(next) = chars.get(i) {
                    tokens.push(Token::Literal(next.to_string()));
                    i += 1;
                }
            }
            // Padding as wide as the next character
            '_' => {
                tokens.push(Token::Literal(" ".to_string()));
                i += 1;
            }
            // Fill character
            '*' => i += 1,
            '[' => {
                let start = i;
                while i < chars.len() && chars[i] != ']' {
                    i += 1;
                }
                let content: String = chars[start..i].iter().collect();
                i += 1;
                if let Some(token) = bracket_token(&content) {
                    tokens.push(token);
                }
            }
            '0' | '#' | '?' => tokens.push(Token::Digit(ch)),
            '.' => tokens.push(Token::Point),
            ',' => tokens.push(Token::Comma),
            '%' => tokens.push(Token::Percent),
            '/' => tokens.push(Token::Slash),
            '@' => tokens.push(Token::Text),
            'E' | 'e' if matches!(chars.get(i), Some('+' | '-')) => {
                tokens.push(Token::Exponent {
                    plus: chars[i] == '+',
                });
                i += 1;
            }
            'A' | 'a' if starts_with_ignore_case(rest, "AM/PM") => {
                tokens.push(Token::AmPm {
                    am: rest[..2].iter().collect(),
                    pm: rest[3..5].iter().collect(),
                });
                i += 4;
            }
            'A' | 'a' if starts_with_ignore_case(rest, "A/P") => {
                tokens.push(Token::AmPm {
                    am: rest[0].to_string(),
                    pm: rest[2].to_string(),
                });
                i += 2;
            }
            'G' | 'g' if starts_with_ignore_case(rest, "General") => {
                tokens.push(Token::General);
                i += 6;
            }
            _ if matches!(ch.to_ascii_lowercase(), 'y' | 'm' | 'd' | 'h' | 's') => {
                let part = ch.to_ascii_lowercase();
                let mut len = 1;
                while i < chars.len() && chars[i].to_ascii_lowercase() == part {
                    len += 1;
                    i += 1;
                }
                tokens.push(Token::Date { part, len });
            }
            _ => tokens.push(Token::Literal(ch.to_string())),
        }
    }

    tokens
}

fn starts_with_ignore_case(chars: &[char], pattern: &str) -> bool {
    pattern.chars().count() <= chars.len()
        && pattern
            .chars()
            .zip(chars)
            .all(|(p, c)| p.eq_ignore_ascii_case(c))
}

/// Elapsed time units and currency symbols; colors, conditions and
/// locales yield nothing.
fn bracket_token(content: &str) -> Option<Token> {
    let lower = content.to_ascii_lowercase();
    if let Some(first) = lower.chars().next() {
        if matches!(first, 'h' | 'm' | 's') && lower.chars().all(|c| c == first) {
            return Some(Token::Elapsed {
                part: first,
                len: lower.len(),
            });
        }
    }
    let symbol = content.strip_prefix('$')?.split('-').next()?;
    (!symbol.is_empty()).then(|| Token::Literal(symbol.to_string()))
}

fn is_date(tokens: &[Token]) -> bool {
    tokens.iter().any(|t| {
        matches!(
            t,
            Token::Date { .. } | Token::Elapsed { .. } | Token::AmPm { .. }
        )
    })
}

// ============================================================================
// Numbers
// ============================================================================

fn format_numeric(tokens: &[Token], value: f64) -> String {
    let negative = value < 0.0;
    let mut number = value.abs();
    for _ in tokens.iter().filter(|t| **t == Token::Percent) {
        number *= 100.0;
    }
    let (thousands, scale) = comma_roles(tokens);
    for _ in 0..scale {
        number /= 1000.0;
    }

    let shows_value = tokens
        .iter()
        .any(|t| matches!(t, Token::Digit(_) | Token::General));

    let body = if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, Token::Exponent { .. }))
    {
        format_scientific(tokens, pos, number)
    } else if let Some(pos) = fraction_slash(tokens) {
        format_fraction(tokens, pos, number)
    } else if tokens.contains(&Token::General) {
        let mut out = String::new();
        for token in tokens {
            match token {
                Token::General => out.push_str(&format_general(number)),
                Token::Literal(s) => out.push_str(s),
                Token::Percent => out.push('%'),
                _ => {}
            }
        }
        out
    } else {
        format_fixed(tokens, number, thousands)
    };

    if negative && shows_value && body.chars().any(|c| matches!(c, '1'..='9')) {
        format!("-{body}")
    } else {
        body
    }
}

/// Whether the code groups thousands, and how many times it divides by 1000
fn comma_roles(tokens: &[Token]) -> (bool, usize) {
    let point = tokens
        .iter()
        .position(|t| *t == Token::Point)
        .unwrap_or(tokens.len());
    let is_digit = |t: Option<&Token>| matches!(t, Some(Token::Digit(_)));

    let mut thousands = false;
    let mut scale = 0;
    for (idx, token) in tokens.iter().enumerate() {
        if *token != Token::Comma {
            continue;
        }
        let previous = tokens[..idx].iter().rev().find(|t| **t != Token::Comma);
        if !is_digit(previous) {
            continue;
        }
        let next = tokens[idx + 1..].iter().find(|t| **t != Token::Comma);
        if is_digit(next) {
            thousands |= idx < point;
        } else {
            scale += 1;
        }
    }
    (thousands, scale)
}

fn format_fixed(tokens: &[Token], number: f64, thousands: bool) -> String {
    let point = tokens.iter().position(|t| *t == Token::Point);
    let (int_tokens, frac_tokens) = match point {
        Some(p) => (&tokens[..p], &tokens[p + 1..]),
        None => (tokens, &[][..]),
    };
    let decimals = frac_tokens
        .iter()
        .filter(|t| matches!(t, Token::Digit(_)))
        .count();

    let (int_digits, frac_digits) = round_decimal(number, decimals);
    let mut out = render_integer(int_tokens, &int_digits, thousands);
    if point.is_some() {
        out.push('.');
        out.push_str(&render_fraction(frac_tokens, &frac_digits));
    }
    out
}

/// Digits of `number` rounded half away from zero to `decimals` places,
/// after reducing it to 15 significant digits.
fn round_decimal(number: f64, decimals: usize) -> (String, String) {
    if number == 0.0 {
        return ("0".to_string(), "0".repeat(decimals));
    }

    let formatted = format!("{number:.14e}");
    let (mantissa, exponent) = formatted.split_once('e').unwrap_or((&formatted, "0"));
    let exponent: i64 = exponent.parse().unwrap_or(0);
    let mut digits: Vec<u8> = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();
    // Digits in front of the decimal point
    let mut point = exponent + 1;

    let keep = point + decimals as i64;
    if keep < 0 {
        return ("0".to_string(), "0".repeat(decimals));
    }
    let keep = keep as usize;
    if keep < digits.len() {
        let round_up = digits[keep] >= 5;
        digits.truncate(keep);
        if round_up {
            let mut idx = keep;
            loop {
                if idx == 0 {
                    digits.insert(0, 1);
                    point += 1;
                    break;
                }
                idx -= 1;
                if digits[idx] == 9 {
                    digits[idx] = 0;
                } else {
                    digits[idx] += 1;
                    break;
                }
            }
        }
    }

    let digit_at = |pos: i64| -> char {
        usize::try_from(pos)
            .ok()
            .and_then(|pos| digits.get(pos))
            .map_or('0', |d| char::from(b'0' + d))
    };
    let int = if point > 0 {
        (0..point).map(digit_at).collect()
    } else {
        "0".to_string()
    };
    let frac = (point..point + decimals as i64).map(digit_at).collect();
    (int, frac)
}

/// Lay integer digits out over the placeholders, right to left. The
/// leftmost placeholder takes any surplus digits.
fn render_integer(tokens: &[Token], digits: &str, thousands: bool) -> String {
    enum Piece<'a> {
        Digit(char),
        Text(&'a str),
    }

    let digits: Vec<char> = digits.trim_start_matches('0').chars().collect();
    let count = tokens
        .iter()
        .filter(|t| matches!(t, Token::Digit(_)))
        .count();

    let mut pieces = Vec::new();
    let mut slot = 0;
    for token in tokens {
        match token {
            Token::Digit(ch) => {
                if slot == 0 && digits.len() > count {
                    pieces.extend(digits[..digits.len() - count].iter().map(|d| Piece::Digit(*d)));
                }
                let from_right = count - 1 - slot;
                if from_right < digits.len() {
                    pieces.push(Piece::Digit(digits[digits.len() - 1 - from_right]));
                } else if *ch == '0' {
                    pieces.push(Piece::Digit('0'));
                } else if *ch == '?' {
                    pieces.push(Piece::Digit(' '));
                }
                slot += 1;
            }
            Token::Literal(s) => pieces.push(Piece::Text(s)),
            Token::Percent => pieces.push(Piece::Text("%")),
            _ => {}
        }
    }
    if count == 0 {
        pieces.extend(digits.iter().map(|d| Piece::Digit(*d)));
    }

    let total = pieces.iter().filter(|p| matches!(p, Piece::Digit(_))).count();
    let mut seen = 0;
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Digit(d) => {
                if thousands && seen > 0 && (total - seen) % 3 == 0 {
                    out.push(',');
                }
                out.push(d);
                seen += 1;
            }
            Piece::Text(s) => out.push_str(s),
        }
    }
    out
}

/// Lay decimal digits out over the placeholders, left to right
fn render_fraction(tokens: &[Token], digits: &str) -> String {
    let digits: Vec<char> = digits.chars().collect();
    let mut out = String::new();
    let mut slot = 0;

    for token in tokens {
        match token {
            Token::Digit(ch) => {
                let digit = digits.get(slot).copied().unwrap_or('0');
                let rest_zero = digits
                    .get(slot..)
                    .unwrap_or(&[])
                    .iter()
                    .all(|d| *d == '0');
                match ch {
                    '0' => out.push(digit),
                    '#' if !rest_zero => out.push(digit),
                    '?' => out.push(if rest_zero { ' ' } else { digit }),
                    _ => {}
                }
                slot += 1;
            }
            Token::Literal(s) => out.push_str(s),
            Token::Percent => out.push('%'),
            _ => {}
        }
    }
    out
}

fn format_scientific(tokens: &[Token], exp_pos: usize, number: f64) -> String {
    let mantissa_tokens = &tokens[..exp_pos];
    let exponent_tokens = &tokens[exp_pos + 1..];
    let plus = matches!(tokens[exp_pos], Token::Exponent { plus: true });

    let point = mantissa_tokens
        .iter()
        .position(|t| *t == Token::Point)
        .unwrap_or(mantissa_tokens.len());
    let int_count = mantissa_tokens[..point]
        .iter()
        .filter(|t| matches!(t, Token::Digit(_)))
        .count();
    let step = int_count.max(1) as i32;

    let mut exponent = if number == 0.0 {
        0
    } else {
        let formatted = format!("{number:.14e}");
        formatted
            .split_once('e')
            .and_then(|(_, e)| e.parse::<i32>().ok())
            .unwrap_or(0)
    };
    exponent = exponent.div_euclid(step) * step;

    let mut mantissa = number / 10f64.powi(exponent);
    let decimals = mantissa_tokens[point..]
        .iter()
        .filter(|t| matches!(t, Token::Digit(_)))
        .count();
    let (mut int, mut frac) = round_decimal(mantissa, decimals);
    if number != 0.0 && int.len() > step as usize {
        exponent += step;
        mantissa = number / 10f64.powi(exponent);
        (int, frac) = round_decimal(mantissa, decimals);
    }

    let mut out = render_integer(&mantissa_tokens[..point], &int, false);
    if point < mantissa_tokens.len() {
        out.push('.');
        out.push_str(&render_fraction(&mantissa_tokens[point + 1..], &frac));
    }
    out.push('E');
    if exponent < 0 {
        out.push('-');
    } else if plus {
        out.push('+');
    }
    out.push_str(&render_integer(
        exponent_tokens,
        &exponent.unsigned_abs().to_string(),
        false,
    ));
    out
}

/// A `/` preceded by a digit placeholder
fn fraction_slash(tokens: &[Token]) -> Option<usize> {
    tokens
        .iter()
        .enumerate()
        .position(|(idx, t)| {
            *t == Token::Slash && idx > 0 && matches!(tokens[idx - 1], Token::Digit(_))
        })
}

fn format_fraction(tokens: &[Token], slash: usize, number: f64) -> String {
    let mut num_start = slash;
    while num_start > 0 && matches!(tokens[num_start - 1], Token::Digit(_)) {
        num_start -= 1;
    }
    let int_tokens = &tokens[..num_start];
    let num_tokens = &tokens[num_start..slash];
    let has_int = int_tokens.iter().any(|t| matches!(t, Token::Digit(_)));

    // Denominator: placeholders, or a fixed number such as `/8` or `/100`
    let mut den_end = slash + 1;
    let mut fixed = String::new();
    if matches!(tokens.get(den_end), Some(Token::Literal(s)) if s.len() == 1 && s.chars().all(|c| ('1'..='9').contains(&c)))
    {
        while let Some(token) = tokens.get(den_end) {
            match token {
                Token::Literal(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => {
                    fixed.push_str(s);
                }
                Token::Digit('0') => fixed.push('0'),
                _ => break,
            }
            den_end += 1;
        }
    } else {
        while matches!(tokens.get(den_end), Some(Token::Digit(_))) {
            den_end += 1;
        }
    }
    let den_tokens = &tokens[slash + 1..den_end];

    let (mut whole, fraction) = if has_int {
        (number.trunc(), number.fract())
    } else {
        (0.0, number)
    };

    let (mut numerator, denominator) = match fixed.parse::<u64>() {
        Ok(denominator) if denominator > 0 => {
            ((fraction * denominator as f64).round() as u64, denominator)
        }
        _ => {
            let max = 10u64.pow(den_tokens.len().clamp(1, 4) as u32) - 1;
            closest_fraction(fraction, max)
        }
    };
    if has_int && numerator == denominator {
        whole += 1.0;
        numerator = 0;
    }

    if numerator == 0 {
        return if whole == 0.0 {
            "0".to_string()
        } else {
            render_integer(int_tokens, &format!("{whole:.0}"), false)
                .trim_end()
                .to_string()
        };
    }

    let mut out = if has_int {
        render_integer(int_tokens, &format!("{whole:.0}"), false)
    } else {
        render_integer(int_tokens, "", false)
    };
    out.push_str(&render_integer(num_tokens, &numerator.to_string(), false));
    out.push('/');
    let den_text = denominator.to_string();
    out.push_str(&den_text);
    if fixed.is_empty() {
        for ch in den_tokens.iter().skip(den_text.len()) {
            if *ch == Token::Digit('?') {
                out.push(' ');
            }
        }
    }
    for token in &tokens[den_end..] {
        if let Token::Literal(s) = token {
            out.push_str(s);
        }
    }
    out
}

/// Nearest `n/d` with `d <= max`, preferring the smallest denominator
fn closest_fraction(value: f64, max: u64) -> (u64, u64) {
    let mut best = (0, 1);
    let mut best_error = f64::INFINITY;
    for denominator in 1..=max {
        let numerator = (value * denominator as f64).round();
        let error = (value - numerator / denominator as f64).abs();
        if error < best_error {
            best = (numerator as u64, denominator);
            best_error = error;
        }
        if error == 0.0 {
            break;
        }
    }
    best
}

// ============================================================================
// Dates and times
// ============================================================================

fn format_date(tokens: &[Token], serial: f64) -> Option<String> {
    if serial < 0.0 {
        return None;
    }

    let precision = subsecond_digits(tokens);
    let scale = 10i64.pow(precision);
    let units = (serial * 86_400.0 * scale as f64).round() as i64;
    let total_seconds = units / scale;
    let subsecond = units % scale;
    let date = serial_date(total_seconds / 86_400)?;
    let of_day = total_seconds % 86_400;
    let (hour, minute, second) = (of_day / 3600, of_day % 3600 / 60, of_day % 60);

    let twelve_hour = tokens.iter().any(|t| matches!(t, Token::AmPm { .. }));
    let minutes = minute_flags(tokens);

    let mut out = String::new();
    let mut i = 0;
    while i < tokens.len() {
        match &tokens[i] {
            Token::Date { part: 'y', len } => {
                if *len <= 2 {
                    let _ = write!(out, "{:02}", date.year().rem_euclid(100));
                } else {
                    let _ = write!(out, "{:04}", date.year());
                }
            }
            Token::Date { part: 'm', len } if minutes[i] => pad(&mut out, minute, *len),
            Token::Date { part: 'm', len } => match len {
                1 | 2 => pad(&mut out, i64::from(date.month()), *len),
                3 => out.push_str(&date.format("%b").to_string()),
                4 => out.push_str(&date.format("%B").to_string()),
                _ => out.extend(date.format("%B").to_string().chars().take(1)),
            },
            Token::Date { part: 'd', len } => match len {
                1 | 2 => pad(&mut out, i64::from(date.day()), *len),
                3 => out.push_str(&date.format("%a").to_string()),
                _ => out.push_str(&date.format("%A").to_string()),
            },
            Token::Date { part: 'h', len } => {
                let hour = if twelve_hour { (hour + 11) % 12 + 1 } else { hour };
                pad(&mut out, hour, *len);
            }
            Token::Date { len, .. } => pad(&mut out, second, *len),
            Token::Elapsed { part, len } => {
                let value = match part {
                    'h' => total_seconds / 3600,
                    'm' => total_seconds / 60,
                    _ => total_seconds,
                };
                pad(&mut out, value, *len);
            }
            Token::AmPm { am, pm } => out.push_str(if hour < 12 { am } else { pm }),
            Token::Point if precision > 0 && tokens.get(i + 1) == Some(&Token::Digit('0')) => {
                let _ = write!(out, ".{subsecond:0width$}", width = precision as usize);
                i += 1;
                while tokens.get(i + 1) == Some(&Token::Digit('0')) {
                    i += 1;
                }
            }
            Token::Point => out.push('.'),
            Token::Digit(ch) => out.push(*ch),
            Token::Literal(s) => out.push_str(s),
            Token::Comma => out.push(','),
            Token::Slash => out.push('/'),
            Token::Percent => out.push('%'),
            Token::Exponent { .. } | Token::Text | Token::General => {}
        }
        i += 1;
    }
    Some(out)
}

fn pad(out: &mut String, value: i64, len: usize) {
    if len >= 2 {
        let _ = write!(out, "{value:02}");
    } else {
        let _ = write!(out, "{value}");
    }
}

/// Digits of fractional seconds, from `.0` placeholders after a point
fn subsecond_digits(tokens: &[Token]) -> u32 {
    tokens
        .iter()
        .position(|t| *t == Token::Point)
        .map_or(0, |point| {
            tokens[point + 1..]
                .iter()
                .take_while(|t| **t == Token::Digit('0'))
                .count()
                .min(3) as u32
        })
}

/// `m` means minutes right after an hour or right before a second
fn minute_flags(tokens: &[Token]) -> Vec<bool> {
    let parts: Vec<Option<char>> = tokens
        .iter()
        .map(|t| match t {
            Token::Date { part, .. } | Token::Elapsed { part, .. } => Some(*part),
            _ => None,
        })
        .collect();

    tokens
        .iter()
        .enumerate()
        .map(|(idx, token)| {
            if !matches!(token, Token::Date { part: 'm', .. }) {
                return false;
            }
            let previous = parts[..idx].iter().rev().flatten().next();
            let next = parts[idx + 1..].iter().flatten().next();
            previous == Some(&'h') || next == Some(&'s')
        })
        .collect()
}

/// Calendar date of a 1900-system serial day number
fn serial_date(days: i64) -> Option<NaiveDate> {
    // Serials before 1900-03-01 sit on the other side of the phantom 1900-02-29
    let base = if days < 61 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    base.checked_add_days(Days::new(u64::try_from(days).ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(code: &str, value: f64) -> String {
        format_number(code, value, FormatOptions::default())
    }

    // ========================================================================
    // numbers
    // ========================================================================

    #[test]
    fn test_zero_padding() {
        assert_eq!(fmt("00000", 42.0), "00042");
        assert_eq!(fmt("00000", 123_456.0), "123456");
        assert_eq!(fmt(r#""ID-"0000"#, 7.0), "ID-0007");
        assert_eq!(fmt("(###) ###-####", 5_551_234_567.0), "(555) 123-4567");
    }

    #[test]
    fn test_fixed_decimals() {
        assert_eq!(fmt("0.00", 5.0), "5.00");
        assert_eq!(fmt("0.00", 1.005), "1.01");
        assert_eq!(fmt("0", 2.5), "3");
        assert_eq!(fmt("0.0#", 3.1), "3.1");
        assert_eq!(fmt("#.00", 0.5), ".50");
        assert_eq!(fmt("0.00", -5.0), "-5.00");
    }

    #[test]
    fn test_thousands_and_scaling() {
        assert_eq!(fmt("#,##0.00", 1234.5), "1,234.50");
        assert_eq!(fmt("#,##0", 1_234_567.0), "1,234,567");
        assert_eq!(fmt("#,##0", 0.0), "0");
        assert_eq!(fmt("#,##0,", 1_234_567.0), "1,235");
        assert_eq!(fmt("0.0,,", 12_345_678.0), "12.3");
    }

    #[test]
    fn test_percent() {
        assert_eq!(fmt("0%", 0.25), "25%");
        assert_eq!(fmt("0.00%", 0.1234), "12.34%");
        assert_eq!(fmt("0%", -0.5), "-50%");
    }

    #[test]
    fn test_sections() {
        assert_eq!(fmt("0.0;(0.0)", -12.34), "(12.3)");
        assert_eq!(fmt("0.0;(0.0)", 12.34), "12.3");
        assert_eq!(fmt(r#"0;-0;"zero""#, 0.0), "zero");
        assert_eq!(fmt("[Red]0.00;[Blue]-0.00", -1.5), "-1.50");
        assert_eq!(fmt(r#"[$€-407]#,##0.00"#, 1500.0), "€1,500.00");
    }

    #[test]
    fn test_builtin_accounting_and_currency() {
        let currency = builtin_format(7).unwrap();
        assert_eq!(fmt(currency, 1234.5), "$1,234.50 ");
        assert_eq!(fmt(currency, -1234.5), "($1,234.50)");
        assert_eq!(fmt(builtin_format(37).unwrap(), 42.0), "42 ");
    }

    #[test]
    fn test_scientific() {
        assert_eq!(fmt("0.00E+00", 123_456.0), "1.23E+05");
        assert_eq!(fmt("0.00E+00", 0.000_123), "1.23E-04");
        assert_eq!(fmt("0.00E+00", 0.0), "0.00E+00");
        assert_eq!(fmt("0.00E+00", 9.999), "1.00E+01");
        assert_eq!(fmt("##0.0E+0", 12_345.0), "12.3E+3");
    }

    #[test]
    fn test_fractions() {
        assert_eq!(fmt("# ?/?", 1.5), "1 1/2");
        assert_eq!(fmt("# ?/?", 2.0), "2");
        assert_eq!(fmt("?/?", 0.75), "3/4");
        assert_eq!(fmt("# ?/8", 1.375), "1 3/8");
        assert_eq!(fmt("# ??/??", 0.0), "0");
    }

    #[test]
    fn test_general_with_literals() {
        assert_eq!(fmt(r#"General" units""#, 5.0), "5 units");
        assert!(is_general("General"));
        assert!(is_general(" general "));
        assert!(!is_general("0.00"));
    }

    #[test]
    fn test_round_decimal() {
        assert_eq!(round_decimal(0.6, 0), ("1".into(), String::new()));
        assert_eq!(round_decimal(9.99, 1), ("10".into(), "0".into()));
        assert_eq!(round_decimal(0.004, 2), ("0".into(), "00".into()));
        assert_eq!(round_decimal(0.07 * 100.0, 1), ("7".into(), "0".into()));
    }

    // ========================================================================
    // dates and times
    // ========================================================================

    // 2024-01-15, a Monday
    const JAN_15_2024: f64 = 45306.0;

    #[test]
    fn test_custom_date_patterns() {
        assert_eq!(fmt("dd/mm/yyyy", JAN_15_2024), "15/01/2024");
        assert_eq!(fmt("yyyy-mm-dd", JAN_15_2024), "2024-01-15");
        assert_eq!(fmt("d-mmm-yy", JAN_15_2024), "15-Jan-24");
        assert_eq!(fmt("mmmm d, yyyy", JAN_15_2024), "January 15, 2024");
        assert_eq!(fmt("dddd", JAN_15_2024), "Monday");
        assert_eq!(fmt(builtin_format(14).unwrap(), JAN_15_2024), "1/15/24");
    }

    #[test]
    fn test_times() {
        assert_eq!(fmt("h:mm AM/PM", 0.75), "6:00 PM");
        assert_eq!(fmt("h:mm a/p", 0.25), "6:00 a");
        assert_eq!(fmt("hh:mm:ss", 0.5 + 1.0 / 86_400.0), "12:00:01");
        assert_eq!(
            fmt("yyyy-mm-dd hh:mm", JAN_15_2024 + 0.5),
            "2024-01-15 12:00"
        );
        assert_eq!(fmt("mm:ss.0", 61.5 / 86_400.0), "01:01.5");
    }

    #[test]
    fn test_elapsed_time() {
        assert_eq!(fmt("[h]:mm", 1.5), "36:00");
        assert_eq!(fmt("[mm]:ss", 0.1), "144:00");
    }

    #[test]
    fn test_early_serials() {
        assert_eq!(fmt("yyyy-mm-dd", 1.0), "1900-01-01");
        assert_eq!(fmt("yyyy-mm-dd", 61.0), "1900-03-01");
    }

    #[test]
    fn test_date1904() {
        let options = FormatOptions { date1904: true };
        assert_eq!(format_number("yyyy-mm-dd", 0.0, options), "1904-01-01");
        assert_eq!(
            format_number("yyyy-mm-dd", JAN_15_2024 - 1462.0, options),
            "2024-01-15"
        );
    }

    #[test]
    fn test_negative_date_falls_back() {
        assert_eq!(fmt("yyyy-mm-dd", -1.0), "-1");
    }

    // ========================================================================
    // text
    // ========================================================================

    #[test]
    fn test_text_sections() {
        assert_eq!(format_text("@", "Ann"), "Ann");
        assert_eq!(format_text(r#""Name: "@"#, "Ann"), "Name: Ann");
        assert_eq!(format_text(r#"0;-0;0;"["@"]""#, "Ann"), "[Ann]");
        assert_eq!(format_text("0.00", "Ann"), "Ann");
        assert_eq!(format_text("0;-0", "Ann"), "Ann");
    }
}
