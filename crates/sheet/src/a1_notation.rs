/// Extract the column key of an A1-style cell reference.
///
/// The key is the leading alphabetic run of the reference: "C7" yields "C",
/// "AB12" yields "AB". A reference without a leading letter yields "".
pub fn column_key(reference: &str) -> &str {
    let end = reference
        .char_indices()
        .find(|(_, c)| !c.is_alphabetic())
        .map_or(reference.len(), |(idx, _)| idx);
    &reference[..end]
}

/// Parse an A1-style reference into 0-based (row, col)
///
/// "C7" yields (6, 2). Absolute markers and ranges are not accepted.
pub fn parse_a1(reference: &str) -> Option<(u32, u32)> {
    let letters = column_key(reference);
    let digits = &reference[letters.len()..];
    if letters.is_empty() || digits.is_empty() {
        return None;
    }

    let col = letters.bytes().try_fold(0u32, |acc, b| {
        let digit = u32::from(b.to_ascii_uppercase().checked_sub(b'A')?) + 1;
        if digit > 26 {
            return None;
        }
        acc.checked_mul(26)?.checked_add(digit)
    })?;
    let row: u32 = digits.parse().ok()?;
    (row > 0).then(|| (row - 1, col - 1))
}

/// Convert 0-based column index to column letters
/// 0=A, 1=B, ... 25=Z, 26=AA, 27=AB, ...
pub fn column_index_to_letters(mut col: usize) -> String {
    let mut result = String::new();
    col += 1; // Convert to 1-based for calculation

    while col > 0 {
        col -= 1;
        result.insert(0, ((col % 26) as u8 + b'A') as char);
        col /= 26;
    }

    result
}

/// Convert (row, col) to A1 notation
/// (0, 0) = "A1", (0, 1) = "B1", etc.
pub fn to_a1_notation(row: usize, col: usize) -> String {
    format!("{}{}", column_index_to_letters(col), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_key() {
        assert_eq!(column_key("C7"), "C");
        assert_eq!(column_key("A1"), "A");
        assert_eq!(column_key("AB12"), "AB");
        assert_eq!(column_key("XFD1048576"), "XFD");
        // Already a bare column
        assert_eq!(column_key("B"), "B");
    }

    #[test]
    fn test_column_key_unparsable() {
        assert_eq!(column_key(""), "");
        assert_eq!(column_key("12"), "");
        assert_eq!(column_key("$A$1"), "");
    }

    #[test]
    fn test_column_index_to_letters() {
        assert_eq!(column_index_to_letters(0), "A");
        assert_eq!(column_index_to_letters(1), "B");
        assert_eq!(column_index_to_letters(25), "Z");
        assert_eq!(column_index_to_letters(26), "AA");
        assert_eq!(column_index_to_letters(27), "AB");
        assert_eq!(column_index_to_letters(51), "AZ");
        assert_eq!(column_index_to_letters(52), "BA");
        assert_eq!(column_index_to_letters(701), "ZZ");
        assert_eq!(column_index_to_letters(702), "AAA");
    }

    #[test]
    fn test_to_a1_notation() {
        assert_eq!(to_a1_notation(0, 0), "A1");
        assert_eq!(to_a1_notation(0, 1), "B1");
        assert_eq!(to_a1_notation(1, 0), "A2");
        assert_eq!(to_a1_notation(99, 25), "Z100");
        assert_eq!(to_a1_notation(0, 26), "AA1");
    }

    #[test]
    fn test_parse_a1() {
        assert_eq!(parse_a1("A1"), Some((0, 0)));
        assert_eq!(parse_a1("C7"), Some((6, 2)));
        assert_eq!(parse_a1("ab12"), Some((11, 27)));
        assert_eq!(parse_a1("XFD1048576"), Some((1_048_575, 16_383)));
        assert_eq!(parse_a1("A0"), None);
        assert_eq!(parse_a1("A"), None);
        assert_eq!(parse_a1("12"), None);
        assert_eq!(parse_a1("$A$1"), None);
        assert_eq!(parse_a1("A1:B2"), None);
    }

    #[test]
    fn test_parse_generated_reference() {
        for (row, col) in [(0, 0), (9, 25), (41, 26), (999, 701)] {
            assert_eq!(
                parse_a1(&to_a1_notation(row, col)),
                Some((row as u32, col as u32))
            );
        }
    }

    #[test]
    fn test_key_of_generated_reference() {
        for col in 0..100 {
            let notation = to_a1_notation(6, col);
            assert_eq!(column_key(&notation), column_index_to_letters(col));
        }
    }
}
