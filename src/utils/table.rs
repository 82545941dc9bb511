// Minimal RFC 4180 codec for the hand-edited mapping table
//
// Fields may be quoted; quoted fields can hold commas, newlines and doubled
// quotes. Both LF and CRLF line endings are accepted, and a leading UTF-8 BOM
// (spreadsheet exports) is skipped.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("unterminated quoted field starting on line {0}")]
    UnterminatedQuote(usize),
    #[error("unexpected character after closing quote on line {0}")]
    TrailingAfterQuote(usize),
}

/// Parse CSV text into rows of fields. Blank lines are skipped.
pub fn parse_rows(input: &str) -> Result<Vec<Vec<String>>, TableError> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;
    let mut row_has_content = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if field.is_empty() => {
                let quote_line = line;
                row_has_content = true;
                loop {
                    match chars.next() {
                        Some('"') => {
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                field.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(ch) => {
                            if ch == '\n' {
                                line += 1;
                            }
                            field.push(ch);
                        }
                        None => return Err(TableError::UnterminatedQuote(quote_line)),
                    }
                }
                match chars.peek() {
                    None | Some(',') | Some('\n') | Some('\r') => {}
                    Some(_) => return Err(TableError::TrailingAfterQuote(line)),
                }
            }
            ',' => {
                row.push(std::mem::take(&mut field));
                row_has_content = true;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                if row_has_content || !field.is_empty() {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                row_has_content = false;
                line += 1;
            }
            other => {
                field.push(other);
                row_has_content = true;
            }
        }
    }

    if row_has_content || !field.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

/// Encode one field, quoting only when needed
pub fn encode_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Encode a row terminated by a newline
pub fn encode_row<S: AsRef<str>>(fields: &[S]) -> String {
    let encoded: Vec<String> = fields.iter().map(|f| encode_field(f.as_ref())).collect();
    let mut line = encoded.join(",");
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_rows() {
        let rows = parse_rows("a,b,c\n1,2,3\n").unwrap();
        assert_eq!(rows, vec![vec!["a", "b", "c"], vec!["1", "2", "3"]]);
    }

    #[test]
    fn test_parse_quoted_fields() {
        let rows = parse_rows("id,title\n1,\"Logo, v2 \"\"final\"\"\"\n").unwrap();
        assert_eq!(rows[1], vec!["1", "Logo, v2 \"final\""]);
    }

    #[test]
    fn test_parse_multiline_quoted_field() {
        let rows = parse_rows("id,notes\r\n1,\"line one\nline two\"\r\n2,x\r\n").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][1], "line one\nline two");
        assert_eq!(rows[2], vec!["2", "x"]);
    }

    #[test]
    fn test_parse_keeps_empty_trailing_fields() {
        let rows = parse_rows("1,,pending,\n").unwrap();
        assert_eq!(rows[0], vec!["1", "", "pending", ""]);
    }

    #[test]
    fn test_parse_skips_bom_and_blank_lines() {
        let rows = parse_rows("\u{feff}a,b\n\n1,2\n").unwrap();
        assert_eq!(rows, vec![vec!["a", "b"], vec!["1", "2"]]);
    }

    #[test]
    fn test_parse_unterminated_quote() {
        assert_eq!(parse_rows("1,\"open\n"), Err(TableError::UnterminatedQuote(1)));
    }

    #[test]
    fn test_encode_row_quotes_when_needed() {
        assert_eq!(encode_row(&["1", "a,b", "say \"hi\""]), "1,\"a,b\",\"say \"\"hi\"\"\"\n");
        assert_eq!(encode_row(&["plain", ""]), "plain,\n");
    }
}
