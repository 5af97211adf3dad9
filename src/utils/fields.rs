//! Field quoting for the manifest's comma-separated line format.
//!
//! Quoting follows RFC 4180: a value containing a comma or a double quote is
//! wrapped in double quotes with internal quotes doubled. Independently of
//! that, every literal `%` is doubled so the rendered text survives being
//! re-emitted through printf-style formatters. The Scanner and the Manifest
//! Store both go through [`escape_field`], so a rendered line is a pure
//! function of its four raw values.

/// Field separator of the table.
pub const SEPARATOR: char = ',';

/// Quote character of the table.
pub const QUOTE: char = '"';

/// Escapes one raw value for the table.
///
/// # Examples
///
/// ```
/// use dirsum::utils::fields::escape_field;
///
/// assert_eq!(escape_field("plain.txt"), "plain.txt");
/// assert_eq!(escape_field("a,b"), "\"a,b\"");
/// assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
/// assert_eq!(escape_field("100%"), "100%%");
/// ```
#[must_use]
pub fn escape_field(raw: &str) -> String {
    let doubled = raw.replace('%', "%%");
    if doubled.contains(SEPARATOR) || doubled.contains(QUOTE) {
        format!("\"{}\"", doubled.replace('"', "\"\""))
    } else {
        doubled
    }
}

/// Reverses [`escape_field`] for a single value.
#[must_use]
pub fn unescape_field(text: &str) -> String {
    let unquoted = if text.len() >= 2 && text.starts_with(QUOTE) && text.ends_with(QUOTE) {
        text[1..text.len() - 1].replace("\"\"", "\"")
    } else {
        text.to_string()
    };
    unquoted.replace("%%", "%")
}

/// Renders raw values as one table line (no trailing newline).
#[must_use]
pub fn render_record(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Splits a rendered line back into its raw, unescaped values.
///
/// # Errors
///
/// Returns a short reason when the quoting is malformed.
pub fn split_record(line: &str) -> Result<Vec<String>, &'static str> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();

    'fields: loop {
        let mut field = String::new();

        if chars.peek() == Some(&QUOTE) {
            chars.next();
            loop {
                match chars.next() {
                    Some(QUOTE) if chars.peek() == Some(&QUOTE) => {
                        chars.next();
                        field.push(QUOTE);
                    }
                    Some(QUOTE) => break,
                    Some(c) => field.push(c),
                    None => return Err("unterminated quoted field"),
                }
            }
            match chars.next() {
                Some(SEPARATOR) => {
                    fields.push(field.replace("%%", "%"));
                    continue 'fields;
                }
                None => {
                    fields.push(field.replace("%%", "%"));
                    return Ok(fields);
                }
                Some(_) => return Err("unexpected character after closing quote"),
            }
        }

        loop {
            match chars.next() {
                Some(SEPARATOR) => {
                    fields.push(field.replace("%%", "%"));
                    continue 'fields;
                }
                Some(QUOTE) => return Err("quote inside unquoted field"),
                Some(c) => field.push(c),
                None => {
                    fields.push(field.replace("%%", "%"));
                    return Ok(fields);
                }
            }
        }
    }
}
