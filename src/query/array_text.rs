/// Decode the text form of a Postgres array column (`{a,b,c}`) into its elements.
///
/// Outer braces are optional since some drivers hand the value over already
/// stripped. Elements are split on commas outside double quotes; a quoted element
/// (Postgres quotes elements holding commas, spaces or quotes) is unwrapped with
/// its `\"` and `\\` escapes resolved. Any brace left outside quotes is dropped.
/// Malformed input (an unterminated quote) degrades to a plain comma split
/// instead of failing.
pub fn decode(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed.strip_prefix('{').unwrap_or(trimmed);
    let inner = inner.strip_suffix('}').unwrap_or(inner);

    if inner.is_empty() {
        return Vec::new();
    }

    split_quoted(inner).unwrap_or_else(|| {
        inner
            .split(',')
            .map(|element| {
                let cleaned: String = element.chars().filter(|c| *c != '{' && *c != '}').collect();
                unquote(&cleaned)
            })
            .collect()
    })
}

/// Same as [`decode`] for raw column bytes.
pub fn decode_bytes(raw: &[u8]) -> Vec<String> {
    decode(&String::from_utf8_lossy(raw))
}

/// Quote-aware split. `None` when a quote or escape is left open.
fn split_quoted(inner: &str) -> Option<Vec<String>> {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => current.push(chars.next()?),
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => elements.push(std::mem::take(&mut current)),
            '{' | '}' if !in_quotes => {}
            _ => current.push(c),
        }
    }

    if in_quotes {
        return None;
    }
    elements.push(current);
    Some(elements)
}

fn unquote(element: &str) -> String {
    match element
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(quoted) => quoted.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => element.to_string(),
    }
}
