//! Text helpers shared across the generation pipeline.

/// Lower-case the leading upper-case run of an identifier-like string.
///
/// A leading acronym folds as one unit: `ID` becomes `id` and `URLPath`
/// becomes `urlPath` (the last capital of the run starts the next word,
/// so it stays upper-case). Plain names lower only the first character.
pub(crate) fn lower_first(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut run = 0;
    while run < chars.len() && chars[run].is_uppercase() {
        run += 1;
    }
    if run == 0 {
        return s.to_string();
    }
    if run > 1 && run < chars.len() {
        run -= 1;
    }
    let mut out = String::with_capacity(s.len());
    for (i, c) in chars.into_iter().enumerate() {
        if i < run {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Upper-case the first character of a tag or service name.
pub(crate) fn title_tag(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Convert a separated name (`get_users_id`, `foo-bar`) to lower camel case.
///
/// Splits on `_`, `-`, space, `.` and `/`, capitalizes each part, then
/// lower-cases the leading character.
pub(crate) fn camelize_down(word: &str) -> String {
    let parts: Vec<&str> = word
        .split(['_', '-', ' ', '.', '/'])
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    for part in &parts {
        out.push_str(&title_tag(part));
    }
    lower_first(&out)
}

/// Pick `value` unless it is empty, falling back otherwise.
pub(crate) fn default_string(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
