//! Struct-tag lookup.
//!
//! Tags follow the language's `reflect.StructTag` conventions: a
//! space-separated sequence of `key:"value"` pairs, where the value is a
//! quoted string. Unconventional tags are not an error — lookup simply
//! finds nothing in them.

/// Look up `key` in a raw tag string.
///
/// Returns `None` when the key is absent or the tag does not follow the
/// conventional format.
pub fn lookup(tag: &str, key: &str) -> Option<String> {
    let mut rest = tag;

    loop {
        // Skip leading spaces between pairs.
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        // Scan the key: up to the first ':', stopping at anything that
        // cannot appear in a conventional key.
        let colon = rest.find(':')?;
        let (k, after) = rest.split_at(colon);
        if k.is_empty() || k.contains(' ') || k.contains('"') {
            return None;
        }
        let after = &after[1..];
        if !after.starts_with('"') {
            return None;
        }

        // Scan the quoted value, honoring backslash escapes.
        let mut end = None;
        let bytes = after.as_bytes();
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'"' => {
                    end = Some(i);
                    break;
                }
                _ => i += 1,
            }
        }
        let end = end?;
        let value = &after[1..end];

        if k == key {
            return Some(unescape(value));
        }
        rest = &after[end + 1..];
    }
}

/// Resolve the escapes lookup can encounter inside a tag value.
fn unescape(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_pair() {
        assert_eq!(
            lookup(r#"env:"APP_NAME""#, "env").as_deref(),
            Some("APP_NAME")
        );
    }

    #[test]
    fn test_missing_key() {
        assert_eq!(lookup(r#"env:"APP_NAME""#, "json"), None);
        assert_eq!(lookup("", "env"), None);
    }

    #[test]
    fn test_multiple_pairs() {
        let tag = r#"json:"name,omitempty" env:"APP_NAME" yaml:"name""#;
        assert_eq!(lookup(tag, "json").as_deref(), Some("name,omitempty"));
        assert_eq!(lookup(tag, "env").as_deref(), Some("APP_NAME"));
        assert_eq!(lookup(tag, "yaml").as_deref(), Some("name"));
    }

    #[test]
    fn test_empty_value() {
        assert_eq!(lookup(r#"json:"""#, "json").as_deref(), Some(""));
    }

    #[test]
    fn test_escaped_quote_in_value() {
        assert_eq!(
            lookup(r#"doc:"say \"hi\"""#, "doc").as_deref(),
            Some(r#"say "hi""#)
        );
    }

    #[test]
    fn test_malformed_tag_finds_nothing() {
        assert_eq!(lookup("not a tag", "env"), None);
        assert_eq!(lookup("key:unquoted", "key"), None);
    }
}
