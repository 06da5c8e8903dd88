use std::collections::BTreeMap;

/// Parse flat `key=value` / `key: value` properties text. Lines starting with
/// `#` or `!` are comments; a trailing `\` continues the value on the next line.
pub fn parse_properties(text: &str) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    let mut lines = text.lines();

    while let Some(raw) = lines.next() {
        let line = raw.trim_start();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }

        let mut logical = line.to_string();
        while logical.ends_with('\\') {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        let (key, value) = match logical.find(|c| c == '=' || c == ':') {
            Some(idx) => (&logical[..idx], &logical[idx + 1..]),
            None => (logical.as_str(), ""),
        };

        props.insert(key.trim().to_string(), value.trim().to_string());
    }

    props
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_both_separators_and_skips_comments() {
        let props = parse_properties(
            "# provider metadata\n! legacy comment\n\nprovider-name = demo.Provider\nmode: fast\nflag\n",
        );
        assert_eq!(props.get("provider-name").map(String::as_str), Some("demo.Provider"));
        assert_eq!(props.get("mode").map(String::as_str), Some("fast"));
        assert_eq!(props.get("flag").map(String::as_str), Some(""));
        assert_eq!(props.len(), 3);
    }

    #[test]
    fn joins_continued_lines() {
        let props = parse_properties("provider-name=demo.\\\n    Provider\n");
        assert_eq!(props["provider-name"], "demo.Provider");
    }
}
