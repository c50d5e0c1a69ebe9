//! Consumer-side parsing of marker lines

use super::MARKER_PREFIX;

/// A marker line read back from the stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMarker {
    pub kind: String,
    pub labels: Vec<String>,
    pub fields: Vec<(String, String)>,
}

impl ParsedMarker {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Parse one line; returns `None` for lines that are not markers.
///
/// Unknown keys are kept as-is so older consumers keep working when new keys appear.
pub fn parse_marker(line: &str) -> Option<ParsedMarker> {
    let rest = line.trim_end().strip_prefix(MARKER_PREFIX)?;
    let mut chars = rest.chars().peekable();

    let mut kind = String::new();
    let mut labels = Vec::new();
    let mut fields = Vec::new();

    loop {
        while chars.peek() == Some(&' ') {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut word = String::new();
        while let Some(&c) = chars.peek() {
            if c == ' ' || c == '=' {
                break;
            }
            word.push(c);
            chars.next();
        }

        if chars.peek() == Some(&'=') {
            chars.next();
            if chars.next() != Some('"') {
                return None;
            }
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some('"') if chars.peek() == Some(&'"') => {
                        chars.next();
                        value.push('"');
                    }
                    Some('"') => break,
                    Some(c) => value.push(c),
                    None => return None,
                }
            }
            fields.push((word, value));
        } else if kind.is_empty() {
            kind = word;
        } else {
            labels.push(word);
        }
    }

    if kind.is_empty() {
        return None;
    }

    Some(ParsedMarker {
        kind,
        labels,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Marker;

    #[test]
    fn test_parse_success_line() {
        let m = parse_marker(r#"[install] success ref="main" overlay="overlay" duration="0.42""#)
            .unwrap();
        assert_eq!(m.kind, "success");
        assert_eq!(m.get("ref"), Some("main"));
        assert_eq!(m.get("duration"), Some("0.42"));
    }

    #[test]
    fn test_parse_guard_label() {
        let m = parse_marker(r#"[install] guard GitRepoRequired path="/tmp/x""#).unwrap();
        assert_eq!(m.kind, "guard");
        assert!(m.has_label("GitRepoRequired"));
    }

    #[test]
    fn test_parse_tolerates_unknown_keys() {
        let m = parse_marker(r#"[install] temp workspace="/tmp/a" future="x" other="y""#).unwrap();
        assert_eq!(m.get("workspace"), Some("/tmp/a"));
        assert_eq!(m.fields.len(), 3);
    }

    #[test]
    fn test_parse_doubled_quotes() {
        let rendered = Marker::step("x").field("msg", r#"a "b" c"#).render();
        let m = parse_marker(&rendered).unwrap();
        assert_eq!(m.get("msg"), Some(r#"a "b" c"#));
    }

    #[test]
    fn test_parse_value_with_spaces_and_equals() {
        let m = parse_marker(r#"[install] step name="x" cmd="a = b c""#).unwrap();
        assert_eq!(m.get("cmd"), Some("a = b c"));
    }

    #[test]
    fn test_non_marker_lines() {
        assert!(parse_marker("hello world").is_none());
        assert!(parse_marker("[install]").is_none());
        assert!(parse_marker(r#"[install] step name="unterminated"#).is_none());
    }
}
