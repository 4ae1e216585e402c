//! Commit message templating.
//!
//! Placeholders are `{{name}}` where `name` is one or more word characters
//! (ASCII alphanumerics or `_`). Known names are substituted; unknown ones
//! are left exactly as written, braces included. Substituted values are not
//! scanned again, and there is no escape for a literal `{{name}}`.

use std::collections::HashMap;

/// Substitute `{{key}}` placeholders in `template` with values from `params`.
pub fn commit_message(template: &str, params: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        match placeholder_key(after_open) {
            Some(key) => {
                let span_len = key.len() + 4;
                match params.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + span_len]),
                }
                rest = &rest[start + span_len..];
            }
            None => {
                // Not a placeholder; emit one brace and rescan from the next,
                // so `{{{version}}` still finds `{{version}}`.
                out.push('{');
                rest = &rest[start + 1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// The key of a placeholder whose opening braces precede `s`, if `s` starts
/// with word characters followed by `}}`.
fn placeholder_key(s: &str) -> Option<&str> {
    let end = s
        .find(|c: char| !is_word_char(c))
        .unwrap_or(s.len());
    if end == 0 || !s[end..].starts_with("}}") {
        return None;
    }
    Some(&s[..end])
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params<'a>(pairs: &[(&'a str, &'a str)]) -> HashMap<&'a str, &'a str> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn substitutes_known_and_keeps_unknown() {
        let out = commit_message(
            "Release {{version}} for {{repo}} by {{unknown}}",
            &params(&[("version", "1.0.0"), ("repo", "demo")]),
        );
        assert_eq!(out, "Release 1.0.0 for demo by {{unknown}}");
    }

    #[test]
    fn substitutes_every_occurrence() {
        let out = commit_message("{{v}} and {{v}}", &params(&[("v", "x")]));
        assert_eq!(out, "x and x");
    }

    #[test]
    fn keys_are_case_sensitive() {
        let out = commit_message("{{Version}}", &params(&[("version", "1.0.0")]));
        assert_eq!(out, "{{Version}}");
    }

    #[test]
    fn values_are_not_rescanned() {
        let out = commit_message(
            "{{a}}",
            &params(&[("a", "{{b}}"), ("b", "should not appear")]),
        );
        assert_eq!(out, "{{b}}");
    }

    #[test]
    fn non_word_contents_are_left_alone() {
        let template = "{{ version }} {{ver-sion}} {{}} {{version";
        let out = commit_message(template, &params(&[("version", "1.0.0")]));
        assert_eq!(out, template);
    }

    #[test]
    fn extra_leading_brace_is_preserved() {
        let out = commit_message("{{{version}}}", &params(&[("version", "1.0.0")]));
        assert_eq!(out, "{1.0.0}");
    }

    #[test]
    fn handles_non_ascii_text() {
        let out = commit_message("版本 {{version}} ✓", &params(&[("version", "2.0")]));
        assert_eq!(out, "版本 2.0 ✓");
    }

    #[test]
    fn template_without_placeholders_is_unchanged() {
        let out = commit_message("plain message", &params(&[("version", "1")]));
        assert_eq!(out, "plain message");
    }
}
