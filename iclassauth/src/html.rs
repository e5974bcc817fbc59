//! Hidden-form-field extraction from server-rendered HTML.
//!
//! The SSO pages are small and machine-generated, so a tag scanner is enough:
//! find `<input>` tags, read their attributes, return the `value` of the one
//! with the requested `name`.

use std::sync::LazyLock;

use regex::Regex;

static INPUT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<input\b[^>]*>").expect("INPUT_TAG is a valid regex"));

static FORM_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<form\b[^>]*>").expect("FORM_OPEN is a valid regex"));

static FORM_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</form\s*>").expect("FORM_CLOSE is a valid regex"));

static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("ATTRIBUTE is a valid regex")
});

/// Value of the first `<input>` in `document` whose `name` is `name`.
///
/// Returns `None` when no such input exists or it has no `value` attribute.
/// An explicitly empty value is returned as `Some("")`.
pub fn hidden_field(document: &str, name: &str) -> Option<String> {
    INPUT_TAG
        .find_iter(document)
        .find(|tag| attribute(tag.as_str(), "name").as_deref() == Some(name))
        .and_then(|tag| attribute(tag.as_str(), "value"))
}

/// Inner markup of the `<form>` whose `id` is `id`.
///
/// An unterminated form runs to the end of the document.
pub fn form_by_id<'a>(document: &'a str, id: &str) -> Option<&'a str> {
    let open = FORM_OPEN
        .find_iter(document)
        .find(|tag| attribute(tag.as_str(), "id").as_deref() == Some(id))?;
    let rest = &document[open.end()..];
    let end = FORM_CLOSE.find(rest).map_or(rest.len(), |close| close.start());
    Some(&rest[..end])
}

/// Decoded value of attribute `name` inside a single tag.
fn attribute(tag: &str, name: &str) -> Option<String> {
    // Skip the tag name so `<input` is never mistaken for an attribute.
    let body = tag.find(char::is_whitespace).map_or("", |i| &tag[i..]);
    ATTRIBUTE.captures_iter(body).find_map(|caps| {
        if !caps[1].eq_ignore_ascii_case(name) {
            return None;
        }
        let raw = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map_or("", |m| m.as_str());
        Some(decode_entities(raw))
    })
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#61;", "=")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOGIN_PAGE: &str = r#"
        <html><body>
        <form id="fm1" action="/login" method="post">
          <input id="username" name="username" type="text" value=""/>
          <input type="hidden" name="execution" value="e1s1-abc+/=="/>
          <input type="hidden" name="_eventId" value="submit"/>
        </form>
        </body></html>"#;

    #[test]
    fn finds_hidden_execution() {
        assert_eq!(hidden_field(LOGIN_PAGE, "execution").as_deref(), Some("e1s1-abc+/=="));
        assert_eq!(hidden_field(LOGIN_PAGE, "_eventId").as_deref(), Some("submit"));
    }

    #[test]
    fn missing_field_is_none() {
        assert_eq!(hidden_field(LOGIN_PAGE, "lt"), None);
        assert_eq!(hidden_field("<html></html>", "execution"), None);
    }

    #[test]
    fn empty_value_is_some_empty() {
        assert_eq!(hidden_field(LOGIN_PAGE, "username").as_deref(), Some(""));
    }

    #[test]
    fn attribute_order_and_quoting_vary() {
        let doc = r#"<INPUT VALUE='tok&amp;1' TYPE=hidden NAME=execution>"#;
        assert_eq!(hidden_field(doc, "execution").as_deref(), Some("tok&1"));
    }

    #[test]
    fn name_prefix_does_not_match() {
        let doc = r#"<input name="execution_old" value="stale"><input name="execution" value="fresh">"#;
        assert_eq!(hidden_field(doc, "execution").as_deref(), Some("fresh"));
    }

    #[test]
    fn form_scope_isolates_inputs() {
        let doc = r#"
            <form id="fm1"><input name="execution" value="login-token"></form>
            <form id="continueForm" method="post">
              <input name="execution" value="continue-token">
              <input name="_eventId" value="ignoreAndContinue">
            </form>"#;
        let form = form_by_id(doc, "continueForm").unwrap();
        assert_eq!(hidden_field(form, "execution").as_deref(), Some("continue-token"));
        assert!(!form.contains("login-token"));
        assert!(form_by_id(doc, "missing").is_none());
    }

    #[test]
    fn unterminated_form_runs_to_end() {
        let doc = r#"<form id="continueForm"><input name="execution" value="x">"#;
        let form = form_by_id(doc, "continueForm").unwrap();
        assert_eq!(hidden_field(form, "execution").as_deref(), Some("x"));
    }
}
