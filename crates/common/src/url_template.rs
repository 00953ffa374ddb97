//! `{name}` placeholder substitution for endpoint URL templates.

/// A template referenced a placeholder no value was supplied for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unresolved placeholder {{{name}}} in endpoint template")]
pub struct TemplateError {
    pub name: String,
}

/// Substitute every `{name}` in `template` with the matching percent-encoded
/// value from `params`.
///
/// Braces that do not enclose an identifier (`[A-Za-z0-9_]+`) are copied
/// through untouched.
pub fn expand(template: &str, params: &[(&str, &str)]) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name = after
            .find('}')
            .map(|close| &after[..close])
            .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));

        let Some(name) = name else {
            out.push('{');
            rest = after;
            continue;
        };

        let (_, value) = params
            .iter()
            .find(|(key, _)| *key == name)
            .ok_or_else(|| TemplateError {
                name: name.to_string(),
            })?;
        out.push_str(&urlencoding::encode(value));
        rest = &after[name.len() + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
