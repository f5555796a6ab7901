//! Named-placeholder expansion for path, header, and payload templates.
//!
//! Templates use `{name}` placeholders resolved from the caller's arguments
//! first and the context's static properties second. An unresolved
//! placeholder is a build-time [`ClientError::MalformedRequest`], never a
//! request that goes out half-formed.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::command::Args;
use crate::error::ClientError;

/// How substituted values are escaped when spliced into the template.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Escaping<'a> {
    /// Splice the value verbatim (header values, already-encoded material).
    Verbatim,
    /// Percent-encode the value, leaving the characters in `skip` untouched
    /// (path segments, form-encoded payload values).
    Percent { skip: &'a [char] },
}

/// Expand every `{name}` placeholder in `template`.
///
/// Literal text between placeholders is copied through untouched; only the
/// substituted values are escaped per `escaping`.
pub(crate) fn expand(
    template: &str,
    args: &Args,
    properties: &BTreeMap<String, String>,
    escaping: Escaping<'_>,
) -> Result<String, ClientError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| {
            ClientError::MalformedRequest(format!(
                "unterminated placeholder in template `{template}`"
            ))
        })?;
        let name = &after[..end];
        let value = args
            .get(name)
            .or_else(|| properties.get(name).cloned())
            .ok_or_else(|| {
                ClientError::MalformedRequest(format!(
                    "no argument bound for placeholder `{{{name}}}` in template `{template}`"
                ))
            })?;
        match escaping {
            Escaping::Verbatim => out.push_str(&value),
            Escaping::Percent { skip } => out.push_str(&encode_with_skips(&value, skip)),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Percent-encode `value`, then restore any characters the operation declared
/// exempt from encoding (e.g. `/` in a path argument that names a nested
/// resource).
fn encode_with_skips(value: &str, skip: &[char]) -> String {
    let encoded: Cow<'_, str> = urlencoding::encode(value);
    let mut encoded = encoded.into_owned();
    for ch in skip {
        let literal = ch.to_string();
        let escaped = urlencoding::encode(&literal);
        if escaped != literal {
            encoded = encoded.replace(escaped.as_ref(), &literal);
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_props() -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    #[test]
    fn expands_path_placeholders() {
        let args = Args::new().set("id", "abc-123");
        let out = expand(
            "/my/machines/{id}",
            &args,
            &no_props(),
            Escaping::Percent { skip: &[] },
        )
        .unwrap();
        assert_eq!(out, "/my/machines/abc-123");
    }

    #[test]
    fn percent_encodes_substituted_values_only() {
        let args = Args::new().set("name", "db primary/1");
        let out = expand(
            "/servers?name={name}",
            &args,
            &no_props(),
            Escaping::Percent { skip: &[] },
        )
        .unwrap();
        assert_eq!(out, "/servers?name=db%20primary%2F1");
    }

    #[test]
    fn skip_set_preserves_declared_characters() {
        let args = Args::new().set("path", "a/b=c");
        let out = expand(
            "/objects/{path}",
            &args,
            &no_props(),
            Escaping::Percent { skip: &['/', '='] },
        )
        .unwrap();
        assert_eq!(out, "/objects/a/b=c");
    }

    #[test]
    fn properties_fill_placeholders_args_win() {
        let mut props = BTreeMap::new();
        props.insert("api_version".to_string(), "~6.5".to_string());
        props.insert("id".to_string(), "from-props".to_string());
        let args = Args::new().set("id", "from-args");
        let out = expand("{api_version}:{id}", &args, &props, Escaping::Verbatim).unwrap();
        assert_eq!(out, "~6.5:from-args");
    }

    #[test]
    fn unresolved_placeholder_is_malformed_request() {
        let err = expand(
            "/my/machines/{id}",
            &Args::new(),
            &no_props(),
            Escaping::Percent { skip: &[] },
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::MalformedRequest(_)));
        assert!(err.to_string().contains("{id}"));
    }

    #[test]
    fn unterminated_placeholder_is_malformed_request() {
        let err = expand("/bad/{id", &Args::new(), &no_props(), Escaping::Verbatim).unwrap_err();
        assert!(matches!(err, ClientError::MalformedRequest(_)));
    }
}
