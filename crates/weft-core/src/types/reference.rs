//! Raw reference string helpers.

/// Split a reference into the part that names a tool and its trailing
/// argument clause.
///
/// The argument clause is introduced by the token `with`; everything after
/// it is passed to the tool at runtime and ignored for resolution:
///
/// ```
/// use weft_core::split_arg;
///
/// assert_eq!(
///     split_arg("./lib.wft with 3 items"),
///     ("./lib.wft".to_string(), "3 items".to_string())
/// );
/// assert_eq!(split_arg("sys.echo"), ("sys.echo".to_string(), String::new()));
/// ```
pub fn split_arg(reference: &str) -> (String, String) {
    let fields: Vec<&str> = reference.split_whitespace().collect();
    match fields.iter().position(|field| *field == "with") {
        Some(idx) => (fields[..idx].join(" "), fields[idx + 1..].join(" ")),
        None => (reference.trim().to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::split_arg;

    #[test]
    fn plain_reference_passes_through() {
        assert_eq!(split_arg("./tool.wft"), ("./tool.wft".into(), "".into()));
    }

    #[test]
    fn argument_clause_is_split_off() {
        assert_eq!(
            split_arg("sys.http.get with https://example.com"),
            ("sys.http.get".into(), "https://example.com".into())
        );
    }

    #[test]
    fn sub_tool_selectors_are_not_arguments() {
        let (name, args) = split_arg("worker from ./lib.wft");
        assert_eq!(name, "worker from ./lib.wft");
        assert_eq!(args, "");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(split_arg("  sys.ls  "), ("sys.ls".into(), "".into()));
    }
}
