//! Reference splitting.

use weft_core::split_arg;

/// Split a raw reference into `(locator, sub_tool)`.
///
/// The token `from` separates a sub-tool selector (left, possibly
/// multi-word) from the tool locator (right). Without `from` the whole
/// reference is the locator. The locator is stripped of any trailing
/// argument clause; the splitter never touches the filesystem.
pub fn split_tool_ref(reference: &str) -> (String, String) {
    let fields: Vec<&str> = reference.split_whitespace().collect();

    let (locator, sub_tool) = match fields.iter().position(|field| *field == "from") {
        None => (reference.trim().to_string(), String::new()),
        Some(idx) => (fields[idx + 1..].join(" "), fields[..idx].join(" ")),
    };

    let (locator, _) = split_arg(&locator);
    (locator, sub_tool)
}
