//! Wiki-link syntax: the only link form the engine produces or recognises.

/// Wiki link delimiters.
pub struct WikiLink;

impl WikiLink {
    pub const OPEN: &'static str = "[[";
    pub const CLOSE: &'static str = "]]";

    /// Wraps `target` as `[[target]]`.
    pub fn wrap(target: &str) -> String {
        let mut out = String::with_capacity(target.len() + Self::OPEN.len() + Self::CLOSE.len());
        out.push_str(Self::OPEN);
        out.push_str(target);
        out.push_str(Self::CLOSE);
        out
    }

    /// True if text to the right of a match closes a bracket before opening
    /// one, i.e. the match sits inside `[[...]]` (or `[...]`).
    ///
    /// `rest` is the remainder of the line after the match.
    pub fn closes_before_opening(rest: &str) -> bool {
        matches!(rest.find(['[', ']']).map(|i| rest.as_bytes()[i]), Some(b']'))
    }
}
