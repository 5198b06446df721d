// src/utils/html.rs

/// Cleans instructor-supplied text before it is stored and rendered in dashboards.
///
/// Whitelist-based: safe inline tags (like <b>, <p>) survive, while <script>, <iframe>
/// and event-handler attributes are stripped. Answer options and answer keys are
/// not passed through here since grading compares them verbatim.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
