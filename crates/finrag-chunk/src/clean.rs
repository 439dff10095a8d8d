/// Normalize raw extracted text before chunking: drop NUL bytes, collapse
/// whitespace runs to a single space, trim the ends.
pub fn clean_text(text: &str) -> String {
    let without_nul: String = text.chars().filter(|c| *c != '\0').collect();
    let mut out = String::with_capacity(without_nul.len());
    for word in without_nul.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
