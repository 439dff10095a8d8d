//! Character-window fallback used when no tokenizer is available.

/// Sentence terminators recognized when looking for a cut point. The second
/// character may be a space or newline; cleaned text only carries spaces, but
/// callers may pass uncleaned text directly.
const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Split `text` into overlapping windows of at most `chunk_size` characters,
/// preferring to end each window at a sentence boundary found past the
/// window's midpoint. The midpoint threshold is a heuristic carried over from
/// the original pipeline; chunk sizes near a boundary can be uneven.
pub fn chunk_by_chars(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    if chars.len() <= chunk_size {
        return vec![text.trim().to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;
    while start < chars.len() {
        let mut end = (start + chunk_size).min(chars.len());
        if end < chars.len() {
            if let Some(cut) = sentence_cut(&chars[start..end], chunk_size) {
                end = start + cut;
            }
        }

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim().to_string();
        if !piece.is_empty() {
            chunks.push(piece);
        }

        if end >= chars.len() {
            break;
        }
        // Step back by `overlap` for context, but always make progress even
        // when the sentence cut shortened the window below the overlap.
        start = end.saturating_sub(overlap).max(start + 1);
    }
    chunks
}

/// Rightmost sentence terminator in `window` that lies past the midpoint of
/// `chunk_size`. Returns the cut length (terminator kept, trailing space
/// dropped), or None when no boundary qualifies.
fn sentence_cut(window: &[char], chunk_size: usize) -> Option<usize> {
    let half = chunk_size / 2;
    for i in (0..window.len().saturating_sub(1)).rev() {
        if TERMINATORS.contains(&window[i]) && (window[i + 1] == ' ' || window[i + 1] == '\n') {
            if i > half {
                return Some(i + 1);
            }
            // The rightmost boundary is already before the midpoint; anything
            // further left is too.
            return None;
        }
    }
    None
}
