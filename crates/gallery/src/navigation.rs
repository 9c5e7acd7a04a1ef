//! Circular index arithmetic over the active photo sequence.

/// Next index, wrapping at the end. No-op when the sequence is empty.
pub fn next_index(index: usize, len: usize) -> usize {
    if len == 0 {
        return index;
    }
    (index + 1) % len
}

/// Previous index, wrapping at the start. No-op when the sequence is empty.
pub fn previous_index(index: usize, len: usize) -> usize {
    if len == 0 {
        return index;
    }
    (index + len - 1) % len
}
