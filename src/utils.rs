/// Find the largest char boundary in `s` that is <= `max_bytes`.
/// Safe for slicing: `&s[..find_char_boundary(s, max_bytes)]` never panics.
pub fn find_char_boundary(s: &str, max_bytes: usize) -> usize {
    if max_bytes >= s.len() {
        return s.len();
    }
    let mut boundary = max_bytes;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_char_boundary_ascii() {
        let s = "Hello, world!";
        assert_eq!(find_char_boundary(s, 5), 5);
        assert_eq!(find_char_boundary(s, 100), s.len());
        assert_eq!(find_char_boundary(s, 0), 0);
    }

    #[test]
    fn test_find_char_boundary_multibyte() {
        let s = "Héllo wörld"; // é is 2 bytes, ö is 2 bytes
        // 'H' = 1 byte, 'é' = 2 bytes (bytes 1..3)
        assert_eq!(find_char_boundary(s, 2), 1); // mid-'é', snaps back to 1
        assert_eq!(find_char_boundary(s, 3), 3); // after 'é'
    }

    #[test]
    fn test_find_char_boundary_emoji() {
        let s = "Hi 👋 there";
        // 'H'=0, 'i'=1, ' '=2, '👋'=3..7
        assert_eq!(find_char_boundary(s, 4), 3); // mid-emoji, snaps back
        assert_eq!(find_char_boundary(s, 7), 7); // after emoji
    }
}
