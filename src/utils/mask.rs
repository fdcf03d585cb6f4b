/// Mask a credential for display: first five and last five characters kept
/// when the value is longer than ten, stars otherwise.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[chars.len() - 5..].iter().collect();
        format!("{}{}{}", head, "*".repeat(chars.len() - 10), tail)
    } else {
        "*".repeat(chars.len())
    }
}

/// Short preview of a key id: `first...last`, or `N/A` when too short to preview.
pub fn preview_key_id(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[chars.len() - 5..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "N/A".to_string()
    }
}
