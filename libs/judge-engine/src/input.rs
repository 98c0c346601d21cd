/// Derive process arguments from a test case's raw input string.
///
/// If the input contains a comma it is split on commas, otherwise on
/// whitespace; pieces are trimmed and empty ones dropped. A single argument
/// that legitimately contains a comma is therefore split; callers depend on
/// this exact behavior.
pub fn tokenize_input(input: Option<&str>) -> Vec<String> {
    let input = match input {
        Some(input) => input,
        None => return Vec::new(),
    };

    if input.contains(',') {
        input
            .split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(String::from)
            .collect()
    } else {
        input.split_whitespace().map(String::from).collect()
    }
}
