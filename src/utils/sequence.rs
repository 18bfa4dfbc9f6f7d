//! Numbered-list printing

use std::fmt::Display;

/// Render `items` as a titled, zero-padded numbered list:
///
/// ```text
/// features (3):
/// 0. age
/// 1. country
/// 2. income
/// ```
///
/// Indices are padded to the number of digits of the item count.
pub fn format_sequence<I>(name: &str, items: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    let items: Vec<String> = items.into_iter().map(|item| item.to_string()).collect();
    let width = items.len().to_string().len();

    let mut out = format!("{} ({}):", name, items.len());
    for (index, item) in items.iter().enumerate() {
        out.push('\n');
        out.push_str(&format!("{:0width$}. {}", index, item, width = width));
    }
    out
}

/// Print [`format_sequence`] to stdout
pub fn print_sequence<I>(name: &str, items: I)
where
    I: IntoIterator,
    I::Item: Display,
{
    println!("{}", format_sequence(name, items));
}
