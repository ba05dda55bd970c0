use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    println!("{} {}", Icons::MAG, text.style(theme().header.clone()));
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn dim(text: &str) -> String {
    text.style(theme().dim.clone()).to_string()
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

/// `path:line:column` in the location style
pub fn location(path: &str, line: usize, column: usize) -> String {
    format!("{}:{}:{}", path, line, column)
        .style(theme().location.clone())
        .to_string()
}

/// One identifier occurrence, e.g. `src/a.js:3:5  decl  foo`
pub fn occurrence(location: &str, is_decl: bool, text: &str) {
    let (label, style) = if is_decl {
        ("decl", theme().decl.clone())
    } else {
        ("ref ", theme().reference.clone())
    };
    println!("{}  {}  {}", location, label.style(style), text);
}
