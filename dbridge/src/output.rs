use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

use console::style;

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn brand_accent<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).cyan()
}

pub fn brand_muted<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).dim()
}

pub fn brand_success<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).green()
}

pub fn brand_error<D: Display>(value: D) -> console::StyledObject<D> {
    style(value).red()
}

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Status line while connecting
pub fn step(message: &str) {
    println!("{} {}", brand_accent("•").bold(), message);
}

pub fn success(message: &str) {
    println!("{} {}", brand_success("✓").bold(), message);
}

pub fn error_stderr(message: &str) {
    eprintln!("{} {}", brand_error("✗").bold(), message);
}

/// Relayed child output, already carrying its `< ` prefix
pub fn child_line(line: &str) {
    println!("{}", brand_muted(line));
}
