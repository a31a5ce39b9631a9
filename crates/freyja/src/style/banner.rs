//! ASCII art banner for FreyjaDB.

use super::colors::SemanticStyle;

/// The full FreyjaDB banner.
const BANNER: &str = r"
  ◆ F R E Y J A D B
";

/// Prints the full banner with styling.
pub fn print_banner() {
    println!("{}", BANNER.info());
    println!("  {}", "Bitcask-style log-structured key-value store".muted());
    println!();
}

/// Prints a mini banner for use in subcommands.
pub fn print_mini_banner() {
    print!("{} {}", "◆".info(), "FreyjaDB".header());
}

/// Prints the version banner.
pub fn print_version_banner(version: &str) {
    println!();
    println!(
        "  {} {} {}",
        "◆".info(),
        "FreyjaDB".header(),
        format!("v{version}").muted()
    );
    println!("  {}", "Bitcask-style log-structured key-value store".muted());
    println!();
}
