//! Version command implementation

pub fn print() {
    println!("🦀 netdev - namespace-aware interface manager");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!("Edition: Rust 2024");
    println!();
    println!("Features:");
    println!("  • Shared, refcounted namespace contexts");
    println!("  • Scoped namespace switching");
    println!("  • Link state polling");
}
