pub fn cmd_version() {
    println!("shotter {}", env!("CARGO_PKG_VERSION"));
    println!("  built:  {}", env!("BUILD_DATE"));
    println!("  commit: {} ({})", env!("GIT_HASH"), env!("GIT_BRANCH"));
}
