fn main() {
    if let Err(err) = polymind::cli::main() {
        eprintln!("❌ Error: {err}");
        std::process::exit(1);
    }
}
