fn main() {
    let code = hdbg_cli::run_cli(std::env::args().collect());
    std::process::exit(code);
}
