//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = sunseat_cli::run() {
        eprintln!("sunseat: {err}");
        std::process::exit(1);
    }
}
