use std::env;

fn main() {
    if let Err(err) = pressure_converter::cli::run(env::args_os()) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
