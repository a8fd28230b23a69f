use std::ffi::OsString;

fn main() {
    let mut args: Vec<OsString> = std::env::args_os().collect();
    if args.is_empty() {
        args.push(OsString::from("pressure-convert"));
    }
    args.insert(1, OsString::from("convert"));
    if let Err(err) = pressure_converter::cli::run(args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
