fn main() {
    if let Err(err) = aarogya_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
