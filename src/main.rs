fn main() {
    if let Err(e) = digit_scan_lib::run() {
        eprintln!("digit-scan: {}", e);
        std::process::exit(1);
    }
}
