mod platform;

fn main() {
    if let Err(error) = platform::run(std::env::args_os()) {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}
