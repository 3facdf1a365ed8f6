use clap::Parser;

fn main() {
    let cli = quickswitch_core::runtime::Cli::parse();

    if let Err(error) = quickswitch_core::runtime::run(cli) {
        eprintln!("[quickswitch] {error}");
        std::process::exit(1);
    }
}
