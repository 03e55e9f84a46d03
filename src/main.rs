fn main() {
    #[cfg(feature = "cli")]
    cea708::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("cea708: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
