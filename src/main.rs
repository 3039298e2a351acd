fn main() {
    std::process::exit(ssh_key_probe::cli::run());
}
