fn main() -> std::process::ExitCode {
    snapscan::app::startup::startup()
}
