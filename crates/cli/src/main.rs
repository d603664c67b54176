fn main() -> Result<(), Box<dyn std::error::Error>> {
    xcpilot_cli::run()
}
