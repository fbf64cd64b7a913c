fn main() -> anyhow::Result<()> {
    let command_line_interface = shapecast::cli::CommandLineInterface::load();
    command_line_interface.run()
}
