use clap::Parser;
use dicomweb_dataplane::cli::Cli;
use dicomweb_dataplane::{logging, Runtime};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = cli.load_config()?;
    logging::init_logging(&config.logging)?;

    let runtime = Runtime::new(config)?;
    for line in cli.cmd.execute(&runtime).await? {
        println!("{}", line);
    }
    Ok(())
}
