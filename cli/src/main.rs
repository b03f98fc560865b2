mod commands;
mod terminal;

use commands::{CommandLine, regions, scan};
use terminal::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    let bars = logging::init_logging(commands.quiet);

    if commands.list_regions {
        return regions::list(&commands.suffix);
    }

    let cfg = commands.to_config()?;
    scan::scan(&cfg, bars).await
}
