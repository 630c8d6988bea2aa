//! Routes command - dumps the seeded route table

use clap::Args;

use crate::infrastructure::route::default_routes;

#[derive(Args, Debug)]
pub struct RoutesArgs {
    /// Emit a single line instead of indented JSON
    #[arg(long)]
    pub compact: bool,
}

pub async fn run(args: RoutesArgs) -> anyhow::Result<()> {
    let routes = default_routes();

    let output = if args.compact {
        serde_json::to_string(&routes)?
    } else {
        serde_json::to_string_pretty(&routes)?
    };

    println!("{}", output);
    Ok(())
}
