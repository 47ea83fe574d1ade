use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON file holding an array of schools, or `{ "schools": [...] }`
    file: PathBuf,

    #[arg(long, env = "SCHOOLS_URL", default_value = "http://localhost:1111")]
    url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    seed::load_schools(&args.file, &args.url).await?;

    Ok(())
}
