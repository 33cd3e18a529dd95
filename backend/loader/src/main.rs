use clap::Parser;
use loader::models::Kind;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    kind: Kind,

    /// File path or http(s) URL of a JSON array
    source: String,

    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite://foodgram.sqlite?mode=rwc"
    )]
    database_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    loader::run(args.kind, &args.source, &args.database_url).await
}
