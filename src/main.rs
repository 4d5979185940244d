use clap::Parser;
use dotenv::dotenv;
use gratka::{FilterRecord, ScrapingContext};
use log::{LevelFilter, error, info};
use url::Url;

/// Print the gratka.pl listing URL for a region, page and set of filters.
#[derive(Debug, Parser)]
#[command(name = "gratka-url")]
struct Args {
    /// Free-text region hint, e.g. "Nowa Huta". Ignored when a location
    /// filter is given.
    #[arg(short, long, default_value = "")]
    region: String,

    #[arg(short, long, default_value_t = 1)]
    page: u32,

    /// Mapper filter as key=value. Repeat a key to pass a list.
    #[arg(short, long = "filter", value_name = "KEY=VALUE")]
    filters: Vec<String>,

    /// Also download the resulting page (through the cache).
    #[arg(long)]
    fetch: bool,
}

async fn run(args: Args) -> anyhow::Result<()> {
    let filters = FilterRecord::from_args(&args.filters)?;
    let context = ScrapingContext::new()?;
    let url = context
        .build_listing_url(&args.region, args.page, filters)
        .await?;
    println!("{url}");

    if args.fetch {
        let body = context.fetch_page(&Url::parse(&url)?).await?;
        info!("Fetched {} bytes from {url}", body.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}
