use anyhow::Result;

use match_form::config::{IngestConfig, load_dotenv};
use match_form::fetch;

fn main() -> Result<()> {
    load_dotenv();
    env_logger::init();

    let cfg = IngestConfig::from_env()?;
    let years = fetch::fetch_available_seasons(&cfg.token, &cfg.competition)?;

    println!("Competition: {}", cfg.competition);
    println!("Available start years: {years:?}");
    if let (Some(min), Some(max)) = (years.first(), years.last()) {
        println!("Min: {min} Max: {max}");
    }
    Ok(())
}
