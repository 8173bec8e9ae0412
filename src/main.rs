mod app;
mod chat;
mod loader;
mod models;
mod portfolio;
mod utils;

use std::io;

use clap::Parser;
use colored::Colorize;
use eyre::{Result, bail};
use log::info;

use crate::app::App;
use crate::chat::chain::Chain;
use crate::chat::client::GroqClient;
use crate::loader::WebPageLoader;
use crate::portfolio::Portfolio;
use crate::utils::cli::Args;
use crate::utils::config::{Config, Credentials, config};
use crate::utils::log::Logger;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    Logger::init(args.verbosity);

    info!(
        "starting cold-mail {}",
        format!("v{}", env!("CARGO_PKG_VERSION")).magenta()
    );

    let credentials = Credentials::from_env()?;
    let config: Config = config(args.config)?;

    let portfolio = Portfolio::new(&config.portfolio)?;
    info!("portfolio index holds {} entries", portfolio.count());

    let chain = Chain::new(GroqClient::new(credentials, &config.llm));
    let loader = WebPageLoader::new(&config.scraper);
    let mut app = App::new(loader, chain, portfolio);

    let mut stdout = io::stdout();
    match args.url {
        Some(url) => {
            if !app.handle(&url, &mut stdout).await? {
                bail!("request for {} failed", url);
            }
        }
        None => {
            app.run_session(
                io::stdin().lock(),
                &mut stdout,
                &config.app.title,
                &config.app.default_url,
            )
            .await?
        }
    }

    Ok(())
}
