// Copyright 2023 Remi Bernotavicius

use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

mod database;
mod error;
mod nutrition;
mod server;
mod store;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
#[command(about = "Tracks ingredients, dishes and meals and sums up their nutrition")]
struct Args {
    /// SQLite database to use. Created if it doesn't exist.
    #[arg(long)]
    db_path: Option<PathBuf>,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

/// This is where the database lives on-disk when no `--db-path` is given. On Linux it should
/// be like: `~/.local/share/feed_me/`
fn data_path() -> Result<PathBuf> {
    let dirs = directories::BaseDirs::new().ok_or("failed to get user home directory")?;
    let path = dirs.data_dir().join("feed_me");
    std::fs::create_dir_all(&path)?;
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()?;

    let args = Args::parse();
    let db_path = match args.db_path {
        Some(path) => path,
        None => data_path()?.join("data.sqlite"),
    };
    let conn = database::establish_connection(db_path)?;
    server::serve(conn, args.port).await?;
    Ok(())
}
