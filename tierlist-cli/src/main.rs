use tierlist::*;

use config::Config;
use console::Console;
use db::{init_db_pool, DBWrapper};
use dotenv::dotenv;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;
use ui::App;

fn init_logging(config: &Config) {
    let default_filter = if config.debug { "tierlist=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.debug)
        .compact()
        .init();
}

fn main() {
    dotenv().ok();
    let config = Config::from_env();
    init_logging(&config);

    let store = match init_db_pool(&config.database_url)
        .map_err(tierlist::error::Error::from)
        .and_then(|pool| DBWrapper::from_pg_pool(&pool))
    {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "couldn't connect to the database");
            if config.debug {
                eprintln!("Couldn't connect to the database: {}", e);
            } else {
                eprintln!("{}", ui::GENERIC_ERROR);
            }
            process::exit(1);
        }
    };
    println!("Successfully connected.");

    let mut app = App::new(store, Console::stdio(), config);
    if let Err(e) = app.run() {
        eprintln!("{}", e);
        process::exit(1);
    }
}
