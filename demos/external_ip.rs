use simplelog::{Config as LogConfig, LevelFilter, SimpleLogger};

use wanip::SearchOptions;

fn main() {
    let _ = SimpleLogger::init(LevelFilter::Debug, LogConfig::default());

    match wanip::external_ip(SearchOptions::default()) {
        Ok(ip) => println!("External IP address: {}", ip),
        Err(err) => {
            println!("Error: {}", err);
            std::process::exit(1);
        }
    }
}
