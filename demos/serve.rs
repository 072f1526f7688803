use std::sync::Arc;

use libdnsr::dns_parser::{Class, RRData, ResourceRecord};
use libdnsr::{Config, Server, StaticZone};

pub fn main() {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters("libdnsr=debug");
    builder.init();

    // config file path as the first argument, defaults otherwise
    let config = match std::env::args().nth(1) {
        Some(path) => Config::from_file(path).unwrap(),
        None => Config {
            port: 5353,
            ..Config::default()
        },
    };

    let zone = StaticZone::new(vec![ResourceRecord::new(
        "router.home".parse().unwrap(),
        Class::IN,
        3600,
        RRData::A("192.168.1.1".parse().unwrap()),
    )]);

    let server = Server::with_zones(config, Arc::new(zone)).unwrap();
    println!("listening on {}", server.local_addr());

    loop {
        ::std::thread::sleep(::std::time::Duration::from_secs(10));
    }
}
