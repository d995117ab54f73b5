use std::net::{IpAddr, Ipv4Addr};

const EXPORTER_ADDR: &str = "EXPORTER_ADDR";

const DEFAULT_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0));

/// Address the exposition server binds to, from `EXPORTER_ADDR`
pub fn get_addr() -> IpAddr {
    let addr_from_env = std::env::var(EXPORTER_ADDR);
    addr_from_env.map_or(DEFAULT_ADDR, |res| parse_addr(&res))
}

fn parse_addr(raw: &str) -> IpAddr {
    raw.trim().parse().unwrap_or(DEFAULT_ADDR)
}
