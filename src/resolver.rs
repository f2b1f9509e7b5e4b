use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::process::Command;
use tracing::debug;

pub const MAC_SENTINEL: &str = "MAC Address Not Found";

/// Capability interface for mapping a peer IP to a hardware address.
///
/// Implementations are best-effort: `None` means unresolved, and callers
/// substitute [`MAC_SENTINEL`]. Resolution must never abort request handling.
#[async_trait]
pub trait HardwareResolver: Send + Sync {
    async fn resolve(&self, ip: IpAddr) -> Option<String>;
}

/// Resolves against the kernel's address-resolution cache by shelling out to
/// `arp -n`. Only succeeds for peers on the same local segment.
pub struct ArpCacheResolver;

#[async_trait]
impl HardwareResolver for ArpCacheResolver {
    async fn resolve(&self, ip: IpAddr) -> Option<String> {
        let output = match Command::new("arp").arg("-n").arg(ip.to_string()).output().await {
            Ok(output) => output,
            Err(e) => {
                debug!(%ip, error = %e, "arp invocation failed");
                return None;
            }
        };
        if !output.status.success() {
            debug!(%ip, status = ?output.status.code(), "arp exited non-zero");
            return None;
        }
        parse_arp_output(&String::from_utf8_lossy(&output.stdout), ip)
    }
}

/// Scan `arp -n` output for the line naming `ip`; the hardware address is the
/// third column. Lines whose third column is not an address (the cache-miss
/// `-- no entry` form) resolve to `None`.
fn parse_arp_output(stdout: &str, ip: IpAddr) -> Option<String> {
    let needle = ip.to_string();
    stdout
        .lines()
        .find(|line| line.contains(&needle))
        .and_then(|line| line.split_whitespace().nth(2))
        .filter(|token| token.contains(':'))
        .map(|mac| mac.to_uppercase())
}

/// Fixed-table resolver for tests and offline runs.
#[derive(Debug, Default)]
pub struct StaticResolver {
    entries: HashMap<IpAddr, String>,
}

impl StaticResolver {
    pub fn with_entry(mut self, ip: IpAddr, mac: impl Into<String>) -> Self {
        self.entries.insert(ip, mac.into());
        self
    }
}

#[async_trait]
impl HardwareResolver for StaticResolver {
    async fn resolve(&self, ip: IpAddr) -> Option<String> {
        self.entries.get(&ip).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARP_HIT: &str = "\
Address                  HWtype  HWaddress           Flags Mask            Iface
192.168.88.17            ether   aa:bb:cc:dd:ee:ff   C                     eth0
";

    #[test]
    fn test_parse_arp_hit_uppercases_address() {
        let ip: IpAddr = "192.168.88.17".parse().unwrap();
        assert_eq!(
            parse_arp_output(ARP_HIT, ip),
            Some("AA:BB:CC:DD:EE:FF".to_string())
        );
    }

    #[test]
    fn test_parse_arp_ignores_other_hosts() {
        let ip: IpAddr = "192.168.88.99".parse().unwrap();
        assert_eq!(parse_arp_output(ARP_HIT, ip), None);
    }

    #[test]
    fn test_parse_arp_cache_miss_line() {
        let ip: IpAddr = "10.0.0.5".parse().unwrap();
        let miss = "10.0.0.5 (10.0.0.5) -- no entry\n";
        assert_eq!(parse_arp_output(miss, ip), None);
    }

    #[test]
    fn test_parse_arp_empty_output() {
        let ip: IpAddr = "10.0.0.5".parse().unwrap();
        assert_eq!(parse_arp_output("", ip), None);
    }

    #[tokio::test]
    async fn test_static_resolver_lookup() {
        let ip: IpAddr = "192.168.88.17".parse().unwrap();
        let resolver = StaticResolver::default().with_entry(ip, "AA:BB:CC:DD:EE:FF");
        assert_eq!(
            resolver.resolve(ip).await,
            Some("AA:BB:CC:DD:EE:FF".to_string())
        );
        assert_eq!(resolver.resolve("10.0.0.1".parse().unwrap()).await, None);
    }
}
