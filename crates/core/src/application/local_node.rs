// Local node detection

use tracing::debug;

use crate::domain::NodeRegistry;
use crate::port::HostIdentity;

/// Find the node that stands for the machine we are running on
///
/// A configured `nodename` takes precedence over the host's own names. A
/// candidate matches a node by name or by any of its addresses; host names
/// are also tried in their short form (`web1.example.com` -> `web1`).
pub fn resolve_local_node(
    registry: &NodeRegistry,
    nodename: Option<&str>,
    host: &dyn HostIdentity,
) -> Option<String> {
    let candidates: Vec<String> = match nodename {
        Some(name) => vec![name.to_string()],
        None => {
            let mut names = Vec::new();
            for hostname in host.hostnames() {
                let short = short_name(&hostname).to_string();
                if !names.contains(&hostname) {
                    names.push(hostname);
                }
                if !names.contains(&short) {
                    names.push(short);
                }
            }
            names
        }
    };

    let found = candidates.iter().find_map(|candidate| {
        registry
            .nodes()
            .iter()
            .find(|node| node.name() == candidate || node.has_address(candidate))
            .map(|node| node.name().to_string())
    });

    debug!(candidates = ?candidates, local_node = ?found, "Resolved local node");
    found
}

fn short_name(hostname: &str) -> &str {
    hostname.split('.').next().unwrap_or(hostname)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeSpec;
    use crate::port::host_identity::mocks::StaticHostIdentity;

    fn registry() -> NodeRegistry {
        NodeRegistry::new(
            vec![
                NodeSpec::new("master").with_address("10.0.0.254"),
                NodeSpec::new("web1").with_address("web1.example.com"),
                NodeSpec::new("db1"),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_configured_nodename_wins() {
        let host = StaticHostIdentity::named("web1");
        let local = resolve_local_node(&registry(), Some("master"), &host);
        assert_eq!(local.as_deref(), Some("master"));
    }

    #[test]
    fn test_configured_nodename_matches_address() {
        let host = StaticHostIdentity::anonymous();
        let local = resolve_local_node(&registry(), Some("10.0.0.254"), &host);
        assert_eq!(local.as_deref(), Some("master"));
    }

    #[test]
    fn test_unknown_nodename_means_no_local_node() {
        let host = StaticHostIdentity::named("master");
        assert_eq!(resolve_local_node(&registry(), Some("elsewhere"), &host), None);
    }

    #[test]
    fn test_hostname_matches_address() {
        let host = StaticHostIdentity::named("web1.example.com");
        let local = resolve_local_node(&registry(), None, &host);
        assert_eq!(local.as_deref(), Some("web1"));
    }

    #[test]
    fn test_short_hostname_matches_name() {
        let host = StaticHostIdentity::named("db1.internal.lan");
        let local = resolve_local_node(&registry(), None, &host);
        assert_eq!(local.as_deref(), Some("db1"));
    }

    #[test]
    fn test_no_hostname_no_local_node() {
        let host = StaticHostIdentity::anonymous();
        assert_eq!(resolve_local_node(&registry(), None, &host), None);
    }
}
