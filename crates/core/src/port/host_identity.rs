// Host Identity Port
// Names under which the machine running fleet-ping knows itself

/// Source of the local machine's host names
pub trait HostIdentity: Send + Sync {
    /// Candidate names for this host, most specific first
    fn hostnames(&self) -> Vec<String>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Fixed list of host names
    pub struct StaticHostIdentity(pub Vec<String>);

    impl StaticHostIdentity {
        pub fn named(name: impl Into<String>) -> Self {
            Self(vec![name.into()])
        }

        pub fn anonymous() -> Self {
            Self(Vec::new())
        }
    }

    impl HostIdentity for StaticHostIdentity {
        fn hostnames(&self) -> Vec<String> {
            self.0.clone()
        }
    }
}
