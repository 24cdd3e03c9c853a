pub mod aggregator;
pub mod netstat;
pub mod probe;
pub mod registry;
pub mod stats;
pub mod systemd;

pub use aggregator::StatusAggregator;
pub use probe::{ConnectionCounter, ProbeError, Prober, ServiceStateSource, StatsFetcher};
pub use registry::{ProbeKind, ProbeRegistry, ServiceProbe, KNOWN_ROUTES};
