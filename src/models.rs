pub mod claims;
pub mod report;
pub mod status;

pub use claims::Claims;
pub use report::{ReportDetail, ServiceReport, ServiceState};
pub use status::{Availability, StatusReport};
