mod admission;

pub use admission::{AdmissionMiddlewareFactory, AdmissionMiddlewareService};
