//! Proxy module
//!
//! Cleans and validates caller-supplied provider coordinates, forwards the
//! request upstream and relays or normalizes what comes back.

pub mod capability;
pub mod headers;
pub mod logging;
pub mod normalize;
pub mod relay;
pub mod request;
pub mod sanitize;
pub mod target;
pub mod upstream;
pub mod validate;

pub use capability::Capability;
pub use normalize::ProxyError;
pub use request::{AudioUpload, ProxyMode, ProxyRequest, RelayKind, UpstreamTimeouts};
pub use target::ProviderTarget;
pub use upstream::{HttpUpstream, Upstream, UpstreamError, UpstreamResponse};
