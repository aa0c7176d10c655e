#![doc = include_str!("../README.md")]

#[cfg(feature = "mimalloc")]
use mimalloc::MiMalloc;
#[cfg_attr(feature = "mimalloc", global_allocator)]
#[cfg(feature = "mimalloc")]
static GLOBAL: MiMalloc = MiMalloc;

pub mod candidate;
pub mod config;
pub mod error;
pub mod generate;
pub mod geo;
pub mod network;
pub mod oracle;
pub mod pattern;
pub mod split;
pub mod trail;
pub mod workspace;

#[doc(inline)]
pub use candidate::RouteCandidate;
#[doc(inline)]
pub use config::EngineConfig;
#[doc(inline)]
pub use error::Error;
#[doc(inline)]
pub use network::Network;
#[doc(inline)]
pub use oracle::{GraphOracle, NetworkOracle};
#[doc(inline)]
pub use pattern::{RoutePattern, RouteShape};
#[doc(inline)]
pub use trail::Trail;
#[doc(inline)]
pub use workspace::Workspace;

pub type Result<T> = std::result::Result<T, Error>;
