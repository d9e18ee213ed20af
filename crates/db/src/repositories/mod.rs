//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod bandwidth_sub_repo;
pub mod deployment_repo;
pub mod node_down_sub_repo;
pub mod router_repo;
pub mod subscriber_repo;
pub mod tshirt_sub_repo;
pub mod version_sub_repo;

pub use bandwidth_sub_repo::BandwidthSubRepo;
pub use deployment_repo::DeploymentRepo;
pub use node_down_sub_repo::NodeDownSubRepo;
pub use router_repo::RouterRepo;
pub use subscriber_repo::SubscriberRepo;
pub use tshirt_sub_repo::TShirtSubRepo;
pub use version_sub_repo::VersionSubRepo;
