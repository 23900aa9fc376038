pub mod arena;
pub mod connection;
pub mod graph;
pub mod graph_analysis;
pub mod graph_node;
pub mod project;
pub mod property;

pub use self::arena::{LinkId, NodeId, PortId};
pub use self::connection::{Link, LinkEnds, LinkOutcome, Port, PortDirection};
pub use self::graph::{GraphStore, RemovedNode, INPUT_ALIAS, OUTPUT_ALIAS};
pub use self::graph_analysis::{ActivePath, resolve_path};
pub use self::graph_node::{Node, NodeData, NodeSnapshot, Position};
pub use self::project::{LinkRecord, NodeRecord, ProjectRecord, RestoreReport};
pub use self::property::{SettingValue, Settings};
