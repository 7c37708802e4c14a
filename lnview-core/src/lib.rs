#![crate_name = "lnview_core"]
#![forbid(unsafe_code)]

//! Keeps a live, navigable view of a remote Lightning node.
//!
//! A [`DataSource`] answers snapshot calls and pushes subscription updates.
//! [`Models`] holds the collections mirroring the node, [`PubSub`] keeps
//! them fed and turns changes into [`Event`]s, and [`nav`] moves a cursor
//! over any table built from them.

pub mod events;
pub mod model;
pub mod nav;
pub mod pubsub;
pub mod sort;
pub mod source;
pub mod state;

pub use self::events::Event;
pub use self::pubsub::{PubSub, PubSubConfig};
pub use self::source::DataSource;
pub use self::state::{Models, ModelsConfig};
