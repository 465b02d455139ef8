//! Cursor beacon: a short-lived, fading highlight drawn where the cursor lands
//! after a large jump, so the eye can find it again.
//!
//! The crate is host-agnostic. An editor integration implements [`Host`] and
//! forwards its events into a [`BeaconSession`]:
//!
//! - [`jump`] decides which cursor moves are jumps
//! - [`renderer`] draws and fades the beacons and guarantees their cleanup
//! - [`session`] ties both to the configuration and exposes the user commands
//! - [`sim`] is an in-memory host used by tests and the `beacon` CLI

pub mod config;
pub mod host;
pub mod jump;
mod position;
pub mod renderer;
pub mod session;
pub mod sim;


pub use config::BeaconConfig;
pub use host::{Host, HostError, JumpDirection, MouseButton, MouseEvent};
pub use jump::{JumpClassifier, Movement};
pub use position::CursorPosition;
pub use renderer::{BeaconId, BeaconRenderer, Teardown};
pub use session::BeaconSession;
