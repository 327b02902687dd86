//! Lid-angle relay: one shared sensor process fanned out to any number of
//! server-sent-event clients.

pub mod routes;
pub mod sensor;
pub mod sse;
pub mod stream;

pub use routes::router;
pub use sensor::SensorHub;
pub use stream::LidAngleStream;
