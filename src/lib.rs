//! Two-channel arbitrary waveform generator
//!
//! - `generator`: pure table synthesis, one period per hardware buffer
//! - `channel`: per-channel parameter store
//! - `burst`: burst, trigger and generation mode coordination
//! - `handler`: the `Generator` front end tying them to a `SignalDevice`
//! - `device`: the hardware boundary and an in-memory simulator

pub mod burst;
pub mod channel;
pub mod config;
pub mod device;
pub mod error;
pub mod generator;
pub mod handler;
pub mod logging;

pub use burst::{BurstLimit, GenMode, TriggerSource, TriggerTarget};
pub use channel::{Channel, Waveform};
pub use config::{ChannelDefaults, GeneratorConfig, Limits, BUFFER_LENGTH};
pub use device::{DeviceError, SignalDevice, SimulatedDevice};
pub use error::{GenError, GenResult};
pub use handler::Generator;
