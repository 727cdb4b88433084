//! Signal catalog, DBC parser, payload codec and the validated signal schema

pub mod codec;
pub mod database;
pub mod dbc;
pub mod schema;

pub use codec::{decode_signal, encode_signal};
pub use database::{
    ByteOrder, DatabaseStats, MessageDefinition, SignalDatabase, SignalDefinition, ValueType,
};
pub use schema::{BusTapId, Signal, SignalBinding, SignalSchema, SignalSnapshot};
