//! Interface adapters for the external layers. Only the CSV op-stream and
//! report formats live here; the chat front end is a separate system.

pub mod csv;
