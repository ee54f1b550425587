#![warn(missing_docs)]
/*! Host-side gateway to traffic-signal field controllers.

This crate implements the end-to-end protocol pipeline for a family of
field controllers that speak a proprietary byte-oriented request/reply
protocol over UDP: frame delimiting and byte-destuffing of a stream of
datagrams, checksum-validated decoding of the wire's two frame shapes, a
data-driven message decoder and encoder built against a declarative
command catalogue, sequence-number lifecycle tracking for outstanding
commands, and an interactive multi-step command builder.

# Module map

- [`frame`] — byte stuffing, checksum, and the two wire frame shapes.
- [`framer`] — extracts complete frames from a growing datagram buffer.
- [`catalogue`] — the command catalogue: field schemas, validators, prompts.
- [`record`] — semantically-typed decoded field values.
- [`parser`] — catalogue-driven payload decoding.
- [`builder`] — catalogue-driven payload encoding and user-input parsing.
- [`render`] — human-readable log rendering of decoded records.
- [`correlation`] — sequence allocation and outstanding-command tracking.
- [`config`] — the device-id to endpoint table.
- [`center`] — the orchestration point tying the above together.
- [`session`] — the interactive command driver's session record.
- [`driver`] — the interactive command driver's state machine.
- [`log_setup`] — file logging setup.
- [`error`] — the crate-wide error taxonomy.
*/
pub mod builder;
pub mod catalogue;
pub mod center;
pub mod config;
pub mod correlation;
pub mod driver;
pub mod error;
pub mod frame;
pub mod framer;
pub mod log_setup;
pub mod parser;
pub mod record;
pub mod render;
pub mod session;

pub use error::{Error, Result};
