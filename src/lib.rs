// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the three subcommands.
//
// Module responsibilities:
// - `config`: Settings read from `POCKETDUMP_*` environment variables.
// - `token_store`: Persistence of the access token under the user's
//   configuration directory.
// - `api`: Encapsulates HTTP interactions with the Pocket v3 API
//   (authorization handshake, item queries).
// - `archive`: Filename sanitization, external rendering and the
//   write-to-disk policy for articles.
// - `cli`: Subcommand parsing, authentication drive and dispatch.

pub mod api;
pub mod archive;
pub mod cli;
pub mod config;
pub mod token_store;
