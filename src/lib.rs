//! itemdb: an in-process, file-loadable emulator of a wide-column item
//! store, compatible with the item-level operation semantics of a
//! DynamoDB-style NoSQL service.
//!
//! Loads a snapshot document into memory, serves `GetItem`/`PutItem`/
//! `DeleteItem`/`Query`/`UpdateItem` against typed, indexed tables, and can
//! write the current state back out as a snapshot. Every other operation in
//! the wider administrative surface returns a uniform "not implemented"
//! error via [`unimplemented_api::UnimplementedApi`].

pub mod attribute;
pub mod config;
pub mod db;
pub mod error;
pub mod keycond;
pub mod schema;
pub mod snapshot;
pub mod table;
pub mod unimplemented_api;
pub mod update_expr;

pub use attribute::{AttributeValue, Item};
pub use config::EngineConfig;
pub use db::{
    DeleteItemInput, DeleteItemOutput, Database, GetItemInput, GetItemOutput, ItemApi,
    PutItemInput, PutItemOutput, QueryInput, QueryOutput, ReturnValue, UpdateItemInput,
    UpdateItemOutput,
};
pub use error::{Error, ErrorKind, Result};
pub use schema::{KeyDef, KeyPartDef, KeyType, Schema};
pub use table::Table;
pub use unimplemented_api::UnimplementedApi;
