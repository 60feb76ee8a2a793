//! Data access: document stores, tables, the schema declaration and splitting.

pub mod schema;
pub mod split;
pub mod store;
pub mod table;

pub use schema::{ColumnDecl, SchemaDeclaration};
pub use split::{rng_from_seed, train_test_split};
pub use store::{
    Document, DocumentStore, InMemoryDocumentStore, JsonlDocumentStore, SqliteDocumentStore,
    documents_to_table, open_store,
};
pub use table::DataTable;
