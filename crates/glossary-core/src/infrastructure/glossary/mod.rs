//! SQLite persistence for the glossary entity graph

mod repository;

pub use repository::SqliteGlossaryRepository;
