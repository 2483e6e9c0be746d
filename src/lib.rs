use diesel_migrations::{EmbeddedMigrations, embed_migrations};

pub mod admin;
pub mod config;
pub mod registration;
pub mod schema;
pub mod site_config;
pub mod state;
pub mod template;
pub mod util_resp;
pub mod validation;
pub mod widgets;

#[cfg(test)]
mod test;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");
