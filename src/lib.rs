pub mod cli_args;
pub mod configuration;
pub mod discovery;
pub mod engine_context;
pub mod fleet;
pub mod pagination;
pub mod reqwest_helpers;
pub mod ship;
pub mod st_client;
pub mod st_model;
pub mod token_store;
pub mod trading;

#[cfg(test)]
pub mod test_objects;
