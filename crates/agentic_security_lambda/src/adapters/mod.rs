pub mod prompt_store;
