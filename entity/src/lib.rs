pub mod prelude;

pub mod settings;
