//! Asset directory connectors.

mod accelix;

pub use accelix::{AccelixConfig, AccelixDirectory};
