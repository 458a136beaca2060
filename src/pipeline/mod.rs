pub mod batch;
pub mod builder;
pub mod defaults;
pub mod records;
pub mod runtime;
pub mod traits;
