//! SeaORM-backed repositories implementing the synchronizer's collaborator
//! seams against the orchestrator metadata database.

pub mod connection;
pub mod variable;

pub use connection::ConnectionRepository;
pub use variable::VariableRepository;
