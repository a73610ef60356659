pub mod maintenance;
pub mod startup;
pub mod state;
