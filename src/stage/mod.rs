pub mod backend;
pub mod controller;
