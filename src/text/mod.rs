pub mod layout;
pub mod morph;
pub mod scramble;
pub mod typed;
