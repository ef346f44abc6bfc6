pub mod apdu;
pub mod config;
pub mod device;
pub mod hex;
pub mod result;
pub mod terminal;
pub mod track;
pub mod utils;
