pub mod configuration;
pub mod html;
pub mod standalone;
