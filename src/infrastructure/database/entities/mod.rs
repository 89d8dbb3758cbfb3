//! Database entities module

pub mod ficha_semanal;

pub use ficha_semanal::Entity as FichaSemanal;
