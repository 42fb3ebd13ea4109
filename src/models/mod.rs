pub mod domain;
pub mod dtos;
pub mod forms;
