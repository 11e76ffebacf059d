pub mod catalog;
pub mod changelog;
pub mod entities;
pub mod forms;
pub mod merge;
pub mod photos;
pub mod roster;
