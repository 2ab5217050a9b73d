pub mod endpoints;
pub mod entities;
pub mod info;
pub mod items;
pub mod operators;
pub mod results;
pub mod url;
