pub mod panels;
pub mod plot;
pub mod shapes;
pub mod tables;
