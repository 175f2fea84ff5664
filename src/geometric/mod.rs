pub mod green_view;

pub use green_view::{GreenViewLayer, GreenViewPoint};
