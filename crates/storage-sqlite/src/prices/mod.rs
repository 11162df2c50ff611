mod model;
mod repository;


pub use model::{NewPriceBarDB, PriceBarDB};
pub use repository::PriceRepository;
