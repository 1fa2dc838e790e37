pub mod lifecycle;
pub mod listings;
pub mod locks;
pub mod offers;
pub mod transportation;
