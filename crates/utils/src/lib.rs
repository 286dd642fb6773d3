pub mod jwt;
pub mod positioning;
pub mod response;
pub mod wire;
