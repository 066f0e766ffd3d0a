pub mod category;
pub mod request;
pub mod response;
pub mod validation;

pub use category::*;
pub use request::*;
pub use response::*;
pub use validation::*;
