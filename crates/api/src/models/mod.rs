pub mod deploy;
pub mod device;
pub mod installation;

pub use deploy::*;
pub use device::*;
pub use installation::*;
