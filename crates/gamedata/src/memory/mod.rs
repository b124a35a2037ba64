mod address;
mod image;
mod process;
mod reader;

pub use address::Address;
pub use image::ModuleImage;
pub use process::ProcessMemory;
pub use reader::ReadMemory;
