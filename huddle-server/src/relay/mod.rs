mod relay;
mod subscription;

pub use relay::*;
pub use subscription::*;
