pub mod advertiser;
pub mod device;
#[cfg(test)]
pub(crate) mod mock;
pub mod state;
pub mod traits;
