pub mod health;
pub mod keygen;
pub mod run;
pub mod seal_asset;
pub mod version;

pub use health::Health;
pub use keygen::Keygen;
pub use run::Run;
pub use seal_asset::SealAsset;
pub use version::Version;
