pub mod error;
pub mod math;

pub use error::ErrorCode;
pub use math::external_fees::ExternalFees;
pub use math::fixedpoint::FixedPoint;
pub use math::i256::I256;
pub use math::logexpmath::LogExpMath;
pub use math::math::Math;
pub use math::weighted_math::WeightedMath;
