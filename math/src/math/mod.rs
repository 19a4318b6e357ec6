pub mod external_fees;
pub mod fixedpoint;
pub mod i256;
pub mod logexpmath;
pub mod math;
pub mod weighted_math;
