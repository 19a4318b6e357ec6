use anchor_lang::prelude::*;

#[error_code]
pub enum ErrorCode {
    #[msg("Arithmetic overflow")]
    Overflow,
    #[msg("Arithmetic underflow")]
    Underflow,
    #[msg("Division by zero")]
    DivByZero,
    #[msg("Argument outside the function domain")]
    DomainError,
    #[msg("Invariant must be positive")]
    ZeroInvariant,
    #[msg("Amount in exceeds the allowed fraction of the balance")]
    MaxInRatio,
    #[msg("Amount out exceeds the allowed fraction of the balance")]
    MaxOutRatio,
    #[msg("Join would grow the invariant beyond the allowed ratio")]
    MaxInvariantRatio,
    #[msg("Exit would shrink the invariant below the allowed ratio")]
    MinInvariantRatio,
    #[msg("Weight below the minimum or weights do not sum to one")]
    WeightOutOfRange,
    #[msg("Unexpected number of tokens")]
    InvalidTokenCount,
}
