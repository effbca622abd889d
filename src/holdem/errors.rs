use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("not this seat's turn")]
    NotPlayersTurn,
    #[error("seat cannot act")]
    ActorCannotAct,
    #[error("cannot check while facing a bet")]
    CannotCheckFacingBet,
    #[error("cannot bet once the round is opened")]
    CannotBetWhenOpened,
    #[error("cannot raise before any bet")]
    CannotRaiseUnopened,
    #[error("wager below the legal minimum")]
    BelowMinimum,
    #[error("not enough chips")]
    InsufficientChips,
    #[error("action is not legal here")]
    IllegalAction,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("invalid street transition")]
    InvalidTransition,
    #[error("deck exhausted")]
    DeckExhausted,
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub trait InvariantCheck {
    fn validate_invariants(&self) -> Result<(), StateError>;
}
