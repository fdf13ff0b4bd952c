//! Broker error codes the orchestration layer gives semantic meaning to,
//! plus shared channel sizing.

/// The broker confirmed an order cancellation via the error channel
pub const ERR_ORDER_CANCELLED: i32 = 202;

/// Cancel rejected: the order id is not on the book
pub const ERR_CANNOT_CANCEL_NOT_FOUND: i32 = 10147;

/// Cancel rejected: the order is in a state that cannot be cancelled
pub const ERR_CANNOT_CANCEL_STATE: i32 = 10148;

/// Place rejected: the contract description matched nothing or several things
pub const ERR_AMBIGUOUS_CONTRACT: i32 = 201;

/// Place rejected: the order type is not supported for this instrument
pub const ERR_UNSUPPORTED_ORDER_TYPE: i32 = 387;

/// True for error codes that terminate a cancel-order request
pub fn is_cancel_rejection(code: i32) -> bool {
    matches!(code, ERR_CANNOT_CANCEL_NOT_FOUND | ERR_CANNOT_CANCEL_STATE)
}

/// True for error codes that terminate a place-order request as a rejection
pub fn is_place_rejection(code: i32) -> bool {
    matches!(code, ERR_AMBIGUOUS_CONTRACT | ERR_UNSUPPORTED_ORDER_TYPE)
}

/// Capacity of the unified event firehose channel
pub const FIREHOSE_CAPACITY: usize = 8_192;

/// Capacity of each per-family event channel
pub const FAMILY_CAPACITY: usize = 2_048;

/// Capacity of the low-frequency connection event channel
pub const CONNECTION_CAPACITY: usize = 64;
